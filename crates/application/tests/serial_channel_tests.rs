use application::{RetryPolicy, SerialChannel};
use domain::{BridgeError, ChannelState};
use infrastructure::drivers::{MockReaderLink, MockReply};
use std::sync::atomic::Ordering;
use tokio::time::{Duration, Instant};

const READER_OK: &str = r#"{"r":"1","e":"","s":"1","p":"11240000237988","c1":"AB","c2":"AB"}"#;

async fn open_channel() -> (SerialChannel, MockReaderLink) {
    let link = MockReaderLink::new();
    let channel = SerialChannel::new(Box::new(link.clone()), RetryPolicy::default());
    channel.open().await.expect("mock link opens");
    (channel, link)
}

#[tokio::test(start_paused = true)]
async fn test_exchange_returns_first_frame() {
    let (channel, link) = open_channel().await;
    link.push_line(READER_OK).await;

    let mut session = channel.session().await;
    session.send(b"1").await.unwrap();
    let line = session.receive_line().await.unwrap();

    assert_eq!(line, format!("{}\n", READER_OK).into_bytes());
    assert_eq!(link.sent().await, vec![b"1".to_vec()]);
    assert_eq!(link.reads(), 1);
    assert_eq!(link.closes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_send_discards_stale_input() {
    let (channel, link) = open_channel().await;
    link.push_stale_line(r#"{"r":"1","e":"","s":"0","p":"OLD","c1":"","c2":""}"#)
        .await;
    link.push_line(READER_OK).await;

    let mut session = channel.session().await;
    session.send(b"1").await.unwrap();
    let line = session.receive_line().await.unwrap();

    assert!(String::from_utf8(line).unwrap().contains("11240000237988"));
}

#[tokio::test(start_paused = true)]
async fn test_silent_reads_are_retried() {
    let (channel, link) = open_channel().await;
    link.push_reply(MockReply::Silence).await;
    link.push_reply(MockReply::Line(b"  \r\n".to_vec())).await;
    link.push_line(READER_OK).await;

    let start = Instant::now();
    let mut session = channel.session().await;
    session.send(b"2").await.unwrap();
    let line = session.receive_line().await.unwrap();

    assert!(!line.is_empty());
    assert_eq!(link.reads(), 3);
    assert_eq!(link.closes(), 0);
    // initial delay + two retry delays
    assert!(start.elapsed() >= Duration::from_millis(1500));
    assert!(start.elapsed() < Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_reconnects_and_reports_reader_timeout() {
    let (channel, link) = open_channel().await;

    let start = Instant::now();
    let mut session = channel.session().await;
    session.send(b"1").await.unwrap();
    let result = session.receive_line().await;

    assert_eq!(result, Err(BridgeError::ReaderTimeout));
    assert_eq!(link.reads(), 3);
    assert_eq!(link.closes(), 1);
    assert_eq!(link.opens(), 2);
    assert_eq!(session.state(), ChannelState::Open);
    // initial delay + 2 x retry delay + reconnect cooldown
    assert!(start.elapsed() >= Duration::from_millis(3500));
}

#[tokio::test(start_paused = true)]
async fn test_custom_retry_budget() {
    let link = MockReaderLink::new();
    let policy = RetryPolicy {
        max_retries: 0,
        retry_delay: Duration::from_millis(100),
        initial_delay: Duration::from_millis(10),
        reconnect_cooldown: Duration::from_millis(50),
    };
    let channel = SerialChannel::new(Box::new(link.clone()), policy);
    channel.open().await.unwrap();

    let mut session = channel.session().await;
    session.send(b"1").await.unwrap();
    assert_eq!(session.receive_line().await, Err(BridgeError::ReaderTimeout));
    assert_eq!(link.reads(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_read_error_triggers_reconnect() {
    let (channel, link) = open_channel().await;
    link.push_reply(MockReply::ReadError("device disconnected".to_string()))
        .await;

    let mut session = channel.session().await;
    session.send(b"1").await.unwrap();
    let result = session.receive_line().await;

    assert!(matches!(result, Err(BridgeError::Transport(_))));
    assert_eq!(link.closes(), 1);
    assert_eq!(link.opens(), 2);
    assert_eq!(session.state(), ChannelState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_failed_reopen_is_retried_on_next_send() {
    let (channel, link) = open_channel().await;
    link.fail_open.store(true, Ordering::SeqCst);

    {
        let mut session = channel.session().await;
        session.send(b"1").await.unwrap();
        assert_eq!(session.receive_line().await, Err(BridgeError::ReaderTimeout));
        assert_eq!(session.state(), ChannelState::Failed);
    }

    // Still unplugged: the send itself fails
    {
        let mut session = channel.session().await;
        assert!(matches!(
            session.send(b"1").await,
            Err(BridgeError::Transport(_))
        ));
    }

    link.fail_open.store(false, Ordering::SeqCst);
    link.push_line(READER_OK).await;

    let mut session = channel.session().await;
    session.send(b"1").await.unwrap();
    assert!(session.receive_line().await.is_ok());
    assert_eq!(session.state(), ChannelState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_session_is_exclusive() {
    let (channel, _link) = open_channel().await;

    let first = channel.session().await;
    let second = tokio::time::timeout(Duration::from_millis(100), channel.session()).await;
    assert!(second.is_err(), "second session must wait for the first");

    drop(first);
    let second = tokio::time::timeout(Duration::from_millis(100), channel.session()).await;
    assert!(second.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_close_and_state() {
    let link = MockReaderLink::new();
    let channel = SerialChannel::new(Box::new(link.clone()), RetryPolicy::default());
    assert_eq!(channel.state().await, ChannelState::Closed);

    channel.open().await.unwrap();
    assert_eq!(channel.state().await, ChannelState::Open);

    channel.close().await.unwrap();
    assert_eq!(channel.state().await, ChannelState::Closed);
    assert_eq!(link.closes(), 1);
}
