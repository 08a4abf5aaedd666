use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderName, HeaderValue, header},
    routing::{get, post},
};
use domain::Operation;
use infrastructure::XmlTranslator;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Headers the library platform expects on every response, preflight included
const FIXED_HEADERS: [(HeaderName, &str); 4] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, GET, OPTIONS"),
    (
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        "X-Requested-With, Content-Type",
    ),
    (header::CONTENT_TYPE, "application/xml"),
];

pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/getItems", get(get_items).fallback(empty_response))
        .route("/itemUpdate", post(item_update).fallback(empty_response))
        .route("/setSecurity", post(set_security).fallback(empty_response))
        .route("/getSecurity", get(get_security).fallback(empty_response));

    for (name, value) in FIXED_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            name,
            HeaderValue::from_static(value),
        ));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn get_items(State(state): State<Arc<AppState>>) -> String {
    respond(&state, Operation::GetItems, &[]).await
}

async fn get_security(State(state): State<Arc<AppState>>) -> String {
    respond(&state, Operation::GetSecurity, &[]).await
}

async fn item_update(State(state): State<Arc<AppState>>, body: Bytes) -> String {
    respond(&state, Operation::ItemUpdate, &body).await
}

async fn set_security(State(state): State<Arc<AppState>>, body: Bytes) -> String {
    respond(&state, Operation::SetSecurity, &body).await
}

// OPTIONS preflight and any other method on a known path
async fn empty_response() {}

async fn respond(state: &AppState, operation: Operation, body: &[u8]) -> String {
    let result = state.service.dispatch(operation, body).await;
    XmlTranslator::render(&result)
}
