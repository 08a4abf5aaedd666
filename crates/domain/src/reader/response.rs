/// One decoded answer from the reader.
///
/// `crc_recorded` / `crc_calculated` are diagnostic passthrough values; the
/// bridge never acts on them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReaderResponse {
    pub ok: bool,
    pub error_message: String,
    pub security_on: bool,
    pub payload: String,
    pub crc_recorded: String,
    pub crc_calculated: String,
}

impl ReaderResponse {
    pub fn crc_matches(&self) -> bool {
        self.crc_recorded == self.crc_calculated
    }
}
