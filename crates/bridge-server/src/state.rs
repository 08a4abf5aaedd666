use application::BridgeService;

pub struct AppState {
    pub service: BridgeService,
}

impl AppState {
    pub fn new(service: BridgeService) -> Self {
        Self { service }
    }
}
