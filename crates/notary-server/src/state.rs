use notary_dispatch::Dispatcher;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub contract_name: String,
    pub transport: &'static str,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, contract_name: impl Into<String>, transport: &'static str) -> Self {
        Self {
            dispatcher,
            contract_name: contract_name.into(),
            transport,
        }
    }
}
