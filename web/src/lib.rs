use service::config::Config;
use ::sse::Broker;
use std::sync::Arc;

pub mod controller;
pub mod error;
pub mod router;
pub mod sse;

// Web-level state shared with every handler.
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub broker: Arc<Broker>,
}

impl AppState {
    pub fn new(app_config: Config, broker: &Arc<Broker>) -> Self {
        Self {
            config: app_config,
            broker: Arc::clone(broker),
        }
    }
}
