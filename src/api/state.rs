//! API shared state containing actor handles

use std::sync::Arc;

use crate::{actors::historian::HistorianHandle, config::Config, context::Context};

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Handle to the historian for tallies and report lines
    pub historian: HistorianHandle,

    pub config: Arc<Config>,

    pub context: Arc<Context>,
}

impl ApiState {
    pub fn new(historian: HistorianHandle, config: Arc<Config>, context: Arc<Context>) -> Self {
        Self {
            historian,
            config,
            context,
        }
    }
}
