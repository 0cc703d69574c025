use std::sync::Arc;

use application::ports::in_::{CommandService, MatchReportProcessor};

use super::in_flight::InFlight;

/// Services shared by the HTTP ingress and the command dispatcher.
pub struct AppState {
    pub processor: Arc<MatchReportProcessor>,
    pub commands: Arc<CommandService>,
    /// Match reports still being processed, including abandoned ones.
    pub in_flight: InFlight,
}

impl AppState {
    pub fn new(
        processor: Arc<MatchReportProcessor>,
        commands: Arc<CommandService>,
    ) -> Self {
        Self {
            processor,
            commands,
            in_flight: InFlight::new(),
        }
    }
}
