mod http;
mod in_flight;
mod state;

pub use http::{ApiError, ReportMatchRequest, build_router, index, report_match};
pub use in_flight::InFlight;
pub use state::AppState;
