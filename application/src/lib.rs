mod error;
pub mod ports;

pub use error::ServiceError;
