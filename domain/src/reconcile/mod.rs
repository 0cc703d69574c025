mod error;
mod plan;

#[cfg(test)]
mod tests;

pub use error::ReconcileError;
pub use plan::{RoleReconciliation, plan};
