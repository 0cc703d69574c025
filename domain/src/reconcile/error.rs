use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("no role named {tier} exists for the {tier} rank")]
    MissingRole { tier: String },
}
