/// Errors raised when stored or configured text does not map onto the
/// closed domain types.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("unknown {kind} status: {value:?}")]
    UnknownStatus { kind: &'static str, value: String },
    #[error("unknown department: {0:?}")]
    UnknownDepartment(String),
    #[error("invalid value for {key}: {reason}")]
    InvalidConfig { key: &'static str, reason: String },
}
