/// Errors returned by the rule-mutating operations of the alert engine.
///
/// Evaluation itself never fails; these only surface from rule
/// registration, updates and cooldown resets.
///
/// # Examples
///
/// ```rust
/// use carepulse_alert::error::AlertError;
///
/// let err = AlertError::DuplicateRule("r1".to_string());
/// assert!(err.to_string().contains("r1"));
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlertError {
    /// A rule with the same id is already registered. Callers usually treat
    /// this as a benign conflict.
    #[error("Alert: rule '{0}' already exists")]
    DuplicateRule(String),

    /// No rule with the given id is registered.
    #[error("Alert: rule '{0}' not found")]
    NotFound(String),

    /// The rule definition violates an invariant (e.g. a non-finite threshold).
    #[error("Alert: invalid rule '{id}': {reason}")]
    InvalidRule { id: String, reason: String },
}

/// Convenience `Result` alias for alert engine operations.
pub type Result<T> = std::result::Result<T, AlertError>;
