//! Governance error types.

use s3_ledger::LedgerError;
use s3_types::RobotId;
use thiserror::Error;

/// Errors that can occur during governance operations.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// Reserved for guarded classification branches; the fixed decision
    /// table is total and never produces it.
    #[error("classification failed: {0}")]
    Classification(String),

    /// Appending to the transparency log failed. The proposal is aborted
    /// because its audit trail would be incomplete.
    #[error("audit log append failed: {0}")]
    Ledger(#[from] LedgerError),

    /// A ballot could not be delivered to or answered by a voter.
    #[error("ballot transport failed for {voter}: {reason}")]
    Transport { voter: RobotId, reason: String },

    /// A consent resolution exceeded its deadline.
    #[error("consent timed out after {0}ms")]
    ConsentTimeout(u64),

    /// The agent's actor task is no longer running.
    #[error("governance agent {0} is not running")]
    AgentStopped(RobotId),
}

/// Result type alias for governance operations
pub type GovernanceResult<T> = Result<T, GovernanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_error_display() {
        let err = GovernanceError::ConsentTimeout(2000);
        assert_eq!(err.to_string(), "consent timed out after 2000ms");
    }

    #[test]
    fn transport_error_display() {
        let err = GovernanceError::Transport {
            voter: RobotId::new("robot_4"),
            reason: "unreachable".into(),
        };
        assert!(err.to_string().contains("robot_4"));
        assert!(err.to_string().contains("unreachable"));
    }

    #[test]
    fn ledger_errors_convert() {
        let err: GovernanceError = LedgerError::Serialization("bad".into()).into();
        assert!(matches!(err, GovernanceError::Ledger(_)));
    }
}
