//! Coordinator error types.

use s3_governance::GovernanceError;
use s3_types::RobotId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// A robot in the impact scope has no agent (strict membership only)
    #[error("no governance agent for robot {0}")]
    UnknownAgent(RobotId),

    /// An agent returned from a proposal without appending any log entry
    #[error("proposal to {0} produced no log entry")]
    EmptyLog(RobotId),

    /// An agent actor has stopped
    #[error("governance agent {0} is unavailable")]
    AgentUnavailable(RobotId),

    #[error("governance failure: {0}")]
    Governance(GovernanceError),
}

impl From<GovernanceError> for CoordinatorError {
    fn from(err: GovernanceError) -> Self {
        match err {
            GovernanceError::AgentStopped(robot_id) => CoordinatorError::AgentUnavailable(robot_id),
            other => CoordinatorError::Governance(other),
        }
    }
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
