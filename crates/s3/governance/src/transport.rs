//! Ballot transport: how a proposing agent asks its peers for a vote.
//!
//! Voters answer from their own policy and never route through another
//! agent's proposal queue, so a robot collecting votes can never wait on a
//! peer that is itself waiting on it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use s3_types::{ConsentLevel, DriverId, DriverType, RobotId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GovernanceError, GovernanceResult};
use crate::round::RoundId;

/// A voter's answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    Approve,
    Deny,
}

/// What a voter is asked to consent to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotRequest {
    pub round_id: RoundId,
    pub proposer: RobotId,
    pub driver_id: DriverId,
    pub driver_type: DriverType,
    pub urgency: i32,
    pub consent_level: ConsentLevel,
    pub proposed_action: String,
}

/// Trait for delivering ballot requests to voters.
#[async_trait]
pub trait ConsentTransport: Send + Sync {
    /// Ask `voter` for its vote. May never resolve; callers bound it with a
    /// deadline.
    async fn request_ballot(
        &self,
        voter: &RobotId,
        request: &BallotRequest,
    ) -> GovernanceResult<Vote>;
}

/// How a simulated robot answers ballot requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VotePolicy {
    #[default]
    Approve,
    Deny,
    /// Never answers; the ballot times out.
    Silent,
    /// The ballot cannot be delivered.
    Unreachable,
}

/// In-process ballot transport where each robot answers from its
/// configured [`VotePolicy`].
#[derive(Clone, Debug, Default)]
pub struct LocalConsentNetwork {
    default_policy: VotePolicy,
    policies: BTreeMap<RobotId, VotePolicy>,
}

impl LocalConsentNetwork {
    pub fn new(default_policy: VotePolicy) -> Self {
        Self {
            default_policy,
            policies: BTreeMap::new(),
        }
    }

    pub fn with_policies(mut self, policies: BTreeMap<RobotId, VotePolicy>) -> Self {
        self.policies.extend(policies);
        self
    }

    pub fn with_policy(mut self, robot: impl Into<RobotId>, policy: VotePolicy) -> Self {
        self.policies.insert(robot.into(), policy);
        self
    }

    pub fn policy_for(&self, robot: &RobotId) -> VotePolicy {
        self.policies
            .get(robot)
            .copied()
            .unwrap_or(self.default_policy)
    }
}

#[async_trait]
impl ConsentTransport for LocalConsentNetwork {
    async fn request_ballot(
        &self,
        voter: &RobotId,
        request: &BallotRequest,
    ) -> GovernanceResult<Vote> {
        let policy = self.policy_for(voter);
        debug!(
            voter = %voter,
            proposer = %request.proposer,
            driver_id = %request.driver_id,
            policy = ?policy,
            "Ballot requested"
        );

        match policy {
            VotePolicy::Approve => Ok(Vote::Approve),
            VotePolicy::Deny => Ok(Vote::Deny),
            VotePolicy::Silent => std::future::pending().await,
            VotePolicy::Unreachable => Err(GovernanceError::Transport {
                voter: voter.clone(),
                reason: "voter unreachable".into(),
            }),
        }
    }
}
