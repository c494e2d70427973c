//! Governance configuration

use std::collections::BTreeMap;
use std::time::Duration;

use s3_types::{ConsentLevel, RobotId};
use serde::{Deserialize, Serialize};

use crate::quorum::QuorumRule;
use crate::transport::{LocalConsentNetwork, VotePolicy};

/// Consent procedure configuration shared by every agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Quorum rule for bounded (ACTIVE) consent
    #[serde(default)]
    pub active_quorum: QuorumRule,

    /// Quorum rule for network-wide (FULL) consent
    #[serde(default)]
    pub full_quorum: QuorumRule,

    /// Per-ballot deadline for ACTIVE rounds in milliseconds
    #[serde(default = "default_active_timeout")]
    pub active_timeout_ms: u64,

    /// Per-ballot deadline for FULL rounds in milliseconds
    #[serde(default = "default_full_timeout")]
    pub full_timeout_ms: u64,

    /// How robots without an explicit policy answer ballots
    #[serde(default)]
    pub default_vote: VotePolicy,

    /// Per-robot ballot policies
    #[serde(default)]
    pub votes: BTreeMap<RobotId, VotePolicy>,

    /// Queued proposals per agent before callers wait
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            active_quorum: QuorumRule::Majority,
            full_quorum: QuorumRule::Majority,
            active_timeout_ms: default_active_timeout(),
            full_timeout_ms: default_full_timeout(),
            default_vote: VotePolicy::Approve,
            votes: BTreeMap::new(),
            mailbox_capacity: default_mailbox_capacity(),
        }
    }
}

impl GovernanceConfig {
    /// Quorum rule and ballot deadline for a consent level that votes.
    ///
    /// Returns `None` for `AUTOMATIC`.
    pub fn round_parameters(&self, level: ConsentLevel) -> Option<(QuorumRule, Duration)> {
        match level {
            ConsentLevel::Automatic => None,
            ConsentLevel::Active => Some((
                self.active_quorum,
                Duration::from_millis(self.active_timeout_ms),
            )),
            ConsentLevel::Full => Some((
                self.full_quorum,
                Duration::from_millis(self.full_timeout_ms),
            )),
        }
    }

    /// Build the in-process ballot network described by this configuration
    pub fn local_network(&self) -> LocalConsentNetwork {
        LocalConsentNetwork::new(self.default_vote).with_policies(self.votes.clone())
    }
}

fn default_active_timeout() -> u64 {
    500
}

fn default_full_timeout() -> u64 {
    2000
}

fn default_mailbox_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GovernanceConfig::default();
        assert_eq!(config.active_quorum, QuorumRule::Majority);
        assert_eq!(config.full_timeout_ms, 2000);
        assert_eq!(config.default_vote, VotePolicy::Approve);
        assert!(config.votes.is_empty());
    }

    #[test]
    fn test_round_parameters() {
        let config = GovernanceConfig {
            full_quorum: QuorumRule::Unanimous,
            ..Default::default()
        };
        assert!(config.round_parameters(ConsentLevel::Automatic).is_none());
        assert_eq!(
            config.round_parameters(ConsentLevel::Active),
            Some((QuorumRule::Majority, Duration::from_millis(500)))
        );
        assert_eq!(
            config.round_parameters(ConsentLevel::Full),
            Some((QuorumRule::Unanimous, Duration::from_millis(2000)))
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: GovernanceConfig = serde_json::from_value(serde_json::json!({
            "full_quorum": "veto",
            "votes": {"robot_3": "deny"}
        }))
        .unwrap();
        assert_eq!(config.full_quorum, QuorumRule::Veto);
        assert_eq!(config.active_timeout_ms, 500);
        assert_eq!(
            config.local_network().policy_for(&RobotId::new("robot_3")),
            VotePolicy::Deny
        );
        assert_eq!(
            config.local_network().policy_for(&RobotId::new("robot_1")),
            VotePolicy::Approve
        );
    }
}
