//! Quorum rules: how many voters must agree before consent is granted.

use serde::{Deserialize, Serialize};

/// Agreement rule applied to the ballots of a consent round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuorumRule {
    /// Every eligible voter approves
    Unanimous,
    /// Strictly more than half of the eligible voters approve
    #[default]
    Majority,
    /// At least one approval and no explicit denial
    Veto,
    /// At least this many approvals
    AtLeast(u32),
}

impl QuorumRule {
    /// Whether `tally` satisfies this rule.
    ///
    /// An empty electorate never satisfies any rule, and no rule is met
    /// without at least one approval.
    pub fn is_met(&self, tally: &Tally) -> bool {
        if tally.eligible == 0 {
            return false;
        }
        match self {
            QuorumRule::Unanimous => tally.approvals == tally.eligible,
            QuorumRule::Majority => tally.approvals * 2 > tally.eligible,
            QuorumRule::Veto => tally.approvals > 0 && tally.denials == 0,
            QuorumRule::AtLeast(count) => tally.approvals >= (*count).max(1) as usize,
        }
    }

    /// Whether the rule would be met if every missing voter had approved.
    pub fn could_be_met(&self, tally: &Tally) -> bool {
        let optimistic = Tally {
            approvals: tally.approvals + tally.missing,
            missing: 0,
            ..*tally
        };
        self.is_met(&optimistic)
    }
}

impl std::fmt::Display for QuorumRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuorumRule::Unanimous => write!(f, "unanimous"),
            QuorumRule::Majority => write!(f, "majority"),
            QuorumRule::Veto => write!(f, "veto"),
            QuorumRule::AtLeast(count) => write!(f, "at_least({count})"),
        }
    }
}

/// Vote counts of a consent round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub eligible: usize,
    pub approvals: usize,
    pub denials: usize,
    /// Voters that did not answer (timed out or unreachable)
    pub missing: usize,
}

impl Tally {
    pub fn new(eligible: usize) -> Self {
        Self {
            eligible,
            ..Self::default()
        }
    }
}
