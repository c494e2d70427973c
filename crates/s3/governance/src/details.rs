//! Structured `details` payloads written to the transparency log.

use s3_types::{ConsentLevel, Driver, DriverId, DriverType, RobotId};
use serde::{Deserialize, Serialize};

use crate::quorum::{QuorumRule, Tally};
use crate::round::{Ballot, ConsentRound, RoundId, RoundState};

/// `driver_proposed`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverProposed {
    pub driver_id: DriverId,
    pub driver_type: DriverType,
    pub urgency: i32,
    pub impact_scope: Vec<RobotId>,
    pub proposed_action: String,
    pub rationale: String,
    pub alternatives: Vec<String>,
}

impl From<&Driver> for DriverProposed {
    fn from(driver: &Driver) -> Self {
        Self {
            driver_id: driver.id().clone(),
            driver_type: driver.driver_type(),
            urgency: driver.urgency(),
            impact_scope: driver.impact_scope().to_vec(),
            proposed_action: driver.proposed_action().to_string(),
            rationale: driver.rationale().to_string(),
            alternatives: driver.alternatives().to_vec(),
        }
    }
}

/// `automatic_execution`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomaticExecution {
    pub driver_id: DriverId,
    pub consent_level: ConsentLevel,
    pub proposed_action: String,
}

/// `active_consent_initiated` / `full_consent_initiated`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentInitiated {
    pub driver_id: DriverId,
    pub round_id: RoundId,
    pub consent_level: ConsentLevel,
    pub quorum: QuorumRule,
    pub voters: Vec<RobotId>,
    pub timeout_ms: u64,
}

/// `consent_resolved`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentResolved {
    pub driver_id: DriverId,
    pub round_id: RoundId,
    pub state: RoundState,
    pub tally: Tally,
    pub ballots: Vec<Ballot>,
}

impl ConsentResolved {
    pub fn from_round(driver_id: &DriverId, round: &ConsentRound) -> Self {
        Self {
            driver_id: driver_id.clone(),
            round_id: round.id().clone(),
            state: round.state(),
            tally: round.tally(),
            ballots: round.ballots().to_vec(),
        }
    }
}

/// `consent_cancelled`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentCancelled {
    pub driver_id: DriverId,
    pub round_id: RoundId,
    pub pending_voters: Vec<RobotId>,
}
