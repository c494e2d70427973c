//! Scenario coordination results and evaluator records.

use s3_governance::{ProposalDecision, RoundState};
use s3_ledger::LogEntry;
use s3_types::{ConsentLevel, Driver, RobotId, ScenarioDescriptor};
use serde::{Deserialize, Serialize};

/// Overall outcome of a coordinated scenario
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinationOutcome {
    /// Every contacted agent obtained consent
    Granted,
    /// At least one contacted agent did not
    Denied,
    /// No robot in the impact scope has an agent; nothing was consented to
    NoImpactedAgents,
    /// The caller cancelled before every agent finished
    Cancelled,
}

/// What one agent decided for the scenario
#[derive(Clone, Debug)]
pub struct AgentOutcome {
    pub robot_id: RobotId,
    pub consent_level: ConsentLevel,
    pub approved: bool,
    pub decision: ProposalDecision,
    /// The last log entry this proposal appended
    pub latest_entry: LogEntry,
}

impl AgentOutcome {
    pub(crate) fn was_cancelled(&self) -> bool {
        matches!(
            &self.decision,
            ProposalDecision::Voted(summary) if summary.state == RoundState::Cancelled
        )
    }
}

/// Result of [`Coordinator::coordinate_scenario`](crate::Coordinator::coordinate_scenario).
#[derive(Clone, Debug)]
pub struct CoordinationResult {
    pub scenario_id: String,
    pub description: String,
    /// The driver as classified
    pub driver: Driver,
    pub outcome: CoordinationOutcome,
    /// Per-agent results in impact-scope order
    pub agents: Vec<AgentOutcome>,
    /// Scope entries that were not contacted (unknown, or skipped after
    /// cancellation)
    pub skipped: Vec<RobotId>,
}

impl CoordinationResult {
    pub fn consent_achieved(&self) -> bool {
        self.outcome == CoordinationOutcome::Granted
    }

    /// Latest log entry of each contacted agent, in contact order
    pub fn log_entries(&self) -> Vec<&LogEntry> {
        self.agents.iter().map(|a| &a.latest_entry).collect()
    }

    pub fn into_record(self) -> ScenarioRecord {
        let consent_achieved = self.consent_achieved();
        ScenarioRecord {
            scenario_id: self.scenario_id,
            description: self.description,
            consent_achieved,
            logs: self.agents.into_iter().map(|a| a.latest_entry).collect(),
        }
    }
}

pub(crate) fn aggregate(agents: &[AgentOutcome], cancelled: bool) -> CoordinationOutcome {
    if cancelled || agents.iter().any(AgentOutcome::was_cancelled) {
        CoordinationOutcome::Cancelled
    } else if agents.is_empty() {
        CoordinationOutcome::NoImpactedAgents
    } else if agents.iter().all(|a| a.approved) {
        CoordinationOutcome::Granted
    } else {
        CoordinationOutcome::Denied
    }
}

/// Per-scenario record handed to the evaluator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub scenario_id: String,
    pub description: String,
    pub consent_achieved: bool,
    pub logs: Vec<LogEntry>,
}

impl ScenarioRecord {
    /// Record for a scenario that could not be coordinated at all
    pub fn failed(descriptor: &ScenarioDescriptor) -> Self {
        Self {
            scenario_id: descriptor.id.clone(),
            description: descriptor.description.clone(),
            consent_achieved: false,
            logs: Vec::new(),
        }
    }
}

/// Fraction of records that achieved consent; `0.0` for no records.
pub fn success_rate(records: &[ScenarioRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let achieved = records.iter().filter(|r| r.consent_achieved).count();
    achieved as f64 / records.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(achieved: bool) -> ScenarioRecord {
        ScenarioRecord {
            scenario_id: "s".into(),
            description: String::new(),
            consent_achieved: achieved,
            logs: Vec::new(),
        }
    }

    #[test]
    fn success_rate_counts_achieved() {
        assert_eq!(success_rate(&[]), 0.0);
        assert_eq!(success_rate(&[record(true), record(false)]), 0.5);
        assert_eq!(success_rate(&vec![record(true); 3]), 1.0);
    }

    #[test]
    fn empty_scope_is_not_consent() {
        assert_eq!(aggregate(&[], false), CoordinationOutcome::NoImpactedAgents);
        assert_eq!(aggregate(&[], true), CoordinationOutcome::Cancelled);
    }
}
