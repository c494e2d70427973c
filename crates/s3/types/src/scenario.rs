//! Scenario descriptors supplied by an external scenario source

use crate::{Driver, DriverType, RobotId};
use serde::{Deserialize, Serialize};

/// Keyword that marks a scenario description as safety-critical
pub const EMERGENCY_KEYWORD: &str = "emergency";

/// Structured description of one scenario to coordinate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDescriptor {
    pub id: String,
    pub description: String,
    pub urgency: i32,
    pub impact_scope: Vec<RobotId>,
    #[serde(default)]
    pub proposed_action: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
    /// Explicit driver type. When absent the type is inferred from the
    /// description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_type: Option<DriverType>,
}

impl ScenarioDescriptor {
    /// The driver type this scenario will be proposed as
    pub fn resolved_driver_type(&self) -> DriverType {
        self.driver_type
            .unwrap_or_else(|| infer_driver_type(&self.description))
    }

    /// Build an unclassified driver from this scenario
    pub fn to_driver(&self) -> Driver {
        Driver::new(
            self.id.clone(),
            self.resolved_driver_type(),
            self.urgency,
            self.impact_scope.clone(),
        )
        .with_proposed_action(self.proposed_action.clone())
        .with_rationale(self.rationale.clone())
        .with_alternatives(self.alternatives.clone())
    }
}

/// Infer a driver type from free text.
///
/// Descriptions containing "emergency" (exact case) are safety-critical;
/// everything else is operational. Other spellings need an explicit
/// `driver_type` on the descriptor.
pub fn infer_driver_type(description: &str) -> DriverType {
    if description.contains(EMERGENCY_KEYWORD) {
        DriverType::SafetyCritical
    } else {
        DriverType::Operational
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(description: &str) -> ScenarioDescriptor {
        ScenarioDescriptor {
            id: "scenario_1".into(),
            description: description.into(),
            urgency: 7,
            impact_scope: vec![RobotId::new("robot_1"), RobotId::new("robot_2")],
            proposed_action: "sequence_2".into(),
            rationale: "clear the corridor".into(),
            alternatives: vec!["Delay".into(), "Modify".into(), "Abort".into()],
            driver_type: None,
        }
    }

    #[test]
    fn emergency_description_is_safety_critical() {
        assert_eq!(infer_driver_type("emergency task 2"), DriverType::SafetyCritical);
        assert_eq!(infer_driver_type("report: emergency"), DriverType::SafetyCritical);
        assert_eq!(infer_driver_type("EMERGENCY stop"), DriverType::Operational);
        assert_eq!(infer_driver_type("Emergency stop"), DriverType::Operational);
        assert_eq!(infer_driver_type("routine task 3"), DriverType::Operational);
    }

    #[test]
    fn explicit_type_overrides_heuristic() {
        let mut scenario = descriptor("emergency task 2");
        scenario.driver_type = Some(DriverType::Optimization);
        assert_eq!(scenario.resolved_driver_type(), DriverType::Optimization);

        let mut shouted = descriptor("EMERGENCY stop");
        assert_eq!(shouted.resolved_driver_type(), DriverType::Operational);
        shouted.driver_type = Some(DriverType::SafetyCritical);
        assert_eq!(shouted.resolved_driver_type(), DriverType::SafetyCritical);
    }

    #[test]
    fn to_driver_copies_fields() {
        let driver = descriptor("emergency task 2").to_driver();
        assert_eq!(driver.id().as_str(), "scenario_1");
        assert_eq!(driver.driver_type(), DriverType::SafetyCritical);
        assert_eq!(driver.urgency(), 7);
        assert_eq!(driver.impact_scope().len(), 2);
        assert_eq!(driver.proposed_action(), "sequence_2");
        assert_eq!(driver.alternatives(), &["Delay", "Modify", "Abort"]);
        assert!(driver.consent_level().is_none());
    }

    #[test]
    fn descriptor_deserializes_without_optional_fields() {
        let json = r#"{
            "id": "scenario_9",
            "description": "routine task 9",
            "urgency": 2,
            "impact_scope": ["robot_3"]
        }"#;
        let scenario: ScenarioDescriptor = serde_json::from_str(json).unwrap();
        assert!(scenario.alternatives.is_empty());
        assert_eq!(scenario.resolved_driver_type(), DriverType::Operational);
    }
}
