//! Drivers: proposed actions awaiting or having completed classification

use crate::{classify, DriverId, RobotId, TypesError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of proposed action. Fixed when the driver is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverType {
    SafetyCritical,
    Operational,
    Optimization,
}

impl DriverType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverType::SafetyCritical => "SAFETY_CRITICAL",
            DriverType::Operational => "OPERATIONAL",
            DriverType::Optimization => "OPTIMIZATION",
        }
    }
}

impl std::fmt::Display for DriverType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DriverType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "SAFETY_CRITICAL" => Ok(DriverType::SafetyCritical),
            "OPERATIONAL" => Ok(DriverType::Operational),
            "OPTIMIZATION" => Ok(DriverType::Optimization),
            _ => Err(TypesError::UnknownDriverType(s.to_string())),
        }
    }
}

/// Escalation tier controlling how broadly approval is sought
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentLevel {
    /// No external approval required
    Automatic,
    /// Approval sought from the affected subset of the network
    Active,
    /// Approval sought network-wide
    Full,
}

impl ConsentLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentLevel::Automatic => "AUTOMATIC",
            ConsentLevel::Active => "ACTIVE",
            ConsentLevel::Full => "FULL",
        }
    }

    /// Whether this level requires a vote among peers
    pub fn requires_vote(&self) -> bool {
        !matches!(self, ConsentLevel::Automatic)
    }
}

impl std::fmt::Display for ConsentLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConsentLevel {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AUTOMATIC" => Ok(ConsentLevel::Automatic),
            "ACTIVE" => Ok(ConsentLevel::Active),
            "FULL" => Ok(ConsentLevel::Full),
            _ => Err(TypesError::UnknownConsentLevel(s.to_string())),
        }
    }
}

/// A proposed action.
///
/// The descriptive fields are fixed at construction. The consent level is
/// unset until [`Driver::classify`] runs and never changes afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Driver {
    id: DriverId,
    driver_type: DriverType,
    urgency: i32,
    impact_scope: Vec<RobotId>,
    proposed_action: String,
    rationale: String,
    alternatives: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    consent_level: Option<ConsentLevel>,
    timestamp: DateTime<Utc>,
}

impl Driver {
    /// Create an unclassified driver
    pub fn new(
        id: impl Into<String>,
        driver_type: DriverType,
        urgency: i32,
        impact_scope: Vec<RobotId>,
    ) -> Self {
        Self {
            id: DriverId::new(id),
            driver_type,
            urgency,
            impact_scope,
            proposed_action: String::new(),
            rationale: String::new(),
            alternatives: Vec::new(),
            consent_level: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_proposed_action(mut self, action: impl Into<String>) -> Self {
        self.proposed_action = action.into();
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_alternatives(mut self, alternatives: Vec<String>) -> Self {
        self.alternatives = alternatives;
        self
    }

    pub fn id(&self) -> &DriverId {
        &self.id
    }

    pub fn driver_type(&self) -> DriverType {
        self.driver_type
    }

    pub fn urgency(&self) -> i32 {
        self.urgency
    }

    pub fn impact_scope(&self) -> &[RobotId] {
        &self.impact_scope
    }

    pub fn proposed_action(&self) -> &str {
        &self.proposed_action
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The stored consent level, if classification has run
    pub fn consent_level(&self) -> Option<ConsentLevel> {
        self.consent_level
    }

    pub fn is_classified(&self) -> bool {
        self.consent_level.is_some()
    }

    /// Classify this driver, storing the result on first call.
    ///
    /// Later calls return the stored level without recomputing it.
    pub fn classify(&mut self) -> ConsentLevel {
        if let Some(level) = self.consent_level {
            return level;
        }
        let level = classify(self.driver_type, self.urgency, self.impact_scope.len());
        self.consent_level = Some(level);
        level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(ids: &[&str]) -> Vec<RobotId> {
        ids.iter().map(|id| RobotId::new(*id)).collect()
    }

    #[test]
    fn consent_level_unset_until_classified() {
        let mut driver = Driver::new("d-1", DriverType::SafetyCritical, 7, scope(&["robot_1"]));
        assert_eq!(driver.consent_level(), None);
        assert!(!driver.is_classified());

        assert_eq!(driver.classify(), ConsentLevel::Full);
        assert_eq!(driver.consent_level(), Some(ConsentLevel::Full));
    }

    #[test]
    fn classify_twice_is_idempotent() {
        let mut driver = Driver::new(
            "d-2",
            DriverType::Operational,
            3,
            scope(&["robot_1", "robot_2", "robot_3", "robot_4"]),
        );
        let first = driver.classify();
        let second = driver.classify();
        assert_eq!(first, ConsentLevel::Full);
        assert_eq!(first, second);
    }

    #[test]
    fn stored_level_is_never_recomputed() {
        let json = serde_json::json!({
            "id": "d-3",
            "driver_type": "OPTIMIZATION",
            "urgency": 1,
            "impact_scope": ["robot_1"],
            "proposed_action": "",
            "rationale": "",
            "alternatives": [],
            "consent_level": "FULL",
            "timestamp": "2024-01-01T00:00:00Z"
        });
        let mut driver: Driver = serde_json::from_value(json).unwrap();
        // A persisted level wins over what the table would compute now.
        assert_eq!(driver.classify(), ConsentLevel::Full);
    }

    #[test]
    fn builder_sets_descriptive_fields() {
        let driver = Driver::new("d-4", DriverType::Optimization, 2, scope(&["robot_5"]))
            .with_proposed_action("sequence_4")
            .with_rationale("reduce idle time")
            .with_alternatives(vec!["Delay".into(), "Abort".into()]);

        assert_eq!(driver.id().as_str(), "d-4");
        assert_eq!(driver.proposed_action(), "sequence_4");
        assert_eq!(driver.rationale(), "reduce idle time");
        assert_eq!(driver.alternatives().len(), 2);
        assert_eq!(driver.impact_scope(), &[RobotId::new("robot_5")]);
    }

    #[test]
    fn enum_parsing_and_wire_names() {
        assert_eq!("safety-critical".parse::<DriverType>().unwrap(), DriverType::SafetyCritical);
        assert_eq!("OPERATIONAL".parse::<DriverType>().unwrap(), DriverType::Operational);
        assert!("strategic".parse::<DriverType>().is_err());
        assert_eq!("active".parse::<ConsentLevel>().unwrap(), ConsentLevel::Active);

        assert_eq!(
            serde_json::to_value(DriverType::SafetyCritical).unwrap(),
            "SAFETY_CRITICAL"
        );
        assert_eq!(serde_json::to_value(ConsentLevel::Automatic).unwrap(), "AUTOMATIC");
        assert!(!ConsentLevel::Automatic.requires_vote());
        assert!(ConsentLevel::Full.requires_vote());
    }
}
