use serde::{Deserialize, Serialize};

/// Identifier of a robot taking part in the governance network
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RobotId(pub String);

impl RobotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RobotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RobotId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RobotId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a driver (proposed action).
///
/// Supplied by the caller; uniqueness is not validated.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverId(pub String);

impl DriverId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DriverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robot_id_display_and_serde() {
        let id = RobotId::new("robot_1");
        assert_eq!(id.to_string(), "robot_1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"robot_1\"");

        let back: RobotId = serde_json::from_str("\"robot_2\"").unwrap();
        assert_eq!(back, RobotId::from("robot_2"));
    }

    #[test]
    fn driver_id_is_transparent() {
        let id = DriverId::new("scenario_1");
        assert_eq!(serde_json::to_value(&id).unwrap(), "scenario_1");
    }
}
