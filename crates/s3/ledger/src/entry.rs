use chrono::{DateTime, Utc};
use s3_types::RobotId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::details_digest;

/// Number of hex characters of the details digest kept as `integrity_hash`.
pub const INTEGRITY_PREFIX_LEN: usize = 16;

const ENTRY_DOMAIN: &[u8] = b"s3-log-entry-v1:";

/// Kind of governance action recorded by a log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    DriverProposed,
    AutomaticExecution,
    ActiveConsentInitiated,
    FullConsentInitiated,
    ConsentResolved,
    ConsentCancelled,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::DriverProposed => "driver_proposed",
            ActionType::AutomaticExecution => "automatic_execution",
            ActionType::ActiveConsentInitiated => "active_consent_initiated",
            ActionType::FullConsentInitiated => "full_consent_initiated",
            ActionType::ConsentResolved => "consent_resolved",
            ActionType::ConsentCancelled => "consent_cancelled",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable record in a robot's transparency log.
///
/// `integrity_hash` is the first [`INTEGRITY_PREFIX_LEN`] hex characters of
/// `details_digest`. `prev_hash`/`entry_hash` link the entry into the
/// robot's hash chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// 1-based position in the owning log
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub robot_id: RobotId,
    pub action_type: ActionType,
    pub details: Value,
    pub integrity_hash: String,
    /// Full hex BLAKE3 digest of the canonical details
    pub details_digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    pub entry_hash: String,
}

impl LogEntry {
    pub(crate) fn seal(
        seq: u64,
        timestamp: DateTime<Utc>,
        robot_id: RobotId,
        action_type: ActionType,
        details: Value,
        prev_hash: Option<String>,
    ) -> Self {
        let digest = details_digest(&details).to_hex().to_string();
        let integrity_hash = digest[..INTEGRITY_PREFIX_LEN].to_string();
        let entry_hash = compute_entry_hash(
            seq,
            prev_hash.as_deref(),
            &timestamp,
            &robot_id,
            action_type,
            &digest,
        );
        Self {
            seq,
            timestamp,
            robot_id,
            action_type,
            details,
            integrity_hash,
            details_digest: digest,
            prev_hash,
            entry_hash,
        }
    }

    /// Recompute the digest of the stored details and compare it with the
    /// stored integrity hash and full digest.
    pub fn verify_integrity(&self) -> bool {
        let digest = details_digest(&self.details).to_hex().to_string();
        digest[..INTEGRITY_PREFIX_LEN] == self.integrity_hash && digest == self.details_digest
    }

    /// Recompute the chain hash of this entry from its stored fields.
    pub fn recompute_entry_hash(&self) -> String {
        compute_entry_hash(
            self.seq,
            self.prev_hash.as_deref(),
            &self.timestamp,
            &self.robot_id,
            self.action_type,
            &self.details_digest,
        )
    }

    /// Look up a string field in the details payload.
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(Value::as_str)
    }
}

fn compute_entry_hash(
    seq: u64,
    prev_hash: Option<&str>,
    timestamp: &DateTime<Utc>,
    robot_id: &RobotId,
    action_type: ActionType,
    details_digest: &str,
) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(ENTRY_DOMAIN);
    hasher.update(&seq.to_le_bytes());

    match prev_hash {
        Some(prev) => {
            hasher.update(&[1]);
            hasher.update(prev.as_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }

    hasher.update(&timestamp.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());

    let robot = robot_id.as_str().as_bytes();
    hasher.update(&(robot.len() as u32).to_le_bytes());
    hasher.update(robot);

    hasher.update(action_type.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(details_digest.as_bytes());

    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> LogEntry {
        LogEntry::seal(
            1,
            Utc::now(),
            RobotId::new("robot_1"),
            ActionType::DriverProposed,
            json!({"driver_id": "d-1", "driver_type": "OPERATIONAL"}),
            None,
        )
    }

    #[test]
    fn integrity_hash_is_digest_prefix() {
        let entry = sample();
        assert_eq!(entry.integrity_hash.len(), INTEGRITY_PREFIX_LEN);
        assert!(entry.details_digest.starts_with(&entry.integrity_hash));
        assert!(entry.verify_integrity());
    }

    #[test]
    fn tampered_details_fail_verification() {
        let mut entry = sample();
        entry.details["driver_id"] = json!("d-forged");
        assert!(!entry.verify_integrity());
    }

    #[test]
    fn entry_hash_recomputes() {
        let entry = sample();
        assert_eq!(entry.recompute_entry_hash(), entry.entry_hash);

        let mut moved = entry.clone();
        moved.seq = 2;
        assert_ne!(moved.recompute_entry_hash(), entry.entry_hash);
    }

    #[test]
    fn action_type_wire_names() {
        assert_eq!(
            serde_json::to_value(ActionType::FullConsentInitiated).unwrap(),
            "full_consent_initiated"
        );
        assert_eq!(ActionType::DriverProposed.to_string(), "driver_proposed");
    }

    #[test]
    fn persisted_layout_has_audit_fields() {
        let value = serde_json::to_value(sample()).unwrap();
        for field in ["timestamp", "robot_id", "action_type", "details", "integrity_hash"] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
        assert_eq!(value["robot_id"], "robot_1");
        assert_eq!(value["action_type"], "driver_proposed");
        assert!(value.get("prev_hash").is_none());
    }
}
