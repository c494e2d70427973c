use std::collections::HashSet;

use chrono::Utc;
use s3_types::RobotId;
use serde::Serialize;
use tracing::debug;

use crate::entry::{ActionType, LogEntry};
use crate::error::{LedgerError, LedgerResult};

/// Append-only transparency log owned by a single robot.
///
/// There is no API to modify, remove, or reorder entries once appended;
/// readers only ever see shared references or clones.
#[derive(Clone, Debug)]
pub struct TransparencyLog {
    robot_id: RobotId,
    entries: Vec<LogEntry>,
}

impl TransparencyLog {
    pub fn new(robot_id: RobotId) -> Self {
        Self {
            robot_id,
            entries: Vec::new(),
        }
    }

    /// Rebuild a log from previously exported entries, verifying the chain.
    pub fn from_entries(robot_id: RobotId, entries: Vec<LogEntry>) -> LedgerResult<Self> {
        for entry in &entries {
            if entry.robot_id != robot_id {
                return Err(LedgerError::ForeignEntry {
                    seq: entry.seq,
                    expected: robot_id.to_string(),
                    found: entry.robot_id.to_string(),
                });
            }
        }
        verify_entries(&entries)?;
        Ok(Self { robot_id, entries })
    }

    /// Load a log from its JSON export.
    pub fn from_json(robot_id: RobotId, json: &str) -> LedgerResult<Self> {
        let entries: Vec<LogEntry> = serde_json::from_str(json)?;
        Self::from_entries(robot_id, entries)
    }

    /// Append a new entry.
    ///
    /// `details` is converted to JSON and digested in canonical form. A
    /// payload that cannot be serialized is an error: the entry is not
    /// written.
    pub fn append<T: Serialize + ?Sized>(
        &mut self,
        action_type: ActionType,
        details: &T,
    ) -> LedgerResult<LogEntry> {
        let details = serde_json::to_value(details)?;
        let seq = self.entries.len() as u64 + 1;
        let prev_hash = self.entries.last().map(|e| e.entry_hash.clone());

        let entry = LogEntry::seal(
            seq,
            Utc::now(),
            self.robot_id.clone(),
            action_type,
            details,
            prev_hash,
        );

        debug!(
            robot_id = %self.robot_id,
            seq,
            action_type = %action_type,
            integrity_hash = %entry.integrity_hash,
            "Log entry appended"
        );

        self.entries.push(entry.clone());
        Ok(entry)
    }

    pub fn robot_id(&self) -> &RobotId {
        &self.robot_id
    }

    /// Full ordered history
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.entries.iter()
    }

    /// Most recently appended entry
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate digests, sequence numbers, and hash links of the whole log.
    pub fn verify_chain(&self) -> LedgerResult<()> {
        verify_entries(&self.entries)
    }

    /// Export the log as a JSON array of entries.
    pub fn export_json(&self) -> LedgerResult<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}

impl<'a> IntoIterator for &'a TransparencyLog {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Validate an ordered sequence of entries from one robot's log.
pub fn verify_entries(entries: &[LogEntry]) -> LedgerResult<()> {
    let mut seen_hashes = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        let expected_seq = (index + 1) as u64;
        if entry.seq != expected_seq {
            return Err(LedgerError::IntegrityViolation {
                seq: entry.seq,
                reason: format!("expected seq {}, found {}", expected_seq, entry.seq),
            });
        }

        if index > 0 && entry.robot_id != entries[0].robot_id {
            return Err(LedgerError::ForeignEntry {
                seq: entry.seq,
                expected: entries[0].robot_id.to_string(),
                found: entry.robot_id.to_string(),
            });
        }

        let expected_prev = index.checked_sub(1).map(|i| entries[i].entry_hash.as_str());
        if entry.prev_hash.as_deref() != expected_prev {
            return Err(LedgerError::IntegrityViolation {
                seq: entry.seq,
                reason: "previous hash link mismatch".into(),
            });
        }

        if !entry.verify_integrity() {
            return Err(LedgerError::IntegrityViolation {
                seq: entry.seq,
                reason: "details digest mismatch".into(),
            });
        }

        if entry.recompute_entry_hash() != entry.entry_hash {
            return Err(LedgerError::IntegrityViolation {
                seq: entry.seq,
                reason: "entry hash mismatch".into(),
            });
        }

        if !seen_hashes.insert(entry.entry_hash.as_str()) {
            return Err(LedgerError::IntegrityViolation {
                seq: entry.seq,
                reason: "duplicate entry hash".into(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn log_with(n: usize) -> TransparencyLog {
        let mut log = TransparencyLog::new(RobotId::new("robot_1"));
        for i in 0..n {
            log.append(ActionType::DriverProposed, &json!({"driver_id": format!("d-{i}")}))
                .unwrap();
        }
        log
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("details cannot be serialized"))
        }
    }

    #[test]
    fn append_links_entries() {
        let log = log_with(3);
        assert_eq!(log.len(), 3);
        assert!(log.entries()[0].prev_hash.is_none());
        assert_eq!(
            log.entries()[1].prev_hash.as_deref(),
            Some(log.entries()[0].entry_hash.as_str())
        );
        assert_eq!(log.last().map(|e| e.seq), Some(3));
        assert!(log.verify_chain().is_ok());
    }

    #[test]
    fn serialization_failure_is_surfaced() {
        let mut log = TransparencyLog::new(RobotId::new("robot_1"));
        let result = log.append(ActionType::AutomaticExecution, &Unserializable);
        assert!(matches!(result, Err(LedgerError::Serialization(_))));
        assert!(log.is_empty());
    }

    #[test]
    fn tampered_details_detected() {
        let log = log_with(3);
        let mut entries = log.entries().to_vec();
        entries[1].details = json!({"driver_id": "forged"});
        let err = verify_entries(&entries).unwrap_err();
        assert!(matches!(err, LedgerError::IntegrityViolation { seq: 2, .. }));
    }

    #[test]
    fn rehashed_forgery_breaks_chain() {
        let log = log_with(3);
        let mut entries = log.entries().to_vec();
        // Forge the details and fix up the entry's own hashes; the next
        // entry's link still points at the original.
        let forged = LogEntry::seal(
            2,
            entries[1].timestamp,
            entries[1].robot_id.clone(),
            entries[1].action_type,
            json!({"driver_id": "forged"}),
            entries[1].prev_hash.clone(),
        );
        entries[1] = forged;
        let err = verify_entries(&entries).unwrap_err();
        assert!(matches!(err, LedgerError::IntegrityViolation { seq: 3, .. }));
    }

    #[test]
    fn deletion_and_reordering_detected() {
        let log = log_with(3);

        let mut deleted = log.entries().to_vec();
        deleted.remove(1);
        assert!(verify_entries(&deleted).is_err());

        let mut reordered = log.entries().to_vec();
        reordered.swap(0, 1);
        assert!(verify_entries(&reordered).is_err());
    }

    #[test]
    fn json_round_trip_verifies() {
        let log = log_with(2);
        let json = log.export_json().unwrap();
        let loaded = TransparencyLog::from_json(RobotId::new("robot_1"), &json).unwrap();
        assert_eq!(loaded.entries(), log.entries());
    }

    #[test]
    fn loading_foreign_log_fails() {
        let log = log_with(1);
        let json = log.export_json().unwrap();
        let result = TransparencyLog::from_json(RobotId::new("robot_2"), &json);
        assert!(matches!(result, Err(LedgerError::ForeignEntry { .. })));
    }

    proptest! {
        #[test]
        fn append_only_history(payloads in proptest::collection::vec("[a-z]{1,12}", 0..24)) {
            let mut log = TransparencyLog::new(RobotId::new("robot_p"));
            let mut snapshots: Vec<LogEntry> = Vec::new();

            for payload in &payloads {
                let entry = log
                    .append(ActionType::ConsentResolved, &json!({"note": payload}))
                    .unwrap();
                snapshots.push(entry);

                // No earlier entry changes when a new one is appended.
                prop_assert_eq!(&log.entries()[..snapshots.len()], &snapshots[..]);
            }

            prop_assert_eq!(log.len(), payloads.len());
            for (entry, payload) in log.iter().zip(&payloads) {
                prop_assert_eq!(entry.detail_str("note"), Some(payload.as_str()));
                prop_assert!(entry.verify_integrity());
            }
            prop_assert!(log.verify_chain().is_ok());
        }
    }
}
