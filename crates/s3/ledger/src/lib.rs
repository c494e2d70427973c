//! S3 Transparency Log - append-only audit trail of governance events
//!
//! Every governance agent owns exactly one [`TransparencyLog`]. Each entry
//! records what the agent did (`action_type`), the structured `details`,
//! and an integrity hash computed over a canonical serialization of those
//! details. Entries are additionally linked into a BLAKE3 hash chain so an
//! auditor can detect edits, deletions, and reordering after the fact.
//!
//! Verification is always a recomputation: digest the stored `details`
//! again, compare against the stored hash, and walk the chain links.

#![deny(unsafe_code)]

pub mod canonical;
pub mod entry;
pub mod error;
pub mod log;

pub use canonical::{canonical_bytes, details_digest};
pub use entry::{ActionType, LogEntry, INTEGRITY_PREFIX_LEN};
pub use error::{LedgerError, LedgerResult};
pub use log::{verify_entries, TransparencyLog};
