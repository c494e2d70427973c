//! Consent-level classification
//!
//! Maps a driver's risk profile onto an escalation tier. The decision
//! table is the entire intelligence of the protocol:
//!
//! | driver type       | condition        | level       |
//! |-------------------|------------------|-------------|
//! | `SAFETY_CRITICAL` | urgency >= 8     | `AUTOMATIC` |
//! | `SAFETY_CRITICAL` | urgency < 8      | `FULL`      |
//! | `OPERATIONAL`     | scope size <= 3  | `ACTIVE`    |
//! | `OPERATIONAL`     | scope size > 3   | `FULL`      |
//! | `OPTIMIZATION`    | urgency < 5      | `AUTOMATIC` |
//! | `OPTIMIZATION`    | urgency >= 5     | `ACTIVE`    |
//!
//! A low-urgency safety issue gets the strictest review because there is
//! time to deliberate; a high-urgency one is acted on unilaterally.

use crate::{ConsentLevel, DriverType};

/// Urgency at or above which a safety-critical driver executes automatically
pub const SAFETY_AUTOMATIC_URGENCY: i32 = 8;

/// Largest impact scope an operational driver may have and stay `ACTIVE`
pub const OPERATIONAL_ACTIVE_MAX_SCOPE: usize = 3;

/// Urgency at or above which an optimization driver needs active consent
pub const OPTIMIZATION_ACTIVE_URGENCY: i32 = 5;

/// Classify a driver's risk profile into a consent level.
///
/// Pure and total: every combination of inputs maps to exactly one level.
/// Urgency values outside 0..=10 are accepted and compared as-is.
pub fn classify(driver_type: DriverType, urgency: i32, scope_size: usize) -> ConsentLevel {
    match driver_type {
        DriverType::SafetyCritical => {
            if urgency >= SAFETY_AUTOMATIC_URGENCY {
                ConsentLevel::Automatic
            } else {
                ConsentLevel::Full
            }
        }
        DriverType::Operational => {
            if scope_size <= OPERATIONAL_ACTIVE_MAX_SCOPE {
                ConsentLevel::Active
            } else {
                ConsentLevel::Full
            }
        }
        DriverType::Optimization => {
            if urgency < OPTIMIZATION_ACTIVE_URGENCY {
                ConsentLevel::Automatic
            } else {
                ConsentLevel::Active
            }
        }
    }
}
