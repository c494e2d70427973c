#![deny(unsafe_code)]
//! Scenario coordination for the S3 governance network.
//!
//! The [`Coordinator`] turns a [`ScenarioDescriptor`](s3_types::ScenarioDescriptor)
//! into a driver, proposes it to the agent of every impacted robot and
//! reports the AND of their consent outcomes together with each agent's
//! latest transparency-log entry.

mod coordinator;
mod error;
mod outcome;

pub use coordinator::{Coordinator, MembershipMode};
pub use error::{CoordinatorError, CoordinatorResult};
pub use outcome::{
    success_rate, AgentOutcome, CoordinationOutcome, CoordinationResult, ScenarioRecord,
};
