//! S3 Governance Domain Types
//!
//! This crate defines the data entities shared by every layer of the S3
//! consent protocol: robots propose *drivers* (actions that may affect
//! themselves, their peers, or a shared environment) and obtain a calibrated
//! level of consent before acting.
//!
//! # Key Concepts
//!
//! - **Driver**: a proposed action plus its classification outcome.
//! - **Consent Level**: the escalation tier (`AUTOMATIC`, `ACTIVE`, `FULL`)
//!   that decides how broadly approval is sought.
//! - **Impact Scope**: the ordered list of robots an action may affect.
//! - **Scenario Descriptor**: the structured input produced by an external
//!   scenario source.
//!
//! # Architecture
//!
//! This is a pure types crate with no runtime dependencies. All types
//! implement `Clone`, `Debug`, `Serialize`, `Deserialize`. IDs use the
//! newtype pattern and implement `Display` and `new()`.

#![deny(unsafe_code)]

mod classification;
mod driver;
mod errors;
mod ids;
mod scenario;

pub use classification::*;
pub use driver::*;
pub use errors::*;
pub use ids::*;
pub use scenario::*;
