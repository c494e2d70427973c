#![deny(unsafe_code)]
//! Governance agents for the S3 consent protocol.
//!
//! This crate provides:
//! - **Error types** for governance failures ([`GovernanceError`]).
//! - **Quorum rules** deciding when a vote grants consent ([`QuorumRule`], [`Tally`]).
//! - **Consent rounds**, the `Pending → Collecting → {Granted, Denied, TimedOut, Cancelled}`
//!   vote state machine ([`ConsentRound`], [`RoundState`]).
//! - **Ballot transport** trait and in-process network
//!   ([`ConsentTransport`], [`LocalConsentNetwork`]).
//! - **The governance agent** that classifies drivers and runs the matching
//!   consent procedure ([`GovernanceAgent`]).
//! - **The agent actor** that serializes proposals per robot ([`spawn_agent`], [`AgentHandle`]).

pub mod actor;
pub mod agent;
pub mod cancel;
pub mod config;
pub mod details;
pub mod error;
pub mod quorum;
pub mod round;
pub mod transport;

// Re-exports for convenience.
pub use actor::{spawn_agent, AgentHandle};
pub use agent::{GovernanceAgent, LogReader, ProposalDecision, ProposalReceipt};
pub use cancel::{cancellation, CancelHandle, Cancellation};
pub use config::GovernanceConfig;
pub use error::{GovernanceError, GovernanceResult};
pub use quorum::{QuorumRule, Tally};
pub use round::{Ballot, BallotResponse, ConsentRound, RoundId, RoundState, RoundSummary};
pub use transport::{BallotRequest, ConsentTransport, LocalConsentNetwork, Vote, VotePolicy};
