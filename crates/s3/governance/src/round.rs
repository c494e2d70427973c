//! Consent rounds: the vote state machine behind ACTIVE and FULL consent.
//!
//! A round moves `Pending → Collecting` when ballots go out and then ends in
//! exactly one of `Granted`, `Denied`, `TimedOut`, or `Cancelled`. Every
//! ballot is bounded by the round's deadline; a voter that does not answer
//! in time counts as missing, never as approval.

use std::time::Duration;

use futures::future::join_all;
use s3_types::{ConsentLevel, DriverId, RobotId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cancel::Cancellation;
use crate::quorum::{QuorumRule, Tally};
use crate::transport::{BallotRequest, ConsentTransport, Vote};

/// Unique identifier for a consent round
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub String);

impl RoundId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for RoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of a consent round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    /// Created, no ballots sent yet
    #[default]
    Pending,
    /// Ballots are out
    Collecting,
    /// Quorum reached
    Granted,
    /// Quorum cannot be reached with the answers given
    Denied,
    /// Quorum not reached and could have been with the missing answers
    TimedOut,
    /// Abandoned by the caller while collecting
    Cancelled,
}

impl RoundState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RoundState::Pending | RoundState::Collecting)
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, RoundState::Granted)
    }
}

/// A voter's recorded answer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallotResponse {
    Approved,
    Denied,
    TimedOut,
    Unreachable,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub voter: RobotId,
    pub response: BallotResponse,
}

/// Compact result of a finished round, suitable for receipts and logs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round_id: RoundId,
    pub consent_level: ConsentLevel,
    pub quorum: QuorumRule,
    pub state: RoundState,
    pub tally: Tally,
    pub ballots: Vec<Ballot>,
}

/// One vote among a fixed electorate.
#[derive(Clone, Debug)]
pub struct ConsentRound {
    id: RoundId,
    driver_id: DriverId,
    consent_level: ConsentLevel,
    quorum: QuorumRule,
    voters: Vec<RobotId>,
    ballots: Vec<Ballot>,
    state: RoundState,
}

impl ConsentRound {
    pub fn new(
        driver_id: DriverId,
        consent_level: ConsentLevel,
        quorum: QuorumRule,
        voters: Vec<RobotId>,
    ) -> Self {
        Self {
            id: RoundId::generate(),
            driver_id,
            consent_level,
            quorum,
            voters,
            ballots: Vec::new(),
            state: RoundState::Pending,
        }
    }

    pub fn id(&self) -> &RoundId {
        &self.id
    }

    pub fn voters(&self) -> &[RobotId] {
        &self.voters
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self.ballots
    }

    /// Count the recorded ballots against the electorate.
    pub fn tally(&self) -> Tally {
        let mut tally = Tally::new(self.voters.len());
        for ballot in &self.ballots {
            match ballot.response {
                BallotResponse::Approved => tally.approvals += 1,
                BallotResponse::Denied => tally.denials += 1,
                BallotResponse::TimedOut | BallotResponse::Unreachable => tally.missing += 1,
            }
        }
        tally
    }

    /// Send ballots to every voter concurrently and resolve the round.
    ///
    /// Each ballot is bounded by `deadline`. If `cancel` fires first the
    /// round ends `Cancelled` and the outstanding ballots are abandoned.
    pub async fn collect(
        &mut self,
        transport: &dyn ConsentTransport,
        request: &BallotRequest,
        deadline: Duration,
        cancel: &Cancellation,
    ) -> RoundState {
        if self.state.is_terminal() {
            return self.state;
        }
        self.state = RoundState::Collecting;

        debug!(
            round_id = %self.id,
            driver_id = %self.driver_id,
            voters = self.voters.len(),
            deadline_ms = deadline.as_millis() as u64,
            "Collecting ballots"
        );

        let voters = self.voters.clone();
        let requests = voters.iter().map(|voter| async move {
            let response =
                match tokio::time::timeout(deadline, transport.request_ballot(voter, request)).await
                {
                    Ok(Ok(Vote::Approve)) => BallotResponse::Approved,
                    Ok(Ok(Vote::Deny)) => BallotResponse::Denied,
                    Ok(Err(e)) => {
                        warn!(voter = %voter, error = %e, "Ballot delivery failed");
                        BallotResponse::Unreachable
                    }
                    Err(_) => {
                        warn!(voter = %voter, "Ballot timed out");
                        BallotResponse::TimedOut
                    }
                };
            Ballot {
                voter: voter.clone(),
                response,
            }
        });

        let collected = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            ballots = join_all(requests) => Some(ballots),
        };

        match collected {
            Some(ballots) => {
                self.ballots = ballots;
                self.resolve()
            }
            None => {
                warn!(round_id = %self.id, driver_id = %self.driver_id, "Consent round cancelled");
                self.state = RoundState::Cancelled;
                self.state
            }
        }
    }

    /// Decide the final state from the recorded ballots.
    fn resolve(&mut self) -> RoundState {
        let tally = self.tally();
        self.state = if self.quorum.is_met(&tally) {
            RoundState::Granted
        } else if tally.missing > 0 && self.quorum.could_be_met(&tally) {
            RoundState::TimedOut
        } else {
            RoundState::Denied
        };

        info!(
            round_id = %self.id,
            driver_id = %self.driver_id,
            quorum = %self.quorum,
            approvals = tally.approvals,
            denials = tally.denials,
            missing = tally.missing,
            state = ?self.state,
            "Consent round resolved"
        );

        self.state
    }

    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            round_id: self.id.clone(),
            consent_level: self.consent_level,
            quorum: self.quorum,
            state: self.state,
            tally: self.tally(),
            ballots: self.ballots.clone(),
        }
    }
}
