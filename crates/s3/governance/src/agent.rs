//! The per-robot governance agent.
//!
//! For every proposal the agent:
//! 1. logs `driver_proposed` before anything else can fail,
//! 2. classifies the driver (stored on the driver, never recomputed),
//! 3. runs exactly one consent procedure for the resulting level.

use std::sync::Arc;

use s3_ledger::{ActionType, LogEntry, TransparencyLog};
use s3_types::{ConsentLevel, Driver, RobotId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cancel::Cancellation;
use crate::config::GovernanceConfig;
use crate::details::{
    AutomaticExecution, ConsentCancelled, ConsentInitiated, ConsentResolved, DriverProposed,
};
use crate::error::{GovernanceError, GovernanceResult};
use crate::round::{ConsentRound, RoundState, RoundSummary};
use crate::transport::{BallotRequest, ConsentTransport};

/// How a proposal was decided
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "procedure", rename_all = "snake_case")]
pub enum ProposalDecision {
    /// AUTOMATIC: executed without a vote
    Executed,
    /// ACTIVE or FULL: decided by a consent round
    Voted(RoundSummary),
}

/// Everything one `propose` call produced.
#[derive(Clone, Debug)]
pub struct ProposalReceipt {
    pub robot_id: RobotId,
    /// The driver after classification
    pub driver: Driver,
    pub consent_level: ConsentLevel,
    pub decision: ProposalDecision,
    pub approved: bool,
    /// Log entries appended by this call, in order
    pub entries: Vec<LogEntry>,
}

/// Read-only view of an agent's transparency log.
#[derive(Clone, Debug)]
pub struct LogReader {
    log: Arc<RwLock<TransparencyLog>>,
}

impl LogReader {
    pub async fn entries(&self) -> Vec<LogEntry> {
        self.log.read().await.entries().to_vec()
    }

    pub async fn last(&self) -> Option<LogEntry> {
        self.log.read().await.last().cloned()
    }

    pub async fn len(&self) -> usize {
        self.log.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.log.read().await.is_empty()
    }

    /// Copy of the whole log, e.g. for export or verification
    pub async fn snapshot(&self) -> TransparencyLog {
        self.log.read().await.clone()
    }
}

/// Governance state machine for one robot.
pub struct GovernanceAgent {
    robot_id: RobotId,
    network_ids: Vec<RobotId>,
    log: Arc<RwLock<TransparencyLog>>,
    transport: Arc<dyn ConsentTransport>,
    config: GovernanceConfig,
}

impl GovernanceAgent {
    pub fn new(
        robot_id: RobotId,
        network_ids: Vec<RobotId>,
        transport: Arc<dyn ConsentTransport>,
        config: GovernanceConfig,
    ) -> Self {
        let mut unique: Vec<RobotId> = Vec::with_capacity(network_ids.len());
        for id in network_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        Self {
            log: Arc::new(RwLock::new(TransparencyLog::new(robot_id.clone()))),
            robot_id,
            network_ids: unique,
            transport,
            config,
        }
    }

    pub fn robot_id(&self) -> &RobotId {
        &self.robot_id
    }

    pub fn network_ids(&self) -> &[RobotId] {
        &self.network_ids
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn log_reader(&self) -> LogReader {
        LogReader {
            log: Arc::clone(&self.log),
        }
    }

    /// Robots in `impact_scope` that this agent knows, in scope order,
    /// without duplicates. Unknown ids are dropped.
    pub fn affected_robots(&self, impact_scope: &[RobotId]) -> Vec<RobotId> {
        let mut affected: Vec<RobotId> = Vec::new();
        for id in impact_scope {
            if self.network_ids.contains(id) && !affected.contains(id) {
                affected.push(id.clone());
            }
        }
        affected
    }

    /// Propose `driver` and report whether consent was obtained.
    pub async fn propose_action(&mut self, driver: &mut Driver) -> GovernanceResult<bool> {
        let receipt = self.propose(driver, &Cancellation::never()).await?;
        *driver = receipt.driver;
        Ok(receipt.approved)
    }

    /// Propose `driver`, returning the full receipt.
    ///
    /// Log failures abort the proposal with an error. Vote failures only
    /// make the outcome negative.
    pub async fn propose(
        &mut self,
        driver: &mut Driver,
        cancel: &Cancellation,
    ) -> GovernanceResult<ProposalReceipt> {
        let mut entries = Vec::new();

        entries.push(
            self.append(ActionType::DriverProposed, &DriverProposed::from(&*driver))
                .await?,
        );

        let level = driver.classify();
        info!(
            robot_id = %self.robot_id,
            driver_id = %driver.id(),
            driver_type = %driver.driver_type(),
            urgency = driver.urgency(),
            level = %level,
            "Driver classified"
        );

        let decision = match level {
            ConsentLevel::Automatic => {
                entries.push(
                    self.append(
                        ActionType::AutomaticExecution,
                        &AutomaticExecution {
                            driver_id: driver.id().clone(),
                            consent_level: level,
                            proposed_action: driver.proposed_action().to_string(),
                        },
                    )
                    .await?,
                );
                ProposalDecision::Executed
            }
            ConsentLevel::Active => {
                let voters = self.affected_robots(driver.impact_scope());
                let summary = self
                    .run_round(
                        driver,
                        level,
                        ActionType::ActiveConsentInitiated,
                        voters,
                        cancel,
                        &mut entries,
                    )
                    .await?;
                ProposalDecision::Voted(summary)
            }
            ConsentLevel::Full => {
                let voters = self.network_ids.clone();
                let summary = self
                    .run_round(
                        driver,
                        level,
                        ActionType::FullConsentInitiated,
                        voters,
                        cancel,
                        &mut entries,
                    )
                    .await?;
                ProposalDecision::Voted(summary)
            }
        };

        let approved = match &decision {
            ProposalDecision::Executed => true,
            ProposalDecision::Voted(summary) => summary.state.is_granted(),
        };

        info!(
            robot_id = %self.robot_id,
            driver_id = %driver.id(),
            approved,
            "Proposal decided"
        );

        Ok(ProposalReceipt {
            robot_id: self.robot_id.clone(),
            driver: driver.clone(),
            consent_level: level,
            decision,
            approved,
            entries,
        })
    }

    async fn run_round(
        &self,
        driver: &Driver,
        level: ConsentLevel,
        initiated: ActionType,
        voters: Vec<RobotId>,
        cancel: &Cancellation,
        entries: &mut Vec<LogEntry>,
    ) -> GovernanceResult<RoundSummary> {
        let Some((quorum, deadline)) = self.config.round_parameters(level) else {
            return Err(GovernanceError::Classification(format!(
                "consent level {level} does not hold a vote"
            )));
        };

        let mut round = ConsentRound::new(driver.id().clone(), level, quorum, voters);

        entries.push(
            self.append(
                initiated,
                &ConsentInitiated {
                    driver_id: driver.id().clone(),
                    round_id: round.id().clone(),
                    consent_level: level,
                    quorum,
                    voters: round.voters().to_vec(),
                    timeout_ms: deadline.as_millis() as u64,
                },
            )
            .await?,
        );

        let request = BallotRequest {
            round_id: round.id().clone(),
            proposer: self.robot_id.clone(),
            driver_id: driver.id().clone(),
            driver_type: driver.driver_type(),
            urgency: driver.urgency(),
            consent_level: level,
            proposed_action: driver.proposed_action().to_string(),
        };

        let state = round
            .collect(self.transport.as_ref(), &request, deadline, cancel)
            .await;

        let entry = match state {
            RoundState::Cancelled => {
                warn!(
                    robot_id = %self.robot_id,
                    driver_id = %driver.id(),
                    "Consent vote cancelled"
                );
                self.append(
                    ActionType::ConsentCancelled,
                    &ConsentCancelled {
                        driver_id: driver.id().clone(),
                        round_id: round.id().clone(),
                        pending_voters: round.voters().to_vec(),
                    },
                )
                .await?
            }
            _ => {
                if state == RoundState::TimedOut {
                    warn!(
                        robot_id = %self.robot_id,
                        driver_id = %driver.id(),
                        "Consent not granted before deadline"
                    );
                }
                self.append(
                    ActionType::ConsentResolved,
                    &ConsentResolved::from_round(driver.id(), &round),
                )
                .await?
            }
        };
        entries.push(entry);

        Ok(round.summary())
    }

    async fn append<T: Serialize + ?Sized>(
        &self,
        action_type: ActionType,
        details: &T,
    ) -> GovernanceResult<LogEntry> {
        let mut log = self.log.write().await;
        Ok(log.append(action_type, details)?)
    }
}
