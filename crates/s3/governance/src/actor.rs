//! Agent actor: one task owns a [`GovernanceAgent`] and handles its
//! proposals one at a time, so every log append for a robot has a single
//! writer.

use std::time::Duration;

use s3_types::{Driver, RobotId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::agent::{GovernanceAgent, LogReader, ProposalReceipt};
use crate::cancel::Cancellation;
use crate::error::{GovernanceError, GovernanceResult};

enum AgentCommand {
    Propose {
        driver: Driver,
        cancel: Cancellation,
        reply: oneshot::Sender<GovernanceResult<ProposalReceipt>>,
    },
    Shutdown,
}

/// Cloneable handle to a running agent actor.
#[derive(Clone, Debug)]
pub struct AgentHandle {
    robot_id: RobotId,
    tx: mpsc::Sender<AgentCommand>,
    log: LogReader,
}

impl std::fmt::Debug for AgentCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentCommand::Propose { driver, .. } => {
                f.debug_struct("Propose").field("driver", driver.id()).finish()
            }
            AgentCommand::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Move `agent` onto its own task and return a handle to it.
///
/// `capacity` bounds the number of queued proposals; further callers wait.
pub fn spawn_agent(agent: GovernanceAgent, capacity: usize) -> AgentHandle {
    let (tx, mut rx) = mpsc::channel(capacity.max(1));
    let robot_id = agent.robot_id().clone();
    let log = agent.log_reader();

    tokio::spawn(async move {
        let mut agent = agent;
        while let Some(command) = rx.recv().await {
            match command {
                AgentCommand::Propose {
                    mut driver,
                    cancel,
                    reply,
                } => {
                    let result = agent.propose(&mut driver, &cancel).await;
                    if reply.send(result).is_err() {
                        debug!(
                            robot_id = %agent.robot_id(),
                            driver_id = %driver.id(),
                            "Proposal caller went away"
                        );
                    }
                }
                AgentCommand::Shutdown => break,
            }
        }
        info!(robot_id = %agent.robot_id(), "Governance agent stopped");
    });

    AgentHandle { robot_id, tx, log }
}

impl AgentHandle {
    pub fn robot_id(&self) -> &RobotId {
        &self.robot_id
    }

    /// Read-only view of this agent's transparency log.
    pub fn log_reader(&self) -> &LogReader {
        &self.log
    }

    /// Queue a proposal and wait for the agent's receipt.
    pub async fn propose_action(
        &self,
        driver: Driver,
        cancel: Cancellation,
    ) -> GovernanceResult<ProposalReceipt> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(AgentCommand::Propose {
                driver,
                cancel,
                reply,
            })
            .await
            .map_err(|_| GovernanceError::AgentStopped(self.robot_id.clone()))?;

        rx.await
            .map_err(|_| GovernanceError::AgentStopped(self.robot_id.clone()))?
    }

    /// Like [`propose_action`](Self::propose_action) but fails with
    /// [`GovernanceError::ConsentTimeout`] if no receipt arrives within
    /// `limit`. The agent still finishes the proposal and logs it.
    pub async fn propose_within(
        &self,
        driver: Driver,
        cancel: Cancellation,
        limit: Duration,
    ) -> GovernanceResult<ProposalReceipt> {
        match tokio::time::timeout(limit, self.propose_action(driver, cancel)).await {
            Ok(result) => result,
            Err(_) => Err(GovernanceError::ConsentTimeout(limit.as_millis() as u64)),
        }
    }

    /// Ask the actor to stop after the proposals already queued.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(AgentCommand::Shutdown).await;
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GovernanceConfig;
    use crate::transport::{LocalConsentNetwork, VotePolicy};
    use s3_ledger::ActionType;
    use s3_types::{ConsentLevel, DriverType};
    use std::sync::Arc;

    fn spawn(policy: VotePolicy) -> AgentHandle {
        let network: Vec<RobotId> = ["robot_1", "robot_2", "robot_3"]
            .iter()
            .map(|id| RobotId::new(*id))
            .collect();
        let agent = GovernanceAgent::new(
            RobotId::new("robot_1"),
            network,
            Arc::new(LocalConsentNetwork::new(policy)),
            GovernanceConfig::default(),
        );
        spawn_agent(agent, 8)
    }

    fn driver(id: &str, driver_type: DriverType, urgency: i32) -> Driver {
        Driver::new(id, driver_type, urgency, vec![RobotId::new("robot_1")])
    }

    #[tokio::test]
    async fn proposals_go_through_the_actor() {
        let handle = spawn(VotePolicy::Approve);

        let receipt = handle
            .propose_action(driver("d-1", DriverType::SafetyCritical, 3), Cancellation::never())
            .await
            .unwrap();

        assert!(receipt.approved);
        assert_eq!(receipt.consent_level, ConsentLevel::Full);
        assert_eq!(receipt.driver.consent_level(), Some(ConsentLevel::Full));

        let reader = handle.log_reader();
        assert_eq!(reader.len().await, 3);
        assert_eq!(
            reader.last().await.map(|e| e.action_type),
            Some(ActionType::ConsentResolved)
        );
    }

    #[tokio::test]
    async fn concurrent_callers_are_serialized() {
        let handle = spawn(VotePolicy::Approve);

        let calls = (0..10).map(|i| {
            let handle = handle.clone();
            async move {
                handle
                    .propose_action(
                        driver(&format!("d-{i}"), DriverType::Optimization, 1),
                        Cancellation::never(),
                    )
                    .await
            }
        });
        let results = futures::future::join_all(calls).await;
        assert!(results.iter().all(|r| matches!(r, Ok(receipt) if receipt.approved)));

        let snapshot = handle.log_reader().snapshot().await;
        assert_eq!(snapshot.len(), 20);
        assert!(snapshot.verify_chain().is_ok());
    }

    #[tokio::test]
    async fn stopped_agent_is_reported() {
        let handle = spawn(VotePolicy::Approve);
        handle.shutdown().await;

        // Wait for the actor to drop its receiver.
        while handle.is_running() {
            tokio::task::yield_now().await;
        }

        let err = handle
            .propose_action(driver("d-1", DriverType::Optimization, 1), Cancellation::never())
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::AgentStopped(id) if id.as_str() == "robot_1"));
    }

    #[tokio::test(start_paused = true)]
    async fn propose_within_surfaces_a_hard_timeout() {
        let handle = spawn(VotePolicy::Silent);

        let err = handle
            .propose_within(
                driver("d-1", DriverType::SafetyCritical, 2),
                Cancellation::never(),
                Duration::from_millis(100),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::ConsentTimeout(100)));
    }
}
