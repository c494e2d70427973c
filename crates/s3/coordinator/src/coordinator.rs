//! Scenario routing across the robot network

use std::collections::BTreeMap;
use std::sync::Arc;

use s3_governance::{
    spawn_agent, AgentHandle, Cancellation, ConsentTransport, GovernanceAgent, GovernanceConfig,
};
use s3_types::{RobotId, ScenarioDescriptor};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CoordinatorError, CoordinatorResult};
use crate::outcome::{aggregate, AgentOutcome, CoordinationResult};

/// How impact-scope ids without an agent are treated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MembershipMode {
    /// Skip them with a warning
    #[default]
    Lenient,
    /// Reject the scenario before any agent is contacted
    Strict,
}

/// Owns one governance agent per robot and routes scenarios to them.
///
/// The coordinator only reads agent logs; every append happens inside the
/// agent actors.
pub struct Coordinator {
    membership: Vec<RobotId>,
    agents: BTreeMap<RobotId, AgentHandle>,
    mode: MembershipMode,
}

impl Coordinator {
    /// Spawn an agent for every member. Each agent's network is the full
    /// membership. Must be called inside a tokio runtime.
    pub fn new(
        membership: Vec<RobotId>,
        config: GovernanceConfig,
        mode: MembershipMode,
        transport: Arc<dyn ConsentTransport>,
    ) -> Self {
        let mut members: Vec<RobotId> = Vec::with_capacity(membership.len());
        for id in membership {
            if !members.contains(&id) {
                members.push(id);
            }
        }

        let agents = members
            .iter()
            .map(|id| {
                let agent = GovernanceAgent::new(
                    id.clone(),
                    members.clone(),
                    Arc::clone(&transport),
                    config.clone(),
                );
                (id.clone(), spawn_agent(agent, config.mailbox_capacity))
            })
            .collect();

        info!(agents = members.len(), mode = ?mode, "Coordinator started");

        Self {
            membership: members,
            agents,
            mode,
        }
    }

    /// Coordinator whose ballots are answered by the configured vote policies
    pub fn with_local_network(
        membership: Vec<RobotId>,
        config: GovernanceConfig,
        mode: MembershipMode,
    ) -> Self {
        let transport = Arc::new(config.local_network());
        Self::new(membership, config, mode, transport)
    }

    pub fn membership(&self) -> &[RobotId] {
        &self.membership
    }

    pub fn mode(&self) -> MembershipMode {
        self.mode
    }

    pub fn agent(&self, robot_id: &RobotId) -> Option<&AgentHandle> {
        self.agents.get(robot_id)
    }

    pub async fn coordinate_scenario(
        &self,
        descriptor: &ScenarioDescriptor,
    ) -> CoordinatorResult<CoordinationResult> {
        self.coordinate_scenario_with_cancel(descriptor, Cancellation::never())
            .await
    }

    /// Propose the scenario to every impacted agent, in scope order, and
    /// AND their outcomes.
    ///
    /// Once `cancel` fires, votes in flight end cancelled and agents not yet
    /// contacted are skipped.
    pub async fn coordinate_scenario_with_cancel(
        &self,
        descriptor: &ScenarioDescriptor,
        cancel: Cancellation,
    ) -> CoordinatorResult<CoordinationResult> {
        if self.mode == MembershipMode::Strict {
            if let Some(unknown) = descriptor
                .impact_scope
                .iter()
                .find(|id| !self.agents.contains_key(*id))
            {
                return Err(CoordinatorError::UnknownAgent(unknown.clone()));
            }
        }

        let mut driver = descriptor.to_driver();
        let level = driver.classify();
        info!(
            scenario_id = %descriptor.id,
            driver_type = %driver.driver_type(),
            level = %level,
            scope = descriptor.impact_scope.len(),
            "Coordinating scenario"
        );

        let mut agents = Vec::new();
        let mut skipped = Vec::new();
        let mut cancelled = false;

        for robot_id in &descriptor.impact_scope {
            if cancelled || cancel.is_cancelled() {
                cancelled = true;
                skipped.push(robot_id.clone());
                continue;
            }

            let Some(handle) = self.agents.get(robot_id) else {
                warn!(
                    scenario_id = %descriptor.id,
                    robot_id = %robot_id,
                    "No agent for robot, skipping"
                );
                skipped.push(robot_id.clone());
                continue;
            };

            // Other proposals may reach this agent meanwhile; only the entries
            // this call appended belong to the scenario.
            let mut receipt = handle.propose_action(driver.clone(), cancel.clone()).await?;
            let latest_entry = receipt
                .entries
                .pop()
                .ok_or_else(|| CoordinatorError::EmptyLog(robot_id.clone()))?;

            let outcome = AgentOutcome {
                robot_id: robot_id.clone(),
                consent_level: receipt.consent_level,
                approved: receipt.approved,
                decision: receipt.decision,
                latest_entry,
            };
            cancelled |= outcome.was_cancelled();
            agents.push(outcome);
        }

        if cancelled {
            warn!(scenario_id = %descriptor.id, skipped = skipped.len(), "Scenario cancelled");
        }

        let outcome = aggregate(&agents, cancelled);
        info!(
            scenario_id = %descriptor.id,
            outcome = ?outcome,
            agents = agents.len(),
            "Scenario coordinated"
        );

        Ok(CoordinationResult {
            scenario_id: descriptor.id.clone(),
            description: descriptor.description.clone(),
            driver,
            outcome,
            agents,
            skipped,
        })
    }

    /// Stop every agent actor after its queued proposals.
    pub async fn shutdown(&self) {
        for handle in self.agents.values() {
            handle.shutdown().await;
        }
    }
}
