//! In-process agent

use super::{Agent, AgentResult};
use crate::{
    error::AgentError,
    models::{AgentCheck, CheckRegistration, CheckStatus, ServiceRecord},
};
use async_trait::async_trait;
use futures::lock::Mutex;
use std::collections::{HashMap, HashSet};

/// Agent operations, used to inject failures into a [`MemoryAgent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `service_register`
    ServiceRegister,
    /// `service_deregister`
    ServiceDeregister,
    /// `check_register`
    CheckRegister,
    /// `checks`
    Checks,
}

/// Agent that keeps services and checks in memory
///
/// Services and checks are upserted by ID and a check registered without an
/// ID is keyed by its name, as a real agent does. Deregistering a service
/// also drops the checks bound to it.
#[derive(Debug)]
pub struct MemoryAgent {
    node: String,
    faults: HashMap<Operation, String>,
    reported_status: Option<CheckStatus>,
    hidden_checks: HashSet<String>,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    services: HashMap<String, ServiceRecord>,
    checks: HashMap<String, AgentCheck>,
}

impl MemoryAgent {
    /// Create an empty agent
    pub fn new() -> Self {
        Self {
            node: "memory".to_string(),
            faults: HashMap::new(),
            reported_status: None,
            hidden_checks: HashSet::new(),
            state: Mutex::new(State::default()),
        }
    }

    /// Make `operation` fail with `message`
    pub fn with_fault(mut self, operation: Operation, message: impl Into<String>) -> Self {
        self.faults.insert(operation, message.into());
        self
    }

    /// Report every check with `status` instead of its registered status
    pub fn with_reported_status(mut self, status: CheckStatus) -> Self {
        self.reported_status = Some(status);
        self
    }

    /// Store the check named `name` but leave it out of listings
    pub fn with_hidden_check(mut self, name: impl Into<String>) -> Self {
        self.hidden_checks.insert(name.into());
        self
    }

    /// Registered service instance, if any
    pub async fn service(&self, instance_id: &str) -> Option<ServiceRecord> {
        self.state.lock().await.services.get(instance_id).cloned()
    }

    /// Number of registered service instances
    pub async fn service_count(&self) -> usize {
        self.state.lock().await.services.len()
    }

    /// Stored check, whether hidden or not
    pub async fn check(&self, check_id: &str) -> Option<AgentCheck> {
        self.state.lock().await.checks.get(check_id).cloned()
    }

    /// Change the status of a stored check
    pub async fn set_check_status(&self, check_id: &str, status: CheckStatus) -> AgentResult<()> {
        let mut state = self.state.lock().await;
        let check = state
            .checks
            .get_mut(check_id)
            .ok_or_else(|| AgentError::NotFound(check_id.to_string()))?;
        check.status = status;
        Ok(())
    }

    fn fault(&self, operation: Operation) -> AgentResult<()> {
        match self.faults.get(&operation) {
            Some(message) => Err(AgentError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MemoryAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for MemoryAgent {
    async fn service_register(&self, record: &ServiceRecord) -> AgentResult<()> {
        self.fault(Operation::ServiceRegister)?;

        let mut state = self.state.lock().await;
        if let Some(check) = &record.check {
            let check_id = format!("service:{}", record.id);
            state.checks.insert(
                check_id.clone(),
                AgentCheck {
                    node: self.node.clone(),
                    check_id,
                    name: format!("Service '{}' check", record.name),
                    status: CheckStatus::Critical,
                    output: format!("TCP connect {}: not probed yet", check.tcp),
                    service_id: record.id.clone(),
                    service_name: record.name.clone(),
                    ..AgentCheck::default()
                },
            );
        }
        state.services.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn service_deregister(&self, instance_id: &str) -> AgentResult<()> {
        self.fault(Operation::ServiceDeregister)?;

        let mut state = self.state.lock().await;
        if state.services.remove(instance_id).is_none() {
            return Err(AgentError::NotFound(instance_id.to_string()));
        }
        state.checks.retain(|_, check| check.service_id != instance_id);
        Ok(())
    }

    async fn check_register(&self, check: &CheckRegistration) -> AgentResult<()> {
        self.fault(Operation::CheckRegister)?;

        let mut state = self.state.lock().await;
        let (service_id, service_name) = match &check.service_id {
            Some(id) => {
                let service = state
                    .services
                    .get(id)
                    .ok_or_else(|| AgentError::NotFound(id.clone()))?;
                (id.clone(), service.name.clone())
            }
            None => (String::new(), String::new()),
        };

        state.checks.insert(
            check.name.clone(),
            AgentCheck {
                node: self.node.clone(),
                check_id: check.name.clone(),
                name: check.name.clone(),
                status: check.status,
                service_id,
                service_name,
                ..AgentCheck::default()
            },
        );
        Ok(())
    }

    async fn checks(&self) -> AgentResult<HashMap<String, AgentCheck>> {
        self.fault(Operation::Checks)?;

        let state = self.state.lock().await;
        Ok(state
            .checks
            .iter()
            .filter(|(_, check)| !self.hidden_checks.contains(&check.name))
            .map(|(id, check)| {
                let mut check = check.clone();
                if let Some(status) = self.reported_status {
                    check.status = status;
                }
                (id.clone(), check)
            })
            .collect())
    }
}
