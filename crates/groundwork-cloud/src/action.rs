//! Planned provisioning actions.
//!
//! A [`Plan`] is the diff between a synthesized resource batch and the
//! recorded state: resources without a record are created, everything else is
//! a no-op. Re-planning an unchanged topology therefore yields an all-no-op
//! plan, which is what makes repeated runs idempotent.

use crate::provider::ResourceBatch;
use crate::state::ProvisionState;
use serde::{Deserialize, Serialize};

/// One planned action against a cloud resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub action_type: ActionType,
    pub resource_type: String,
    pub resource_id: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource.
    Create,
    /// Delete a resource.
    Delete,
    /// No changes needed.
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Plan containing all actions for one provisioning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<Action>,
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    /// Diff a synthesized batch against recorded state.
    pub fn diff(batch: &ResourceBatch, state: &ProvisionState) -> Self {
        let actions = batch
            .resources
            .iter()
            .map(|decl| {
                let key = decl.key();
                if state.get_resource(&key).is_some() {
                    Action {
                        id: format!("noop-{key}"),
                        action_type: ActionType::NoOp,
                        resource_type: decl.resource_type.clone(),
                        resource_id: decl.id.clone(),
                        description: format!("{key} already provisioned"),
                    }
                } else {
                    Action {
                        id: format!("create-{key}"),
                        action_type: ActionType::Create,
                        resource_type: decl.resource_type.clone(),
                        resource_id: decl.id.clone(),
                        description: format!("create {key}"),
                    }
                }
            })
            .collect();
        Self::new(actions)
    }

    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Summary of planned actions.
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub create: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to delete, {} unchanged",
            self.create, self.delete, self.no_change
        )
    }
}

/// Result of applying a plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    pub succeeded: Vec<ActionResult>,
    pub failed: Vec<ActionResult>,
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, action_id: impl Into<String>, message: impl Into<String>) {
        self.succeeded.push(ActionResult {
            action_id: action_id.into(),
            success: true,
            message: message.into(),
            error: None,
        });
    }

    pub fn add_failure(&mut self, action_id: impl Into<String>, error: impl Into<String>) {
        self.failed.push(ActionResult {
            action_id: action_id.into(),
            success: false,
            message: String::new(),
            error: Some(error.into()),
        });
    }
}

/// Result of a single action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub action_id: String,
    pub success: bool,
    pub message: String,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ResourceDecl;
    use crate::state::ResourceRecord;

    fn batch() -> ResourceBatch {
        let mut batch = ResourceBatch::new("dev");
        batch.resources.push(ResourceDecl::new(
            "bucket",
            "media-dev",
            serde_json::json!({"versioned": true}),
        ));
        batch.resources.push(ResourceDecl::new(
            "queue",
            "work-queue-dev",
            serde_json::json!({}),
        ));
        batch
    }

    #[test]
    fn fresh_state_plans_all_creates() {
        let plan = Plan::diff(&batch(), &ProvisionState::new());
        assert!(plan.has_changes);
        assert_eq!(plan.summary().create, 2);
        assert_eq!(plan.summary().no_change, 0);
    }

    #[test]
    fn replanning_provisioned_resources_is_all_noop() {
        let batch = batch();
        let mut state = ProvisionState::new();
        for decl in &batch.resources {
            state.set_resource(
                decl.key(),
                ResourceRecord::new(&decl.id, &decl.resource_type, false),
            );
        }

        let plan = Plan::diff(&batch, &state);
        assert!(!plan.has_changes);
        assert_eq!(plan.summary().no_change, 2);
    }
}
