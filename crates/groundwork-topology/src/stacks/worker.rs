//! Queue-driven worker stack.

use crate::error::Result;
use crate::graph::{GrantAccess, ResourceGraph};
use crate::stacks::shared::SharedStack;
use groundwork_core::Environment;
use groundwork_core::model::{ComputeUnitSpec, ScheduleSpec, SecretRef};

/// The worker composition: one compute unit, one queue source, one schedule.
#[derive(Debug, Clone)]
pub struct WorkerStack {
    pub compute: ComputeUnitSpec,
    pub app_secret: SecretRef,
    /// Graph key of the compute unit.
    pub key: String,
}

impl WorkerStack {
    /// Compose the worker against the shared layer.
    ///
    /// The attach sequence is one-shot: network, then the queue source, then
    /// the schedule. A failure anywhere fails the whole composition; the
    /// external run retries it wholesale rather than resuming mid-sequence.
    ///
    /// `app_secret` is the web stack's application bundle. When the web stack
    /// has already run this is a direct handle; otherwise callers pass
    /// [`SecretRef::Named`] with the predictable bundle name, and only the
    /// `base_url` field is granted either way.
    pub fn build(
        env: Environment,
        shared: &SharedStack,
        app_secret: SecretRef,
        graph: &mut ResourceGraph,
    ) -> Result<Self> {
        let compute = ComputeUnitSpec::new(
            format!("worker-{env}"),
            &shared.artifact_bucket.name,
            "worker.zip",
        )
        .with_env("QUEUE_URL", format!("${{queue:{}:url}}", shared.work_queue.name))
        .with_env("DB_SECRET_ARN", format!("${{secret:{}:arn}}", shared.db_secret.name))
        .with_env("APP_SECRET_NAME", app_secret.resolved_name())
        .attach_queue_source(&shared.work_queue.name, 5)
        .attach_schedule(ScheduleSpec::daily_at(2, 0));

        let key = graph.add_resource("compute", &compute.name, &compute)?;
        graph.depends_on(&key, &shared.keys.network)?;
        graph.depends_on(&key, &format!("security-group:worker-{env}"))?;
        graph.depends_on(&key, &shared.keys.work_queue)?;
        graph.depends_on(&key, &shared.keys.artifact_bucket)?;

        // Daily maintenance trigger, independent of queue activity.
        let schedule_key = graph.add_resource(
            "schedule",
            &format!("worker-maintenance-{env}"),
            &ScheduleSpec::daily_at(2, 0),
        )?;
        graph.depends_on(&schedule_key, &key)?;

        graph.grant(&shared.keys.work_queue, &key, GrantAccess::Consume)?;
        graph.grant(&shared.keys.db_secret, &key, GrantAccess::Read)?;

        // Field-scoped read of the application bundle, never the whole
        // bundle. Late-bound references go through the name-based seam.
        let base_url = GrantAccess::ReadField("base_url".to_string());
        match &app_secret {
            SecretRef::Handle(name) => {
                graph.grant(&format!("secret:{name}"), &key, base_url)?;
            }
            SecretRef::Named(name) => {
                graph.grant_by_name(name, &key, base_url)?;
            }
        }

        Ok(Self {
            compute,
            app_secret,
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundwork_core::model::SecretSpec;

    fn built() -> (ResourceGraph, SharedStack, WorkerStack) {
        let env = Environment::Dev;
        let mut graph = ResourceGraph::new(env);
        let shared = SharedStack::build(env, &mut graph).unwrap();
        let app_secret = SecretRef::Named(SecretSpec::app_bundle_name(env));
        let worker = WorkerStack::build(env, &shared, app_secret, &mut graph).unwrap();
        (graph, shared, worker)
    }

    #[test]
    fn worker_consumes_the_queue_in_bounded_batches() {
        let (_, shared, worker) = built();
        let source = worker.compute.queue_source.expect("queue source attached");
        assert_eq!(source.queue, shared.work_queue.name);
        assert_eq!(source.batch_size, 5);
    }

    #[test]
    fn maintenance_runs_daily_at_two() {
        let (_, _, worker) = built();
        let schedule = worker.compute.schedule.expect("schedule attached");
        assert_eq!(schedule.expression(), "cron(0 2 * * ? *)");
    }

    #[test]
    fn worker_grants_are_least_privilege() {
        let (graph, shared, worker) = built();
        let grants = graph.grants_for(&worker.key);

        assert!(grants.iter().any(|(r, a)| *r == shared.keys.work_queue
            && **a == GrantAccess::Consume));
        assert!(grants.iter().any(|(r, a)| *r == shared.keys.db_secret
            && **a == GrantAccess::Read));
        // The bundle grant covers one field, not the bundle.
        assert!(grants.iter().all(|(r, a)| {
            *r != SecretSpec::app_bundle_name(Environment::Dev) || **a != GrantAccess::Read
        }));
    }

    #[test]
    fn worker_exposes_queue_and_secret_references_to_the_workload() {
        let (_, _, worker) = built();
        let env_vars = &worker.compute.environment;
        assert!(env_vars.contains_key("QUEUE_URL"));
        assert!(env_vars.contains_key("DB_SECRET_ARN"));
        assert_eq!(
            env_vars.get("APP_SECRET_NAME").map(String::as_str),
            Some("groundwork/dev/web/app-secrets")
        );
    }
}
