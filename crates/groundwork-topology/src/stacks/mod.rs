//! Stack composers and the topology orchestrator.
//!
//! One directed acyclic instantiation: the shared layer is built once, then
//! the web and worker composers are wired from its outputs. The web stack
//! runs before the worker so the application secret exists as a first-class
//! handle; [`WorkerStack::build`] also accepts a name-only reference for
//! deployments that invert that order.

pub mod shared;
pub mod web;
pub mod worker;

pub use shared::SharedStack;
pub use web::WebStack;
pub use worker::WorkerStack;

use crate::error::Result;
use crate::graph::ResourceGraph;
use groundwork_core::model::SecretRef;
use groundwork_core::{CertificateTable, Environment};

/// The fully composed deployment for one environment.
#[derive(Debug, Clone)]
pub struct Topology {
    pub shared: SharedStack,
    pub web: WebStack,
    pub worker: WorkerStack,
    pub graph: ResourceGraph,
}

/// Build the full topology.
///
/// Fails before declaring anything when the environment has no TLS
/// certificate; fails on any access-matrix violation. Synthesizing the same
/// environment twice produces identical graphs.
pub fn synthesize(env: Environment, certs: &CertificateTable) -> Result<Topology> {
    let mut graph = ResourceGraph::new(env);

    let shared = SharedStack::build(env, &mut graph)?;
    let web = WebStack::build(env, &shared, certs, &mut graph)?;
    let worker = WorkerStack::build(
        env,
        &shared,
        SecretRef::from_spec(&web.app_secret),
        &mut graph,
    )?;

    tracing::info!(
        "Synthesized {} resources for {}",
        graph.len(),
        env
    );
    Ok(Topology {
        shared,
        web,
        worker,
        graph,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundwork_core::model::{SecretSpec, SecurityGroupRole};

    fn certs() -> CertificateTable {
        let mut table = CertificateTable::new();
        table.insert(Environment::Dev, "arn:aws:acm:us-east-1:111:certificate/dev");
        table.insert(Environment::Prod, "arn:aws:acm:us-east-1:111:certificate/prod");
        table
    }

    #[test]
    fn synthesis_is_deterministic_and_duplicate_free() {
        let first = synthesize(Environment::Dev, &certs()).unwrap();
        let second = synthesize(Environment::Dev, &certs()).unwrap();
        assert_eq!(
            serde_json::to_string(&first.graph.to_batch()).unwrap(),
            serde_json::to_string(&second.graph.to_batch()).unwrap()
        );
    }

    #[test]
    fn database_ingress_invariant_holds_for_every_environment() {
        for env in Environment::ALL {
            let topology = synthesize(env, &certs()).unwrap();
            let db = topology.shared.access.role(SecurityGroupRole::Database);
            assert_eq!(db.ingress.len(), 3, "{env}");
        }
    }

    #[test]
    fn missing_certificate_aborts_synthesis() {
        let table = CertificateTable::new();
        let err = synthesize(Environment::Prod, &table).unwrap_err();
        assert!(err.to_string().contains("certificate"));
    }

    #[test]
    fn worker_without_a_web_handle_uses_the_predictable_name() {
        let env = Environment::Dev;
        let mut graph = ResourceGraph::new(env);
        let shared = SharedStack::build(env, &mut graph).unwrap();

        // Web stack has not run: resolve by name instead of handle.
        let late = SecretRef::Named(SecretSpec::app_bundle_name(env));
        let worker = WorkerStack::build(env, &shared, late, &mut graph).unwrap();

        let grants = graph.grants_for(&worker.key);
        let secret_grant = grants
            .iter()
            .find(|(resource, _)| *resource == SecretSpec::app_bundle_name(env))
            .expect("late-bound secret grant recorded");
        assert_eq!(
            secret_grant.1,
            &crate::graph::GrantAccess::ReadField("base_url".to_string())
        );
    }
}
