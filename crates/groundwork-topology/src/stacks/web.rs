//! Web-facing service stack.

use crate::error::Result;
use crate::graph::{GrantAccess, ResourceGraph};
use crate::stacks::shared::SharedStack;
use groundwork_core::model::{
    ClusterSpec, LoadBalancerSpec, RepositorySpec, SecretScope, SecretSpec, SecretTemplate,
    ServiceSpec, TaskSecret, TaskSpec,
};
use groundwork_core::{CertificateTable, Environment, ResourceKind, SizingPolicy};
use std::collections::BTreeMap;

const CONTAINER_PORT: u16 = 3000;

/// The web composition: container service, scaling, load balancer, and the
/// application secret bundle this stack owns.
#[derive(Debug, Clone)]
pub struct WebStack {
    pub app_secret: SecretSpec,
    pub repository: RepositorySpec,
    pub cluster: ClusterSpec,
    pub service: ServiceSpec,
    pub load_balancer: LoadBalancerSpec,
    /// Graph key of the service.
    pub key: String,
}

impl WebStack {
    /// Compose the service against the shared layer.
    ///
    /// The certificate lookup runs before anything is declared: a missing
    /// certificate for the active environment aborts composition with the
    /// graph untouched.
    pub fn build(
        env: Environment,
        shared: &SharedStack,
        certs: &CertificateTable,
        graph: &mut ResourceGraph,
    ) -> Result<Self> {
        let certificate_arn = certs.lookup(env)?.to_string();
        let policy = SizingPolicy::lookup(ResourceKind::Service, env);

        // The application bundle this stack owns. Created empty; consumers
        // reference fields by name.
        let app_secret = SecretSpec::app_bundle(env);
        let app_secret_key = graph.add_resource("secret", &app_secret.name, &app_secret)?;

        let cluster = ClusterSpec {
            name: format!("web-cluster-{env}"),
        };
        let cluster_key = graph.add_resource("cluster", &cluster.name, &cluster)?;
        graph.depends_on(&cluster_key, &shared.keys.network)?;

        let repository = RepositorySpec::new(format!("web-{env}"));
        let repository_key = graph.add_resource("repository", &repository.name, &repository)?;

        let task = Self::task_spec(env, shared, &app_secret, &repository, policy.log_retention_days);
        let service = ServiceSpec::new(env, &cluster.name, task);
        let service_key = graph.add_resource("service", &service.name, &service)?;
        graph.depends_on(&service_key, &cluster_key)?;
        graph.depends_on(&service_key, &repository_key)?;
        graph.depends_on(&service_key, &format!("security-group:application-{env}"))?;

        let load_balancer = LoadBalancerSpec::for_service(env, certificate_arn, CONTAINER_PORT);
        let alb_key = graph.add_resource("load-balancer", &load_balancer.name, &load_balancer)?;
        graph.depends_on(&alb_key, &shared.keys.network)?;
        graph.depends_on(&alb_key, &format!("security-group:load-balancer-{env}"))?;
        graph.depends_on(&alb_key, &service_key)?;

        graph.grant(&shared.keys.work_queue, &service_key, GrantAccess::Send)?;
        graph.grant(&shared.keys.db_secret, &service_key, GrantAccess::Read)?;
        graph.grant(&shared.keys.media_bucket, &service_key, GrantAccess::ReadWrite)?;
        // Field grants only: each credential stays individually revocable.
        if let SecretTemplate::External { fields } = &app_secret.template {
            for field in fields {
                graph.grant(
                    &app_secret_key,
                    &service_key,
                    GrantAccess::ReadField(field.clone()),
                )?;
            }
        }

        Ok(Self {
            app_secret,
            repository,
            cluster,
            service,
            load_balancer,
            key: service_key,
        })
    }

    fn task_spec(
        env: Environment,
        shared: &SharedStack,
        app_secret: &SecretSpec,
        repository: &RepositorySpec,
        log_retention_days: u32,
    ) -> TaskSpec {
        let mut environment = BTreeMap::new();
        environment.insert("APP_ENV".to_string(), env.to_string());
        environment.insert(
            "QUEUE_URL".to_string(),
            format!("${{queue:{}:url}}", shared.work_queue.name),
        );
        environment.insert("MEDIA_BUCKET".to_string(), shared.media_bucket.name.clone());

        let mut secrets = BTreeMap::new();
        secrets.insert(
            "DATABASE_URL".to_string(),
            TaskSecret {
                secret: shared.db_secret.name.clone(),
                scope: SecretScope::Full,
            },
        );
        if let SecretTemplate::External { fields } = &app_secret.template {
            for field in fields {
                secrets.insert(
                    field.to_uppercase(),
                    TaskSecret {
                        secret: app_secret.name.clone(),
                        scope: SecretScope::Field(field.clone()),
                    },
                );
            }
        }

        TaskSpec {
            cpu_units: 512,
            memory_mib: 1024,
            container_port: CONTAINER_PORT,
            image_repository: repository.name.clone(),
            image_tag: env.to_string(),
            log_stream_prefix: "web".to_string(),
            log_retention_days,
            environment,
            secrets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundwork_core::model::ListenerAction;

    fn certs() -> CertificateTable {
        let mut table = CertificateTable::new();
        table.insert(Environment::Dev, "arn:aws:acm:us-east-1:111:certificate/dev");
        table
    }

    fn built() -> (ResourceGraph, SharedStack, WebStack) {
        let env = Environment::Dev;
        let mut graph = ResourceGraph::new(env);
        let shared = SharedStack::build(env, &mut graph).unwrap();
        let web = WebStack::build(env, &shared, &certs(), &mut graph).unwrap();
        (graph, shared, web)
    }

    #[test]
    fn missing_certificate_leaves_the_graph_untouched() {
        let env = Environment::Dev;
        let mut graph = ResourceGraph::new(env);
        let shared = SharedStack::build(env, &mut graph).unwrap();
        let before = graph.len();

        let err = WebStack::build(env, &shared, &CertificateTable::new(), &mut graph).unwrap_err();
        assert!(err.to_string().contains("certificate"));
        assert_eq!(graph.len(), before);
    }

    #[test]
    fn rollouts_self_heal_and_scale_asymmetrically() {
        let (_, _, web) = built();
        assert!(web.service.circuit_breaker_rollback);
        assert_eq!(web.service.scaling.target_utilization_percent, 70);
        assert_eq!(web.service.scaling.scale_out_cooldown_secs, 120);
        assert_eq!(web.service.scaling.scale_in_cooldown_secs, 300);
    }

    #[test]
    fn plaintext_is_only_ever_redirected() {
        let (_, _, web) = built();
        for listener in &web.load_balancer.listeners {
            match listener.port {
                80 => assert_eq!(listener.action, ListenerAction::RedirectToHttps),
                443 => assert_eq!(
                    listener.action,
                    ListenerAction::ForwardToContainer {
                        port: CONTAINER_PORT
                    }
                ),
                other => panic!("unexpected listener port {other}"),
            }
        }
    }

    #[test]
    fn service_receives_each_bundle_field_individually() {
        let (graph, _, web) = built();
        let grants = graph.grants_for(&web.key);
        let field_grants: Vec<_> = grants
            .iter()
            .filter(|(_, a)| matches!(**a, GrantAccess::ReadField(_)))
            .collect();
        assert_eq!(field_grants.len(), 5);
        assert!(
            web.service.task.secrets.values().any(
                |s| s.scope == SecretScope::Field("base_url".to_string())
            )
        );
    }

    #[test]
    fn service_can_send_but_not_consume_work() {
        let (graph, shared, web) = built();
        let grants = graph.grants_for(&web.key);
        assert!(grants.iter().any(|(r, a)| *r == shared.keys.work_queue
            && **a == GrantAccess::Send));
        assert!(!grants.iter().any(|(_, a)| **a == GrantAccess::Consume));
    }
}
