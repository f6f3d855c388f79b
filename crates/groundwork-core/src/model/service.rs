//! Container service, load balancer, and scaling model.

use crate::environment::Environment;
use crate::model::network::SecurityGroupRole;
use crate::model::secret::SecretScope;
use crate::policy::RemovalPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub name: String,
}

/// Container image registry, always retained: old tags back rollbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySpec {
    pub name: String,
    pub removal_policy: RemovalPolicy,
}

impl RepositorySpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            removal_policy: RemovalPolicy::Retain,
        }
    }
}

/// One secret field (or whole secret) injected into the task environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSecret {
    pub secret: String,
    pub scope: SecretScope,
}

/// Container task shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub cpu_units: u32,
    pub memory_mib: u32,
    pub container_port: u16,
    pub image_repository: String,
    pub image_tag: String,
    pub log_stream_prefix: String,
    pub log_retention_days: u32,
    pub environment: BTreeMap<String, String>,
    /// Env-var name to injected secret field.
    pub secrets: BTreeMap<String, TaskSecret>,
}

/// CPU-target scaling with asymmetric cooldowns: capacity is added faster
/// than it is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuScalingSpec {
    pub target_utilization_percent: u32,
    pub scale_out_cooldown_secs: u32,
    pub scale_in_cooldown_secs: u32,
}

impl Default for CpuScalingSpec {
    fn default() -> Self {
        Self {
            target_utilization_percent: 70,
            scale_out_cooldown_secs: 2 * 60,
            scale_in_cooldown_secs: 5 * 60,
        }
    }
}

/// The auto-scaling container service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    pub cluster: String,
    pub task: TaskSpec,
    pub desired_count: u32,
    pub max_count: u32,
    pub scaling: CpuScalingSpec,
    /// A failed rollout reverts to the last healthy revision automatically.
    pub circuit_breaker_rollback: bool,
    pub assign_public_ip: bool,
    pub security_group: SecurityGroupRole,
}

impl ServiceSpec {
    pub fn new(env: Environment, cluster: impl Into<String>, task: TaskSpec) -> Self {
        Self {
            name: format!("web-service-{env}"),
            cluster: cluster.into(),
            task,
            desired_count: 0,
            max_count: 4,
            scaling: CpuScalingSpec::default(),
            circuit_breaker_rollback: true,
            assign_public_ip: false,
            security_group: SecurityGroupRole::Application,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckSpec {
    pub path: String,
    pub interval_secs: u32,
}

impl Default for HealthCheckSpec {
    fn default() -> Self {
        Self {
            path: "/health".to_string(),
            interval_secs: 30,
        }
    }
}

/// What a listener does with accepted traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum ListenerAction {
    /// Permanent redirect to the TLS listener. The only thing plaintext is
    /// ever used for.
    RedirectToHttps,
    /// Forward to the service instances by container port.
    ForwardToContainer { port: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerSpec {
    pub port: u16,
    pub tls_certificate: Option<String>,
    pub action: ListenerAction,
}

/// Internet-facing load balancer fronting the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerSpec {
    pub name: String,
    pub internet_facing: bool,
    pub security_group: SecurityGroupRole,
    pub listeners: Vec<ListenerSpec>,
    pub health_check: HealthCheckSpec,
}

impl LoadBalancerSpec {
    /// The fixed listener pair: 80 redirects, 443 terminates TLS and
    /// forwards to the container port.
    pub fn for_service(
        env: Environment,
        certificate_arn: impl Into<String>,
        container_port: u16,
    ) -> Self {
        Self {
            name: format!("web-alb-{env}"),
            internet_facing: true,
            security_group: SecurityGroupRole::LoadBalancer,
            listeners: vec![
                ListenerSpec {
                    port: 80,
                    tls_certificate: None,
                    action: ListenerAction::RedirectToHttps,
                },
                ListenerSpec {
                    port: 443,
                    tls_certificate: Some(certificate_arn.into()),
                    action: ListenerAction::ForwardToContainer {
                        port: container_port,
                    },
                },
            ],
            health_check: HealthCheckSpec::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> TaskSpec {
        TaskSpec {
            cpu_units: 512,
            memory_mib: 1024,
            container_port: 3000,
            image_repository: "web-dev".to_string(),
            image_tag: "dev".to_string(),
            log_stream_prefix: "web".to_string(),
            log_retention_days: 7,
            environment: BTreeMap::new(),
            secrets: BTreeMap::new(),
        }
    }

    #[test]
    fn scaling_favors_availability_over_cost() {
        let scaling = CpuScalingSpec::default();
        assert_eq!(scaling.target_utilization_percent, 70);
        assert!(scaling.scale_out_cooldown_secs < scaling.scale_in_cooldown_secs);
    }

    #[test]
    fn rollout_failures_roll_back_automatically() {
        let service = ServiceSpec::new(Environment::Prod, "web-cluster-prod", task());
        assert!(service.circuit_breaker_rollback);
        assert_eq!(service.desired_count, 0);
        assert_eq!(service.max_count, 4);
    }

    #[test]
    fn plaintext_listener_only_redirects() {
        let alb = LoadBalancerSpec::for_service(Environment::Dev, "arn:cert", 3000);
        let http = alb.listeners.iter().find(|l| l.port == 80).unwrap();
        assert_eq!(http.action, ListenerAction::RedirectToHttps);
        assert!(http.tls_certificate.is_none());

        let https = alb.listeners.iter().find(|l| l.port == 443).unwrap();
        assert_eq!(
            https.action,
            ListenerAction::ForwardToContainer { port: 3000 }
        );
        assert!(https.tls_certificate.is_some());
    }

    #[test]
    fn health_check_polls_fixed_path() {
        let hc = HealthCheckSpec::default();
        assert_eq!(hc.path, "/health");
        assert_eq!(hc.interval_secs, 30);
    }
}
