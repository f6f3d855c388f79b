//! Environment-conditioned sizing policy.
//!
//! The one place where dev and prod diverge. Every resource constructor
//! consults this table instead of branching on the environment at the call
//! site, which keeps the divergence auditable and exhaustively testable.

use crate::environment::Environment;
use serde::{Deserialize, Serialize};

/// Resource families covered by the policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Network,
    Database,
    Bucket,
    Queue,
    ComputeUnit,
    Service,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Network,
        ResourceKind::Database,
        ResourceKind::Bucket,
        ResourceKind::Queue,
        ResourceKind::ComputeUnit,
        ResourceKind::Service,
    ];
}

/// What happens to a resource when its stack is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Deleted with the stack.
    Destroy,
    /// Left in place indefinitely. A teardown run must skip the resource.
    Retain,
}

impl RemovalPolicy {
    /// The blanket removal policy for the environment, applied to every
    /// resource whose spec does not carry a policy of its own.
    pub fn for_environment(env: Environment) -> RemovalPolicy {
        match env {
            Environment::Dev => RemovalPolicy::Destroy,
            Environment::Prod => RemovalPolicy::Retain,
        }
    }
}

/// Resolved policy for one (resource kind, environment) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizingPolicy {
    /// Instance/task shape identifier, kind-specific.
    pub size_class: &'static str,
    pub multi_az: bool,
    pub deletion_protection: bool,
    pub public_access: bool,
    pub backup_retention_days: u32,
    pub noncurrent_version_expiry_days: u32,
    pub log_retention_days: u32,
    pub removal_policy: RemovalPolicy,
}

impl SizingPolicy {
    /// Resolve the policy for a resource kind in an environment.
    ///
    /// Total over both enums: adding an environment without extending the
    /// matches below is a compile error, which together with the fail-closed
    /// parse in [`Environment`] means no call site can observe a defaulted
    /// policy.
    pub fn lookup(kind: ResourceKind, env: Environment) -> SizingPolicy {
        let removal_policy = RemovalPolicy::for_environment(env);
        let noncurrent_version_expiry_days = match env {
            Environment::Dev => 7,
            Environment::Prod => 90,
        };
        let log_retention_days = match env {
            Environment::Dev => 7,
            Environment::Prod => 30,
        };

        match kind {
            ResourceKind::Database => SizingPolicy {
                size_class: match env {
                    Environment::Dev => "db.t3.micro",
                    Environment::Prod => "db.m5.large",
                },
                // Multi-AZ in prod is an explicit reviewed choice, not derived
                // from the removal policy. Change this row, not a call site.
                multi_az: match env {
                    Environment::Dev => false,
                    Environment::Prod => true,
                },
                deletion_protection: env.is_prod(),
                // Dev databases stay publicly reachable so developers can
                // connect without the bastion.
                public_access: !env.is_prod(),
                backup_retention_days: 7,
                noncurrent_version_expiry_days,
                log_retention_days,
                removal_policy,
            },
            ResourceKind::Network
            | ResourceKind::Bucket
            | ResourceKind::Queue
            | ResourceKind::ComputeUnit
            | ResourceKind::Service => SizingPolicy {
                size_class: match kind {
                    ResourceKind::ComputeUnit => "512mb",
                    ResourceKind::Service => "0.5vcpu-1gb",
                    _ => "standard",
                },
                multi_az: false,
                deletion_protection: false,
                public_access: false,
                backup_retention_days: 7,
                noncurrent_version_expiry_days,
                log_retention_days,
                removal_policy,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_total_and_deterministic() {
        for kind in ResourceKind::ALL {
            for env in Environment::ALL {
                let first = SizingPolicy::lookup(kind, env);
                let second = SizingPolicy::lookup(kind, env);
                assert_eq!(first, second, "{kind:?}/{env}");
            }
        }
    }

    #[test]
    fn dev_database_is_open_and_disposable() {
        let policy = SizingPolicy::lookup(ResourceKind::Database, Environment::Dev);
        assert_eq!(policy.size_class, "db.t3.micro");
        assert!(policy.public_access);
        assert!(!policy.deletion_protection);
        assert!(!policy.multi_az);
        assert_eq!(policy.removal_policy, RemovalPolicy::Destroy);
    }

    #[test]
    fn prod_database_is_locked_down_and_retained() {
        let policy = SizingPolicy::lookup(ResourceKind::Database, Environment::Prod);
        assert_eq!(policy.size_class, "db.m5.large");
        assert!(!policy.public_access);
        assert!(policy.deletion_protection);
        assert!(policy.multi_az);
        assert_eq!(policy.removal_policy, RemovalPolicy::Retain);
    }

    #[test]
    fn bucket_version_expiry_diverges_by_environment() {
        let dev = SizingPolicy::lookup(ResourceKind::Bucket, Environment::Dev);
        let prod = SizingPolicy::lookup(ResourceKind::Bucket, Environment::Prod);
        assert_eq!(dev.noncurrent_version_expiry_days, 7);
        assert_eq!(prod.noncurrent_version_expiry_days, 90);
    }

    #[test]
    fn log_retention_diverges_by_environment() {
        let dev = SizingPolicy::lookup(ResourceKind::Service, Environment::Dev);
        let prod = SizingPolicy::lookup(ResourceKind::Service, Environment::Prod);
        assert_eq!(dev.log_retention_days, 7);
        assert_eq!(prod.log_retention_days, 30);
    }
}
