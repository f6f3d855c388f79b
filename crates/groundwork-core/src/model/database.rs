//! Managed relational database model.

use crate::environment::Environment;
use crate::model::network::SecurityGroupRole;
use crate::policy::{RemovalPolicy, ResourceKind, SizingPolicy};
use serde::{Deserialize, Serialize};

/// A managed Postgres instance bound to the database security group.
///
/// Sizing, exposure, and durability all come from the policy table; the
/// constructor adds nothing environment-conditional of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSpec {
    pub name: String,
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    pub allocated_storage_gib: u32,
    pub max_allocated_storage_gib: u32,
    pub storage_type: String,
    pub multi_az: bool,
    pub deletion_protection: bool,
    pub publicly_accessible: bool,
    pub backup_retention_days: u32,
    /// Name of the generated credential secret.
    pub credentials_secret: String,
    pub security_group: SecurityGroupRole,
    pub removal_policy: RemovalPolicy,
}

impl DatabaseSpec {
    pub fn for_environment(env: Environment, credentials_secret: impl Into<String>) -> Self {
        let policy = SizingPolicy::lookup(ResourceKind::Database, env);
        Self {
            name: format!("shared-db-{env}"),
            engine: "postgres".to_string(),
            engine_version: "17.4".to_string(),
            instance_class: policy.size_class.to_string(),
            allocated_storage_gib: 20,
            max_allocated_storage_gib: 100,
            storage_type: "gp3".to_string(),
            multi_az: policy.multi_az,
            deletion_protection: policy.deletion_protection,
            publicly_accessible: policy.public_access,
            backup_retention_days: policy.backup_retention_days,
            credentials_secret: credentials_secret.into(),
            security_group: SecurityGroupRole::Database,
            removal_policy: policy.removal_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_and_prod_diverge_on_all_three_policy_axes() {
        let dev = DatabaseSpec::for_environment(Environment::Dev, "s");
        assert!(dev.publicly_accessible);
        assert!(!dev.deletion_protection);
        assert_eq!(dev.removal_policy, RemovalPolicy::Destroy);

        let prod = DatabaseSpec::for_environment(Environment::Prod, "s");
        assert!(!prod.publicly_accessible);
        assert!(prod.deletion_protection);
        assert_eq!(prod.removal_policy, RemovalPolicy::Retain);
    }

    #[test]
    fn database_always_sits_behind_the_database_group() {
        for env in Environment::ALL {
            let spec = DatabaseSpec::for_environment(env, "s");
            assert_eq!(spec.security_group, SecurityGroupRole::Database);
            assert_eq!(spec.engine, "postgres");
        }
    }
}
