//! Shared network/data layer.

use crate::error::Result;
use crate::graph::{GrantAccess, ResourceGraph};
use crate::network::AccessMatrix;
use groundwork_core::Environment;
use groundwork_core::model::{
    BastionSpec, BucketSpec, DatabaseSpec, NetworkSpec, QueueSpec, ReplicationLink, SecretSpec,
};

/// Outputs of the shared layer.
///
/// Composers receive this by shared reference and treat every handle as
/// read-only; all ingress rules were installed by the access-control builder
/// before any composer ran.
#[derive(Debug, Clone)]
pub struct SharedStack {
    pub env: Environment,
    pub network: NetworkSpec,
    pub access: AccessMatrix,
    pub db_secret: SecretSpec,
    pub database: DatabaseSpec,
    pub media_bucket: BucketSpec,
    pub media_backup_bucket: BucketSpec,
    pub artifact_bucket: BucketSpec,
    pub replication: ReplicationLink,
    pub work_queue: QueueSpec,
    pub dead_letter_queue: QueueSpec,
    pub bastion: BastionSpec,
    /// Graph keys for the composers to hang dependencies and grants on.
    pub keys: SharedKeys,
}

/// Graph keys of the shared resources.
#[derive(Debug, Clone)]
pub struct SharedKeys {
    pub network: String,
    pub db_secret: String,
    pub database: String,
    pub media_bucket: String,
    pub artifact_bucket: String,
    pub work_queue: String,
}

impl SharedStack {
    pub fn build(env: Environment, graph: &mut ResourceGraph) -> Result<Self> {
        // Network and access control first; everything else hangs off them.
        let network = NetworkSpec::for_environment(env);
        let network_key = graph.add_resource("network", &network.name, &network)?;

        let access = AccessMatrix::build();
        access.verify()?;
        for group in access.iter() {
            let key = graph.add_resource(
                "security-group",
                &format!("{}-{env}", group.role),
                group,
            )?;
            graph.depends_on(&key, &network_key)?;
        }

        // Credentials before the database that uses them.
        let db_secret = SecretSpec::db_credentials(env);
        let db_secret_key = graph.add_resource("secret", &db_secret.name, &db_secret)?;

        let database = DatabaseSpec::for_environment(env, &db_secret.name);
        let database_key = graph.add_resource("database", &database.name, &database)?;
        graph.depends_on(&database_key, &db_secret_key)?;
        graph.depends_on(&database_key, &network_key)?;
        graph.depends_on(&database_key, &format!("security-group:database-{env}"))?;

        // Buckets and the replication pair. The link node only declares the
        // relationship; the ordered configuration runs in the provisioning
        // workflow after the buckets exist.
        let media_bucket = BucketSpec::data_bucket(format!("media-{env}"), env);
        let media_key = graph.add_resource("bucket", &media_bucket.name, &media_bucket)?;

        let media_backup_bucket = BucketSpec::data_bucket(format!("media-backup-{env}"), env);
        let backup_key =
            graph.add_resource("bucket", &media_backup_bucket.name, &media_backup_bucket)?;

        let replication = ReplicationLink::new(env, &media_bucket, &media_backup_bucket);
        let replication_key =
            graph.add_resource("replication-link", &replication.role_name, &replication)?;
        graph.depends_on(&replication_key, &media_key)?;
        graph.depends_on(&replication_key, &backup_key)?;

        let artifact_bucket = BucketSpec::artifact_bucket(format!("artifacts-{env}"));
        let artifact_key =
            graph.add_resource("bucket", &artifact_bucket.name, &artifact_bucket)?;

        // Queues: the DLQ must exist before the primary that redrives to it.
        let dead_letter_queue = QueueSpec::dead_letter(env);
        let dlq_key = graph.add_resource("queue", &dead_letter_queue.name, &dead_letter_queue)?;

        let work_queue = QueueSpec::work_queue(env, &dead_letter_queue);
        let queue_key = graph.add_resource("queue", &work_queue.name, &work_queue)?;
        graph.depends_on(&queue_key, &dlq_key)?;

        // Operator access path.
        let bastion = BastionSpec::new(format!("bastion-{env}"));
        let bastion_key = graph.add_resource("bastion", &bastion.name, &bastion)?;
        graph.depends_on(&bastion_key, &network_key)?;
        graph.depends_on(&bastion_key, &format!("security-group:bastion-{env}"))?;
        graph.grant(&db_secret_key, &bastion_key, GrantAccess::Read)?;

        graph.output("media_bucket", &media_bucket.name);
        graph.output("bastion", &bastion.name);

        Ok(Self {
            env,
            network,
            access,
            db_secret,
            database,
            media_bucket,
            media_backup_bucket,
            artifact_bucket,
            replication,
            work_queue,
            dead_letter_queue,
            bastion,
            keys: SharedKeys {
                network: network_key,
                db_secret: db_secret_key,
                database: database_key,
                media_bucket: media_key,
                artifact_bucket: artifact_key,
                work_queue: queue_key,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundwork_core::RemovalPolicy;

    #[test]
    fn building_twice_into_one_graph_adds_nothing() {
        let mut graph = ResourceGraph::new(Environment::Dev);
        SharedStack::build(Environment::Dev, &mut graph).unwrap();
        let count = graph.len();

        SharedStack::build(Environment::Dev, &mut graph).unwrap();
        assert_eq!(graph.len(), count);
    }

    #[test]
    fn replication_link_depends_on_both_buckets() {
        let mut graph = ResourceGraph::new(Environment::Prod);
        let shared = SharedStack::build(Environment::Prod, &mut graph).unwrap();

        let batch = graph.to_batch();
        let link = batch
            .resources
            .iter()
            .find(|r| r.resource_type == "replication-link")
            .unwrap();
        assert!(link.depends_on.contains(&shared.keys.media_bucket));
        assert!(
            link.depends_on
                .contains(&format!("bucket:{}", shared.media_backup_bucket.name))
        );
    }

    #[test]
    fn prod_shared_layer_is_fully_retained() {
        let mut graph = ResourceGraph::new(Environment::Prod);
        let shared = SharedStack::build(Environment::Prod, &mut graph).unwrap();
        assert_eq!(shared.network.removal_policy, RemovalPolicy::Retain);
        assert_eq!(shared.database.removal_policy, RemovalPolicy::Retain);
        assert_eq!(shared.media_bucket.removal_policy, RemovalPolicy::Retain);
    }

    #[test]
    fn bastion_reads_the_database_credentials() {
        let mut graph = ResourceGraph::new(Environment::Dev);
        let shared = SharedStack::build(Environment::Dev, &mut graph).unwrap();

        let grants = graph.grants_for(&format!("bastion:{}", shared.bastion.name));
        assert!(
            grants
                .iter()
                .any(|(resource, access)| *resource == shared.keys.db_secret
                    && **access == GrantAccess::Read)
        );
    }
}
