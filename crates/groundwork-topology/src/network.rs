//! Access-control matrix builder.
//!
//! The ingress matrix is a static, reviewable table, not something inferred
//! from consumer declarations. All five roles are constructed before a single
//! rule is installed, and rule installation is set-based, so re-invocation
//! cannot accumulate duplicates and no rule can reference a role that does
//! not exist yet.

use crate::error::{Result, TopologyError};
use groundwork_core::model::{IngressPeer, IngressRule, SecurityGroupRole, SecurityGroupSpec};

/// The fixed ingress-permission table.
///
/// (target role, peer, port). The database row set is the contract: exactly
/// application, worker, and bastion on 5432, nothing else.
const MATRIX: &[(SecurityGroupRole, IngressPeer, u16, &str)] = &[
    (
        SecurityGroupRole::Database,
        IngressPeer::Role(SecurityGroupRole::Application),
        5432,
        "application to database",
    ),
    (
        SecurityGroupRole::Database,
        IngressPeer::Role(SecurityGroupRole::Worker),
        5432,
        "worker to database",
    ),
    (
        SecurityGroupRole::Database,
        IngressPeer::Role(SecurityGroupRole::Bastion),
        5432,
        "bastion to database",
    ),
    (
        SecurityGroupRole::Application,
        IngressPeer::Role(SecurityGroupRole::LoadBalancer),
        3000,
        "load balancer to service",
    ),
    (
        SecurityGroupRole::LoadBalancer,
        IngressPeer::AnyIpv4,
        80,
        "public http redirect",
    ),
    (
        SecurityGroupRole::LoadBalancer,
        IngressPeer::AnyIpv4,
        443,
        "public https",
    ),
];

/// The five security-group roles with their installed ingress sets.
///
/// Handles are immutable once built; composers only read them. All ingress
/// installation happens here, before any composer runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessMatrix {
    application: SecurityGroupSpec,
    worker: SecurityGroupSpec,
    database: SecurityGroupSpec,
    load_balancer: SecurityGroupSpec,
    bastion: SecurityGroupSpec,
}

impl AccessMatrix {
    /// Construct all roles, then install the matrix. Idempotent by
    /// construction: building twice yields an identical value.
    pub fn build() -> Self {
        let mut matrix = Self {
            application: SecurityGroupSpec::new(SecurityGroupRole::Application),
            worker: SecurityGroupSpec::new(SecurityGroupRole::Worker),
            database: SecurityGroupSpec::new(SecurityGroupRole::Database),
            load_balancer: SecurityGroupSpec::new(SecurityGroupRole::LoadBalancer),
            bastion: SecurityGroupSpec::new(SecurityGroupRole::Bastion),
        };

        for (target, peer, port, description) in MATRIX {
            matrix
                .role_mut(*target)
                .allow(IngressRule::tcp(*peer, *port, *description));
        }
        matrix
    }

    pub fn role(&self, role: SecurityGroupRole) -> &SecurityGroupSpec {
        match role {
            SecurityGroupRole::Application => &self.application,
            SecurityGroupRole::Worker => &self.worker,
            SecurityGroupRole::Database => &self.database,
            SecurityGroupRole::LoadBalancer => &self.load_balancer,
            SecurityGroupRole::Bastion => &self.bastion,
        }
    }

    fn role_mut(&mut self, role: SecurityGroupRole) -> &mut SecurityGroupSpec {
        match role {
            SecurityGroupRole::Application => &mut self.application,
            SecurityGroupRole::Worker => &mut self.worker,
            SecurityGroupRole::Database => &mut self.database,
            SecurityGroupRole::LoadBalancer => &mut self.load_balancer,
            SecurityGroupRole::Bastion => &mut self.bastion,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SecurityGroupSpec> {
        [
            &self.application,
            &self.worker,
            &self.database,
            &self.load_balancer,
            &self.bastion,
        ]
        .into_iter()
    }

    /// Check the narrowest-privilege invariant: the database role admits
    /// exactly {application, worker, bastion} on 5432 and nothing else.
    pub fn verify(&self) -> Result<()> {
        let expected = [
            SecurityGroupRole::Application,
            SecurityGroupRole::Worker,
            SecurityGroupRole::Bastion,
        ];

        let ingress = &self.database.ingress;
        let peers: Vec<_> = ingress.iter().map(|r| r.peer).collect();

        let exact = ingress.len() == expected.len()
            && expected
                .iter()
                .all(|role| peers.contains(&IngressPeer::Role(*role)))
            && ingress.iter().all(|r| r.port == 5432);

        if exact {
            Ok(())
        } else {
            Err(TopologyError::MatrixViolation(format!(
                "database ingress must be exactly application/worker/bastion on 5432, got {ingress:?}"
            )))
        }
    }
}
