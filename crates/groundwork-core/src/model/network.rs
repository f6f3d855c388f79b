//! Network and security-group model.

use crate::environment::Environment;
use crate::policy::{RemovalPolicy, ResourceKind, SizingPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Security-group roles in the topology.
///
/// Roles are a closed set; every ingress permission is keyed by a pair of
/// them (or by [`IngressPeer::AnyIpv4`] for the public listener ports).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SecurityGroupRole {
    Application,
    Worker,
    Database,
    LoadBalancer,
    Bastion,
}

impl SecurityGroupRole {
    pub const ALL: [SecurityGroupRole; 5] = [
        SecurityGroupRole::Application,
        SecurityGroupRole::Worker,
        SecurityGroupRole::Database,
        SecurityGroupRole::LoadBalancer,
        SecurityGroupRole::Bastion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityGroupRole::Application => "application",
            SecurityGroupRole::Worker => "worker",
            SecurityGroupRole::Database => "database",
            SecurityGroupRole::LoadBalancer => "load-balancer",
            SecurityGroupRole::Bastion => "bastion",
        }
    }
}

impl fmt::Display for SecurityGroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
}

/// Peer allowed to initiate a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngressPeer {
    /// Another security-group role in the topology.
    Role(SecurityGroupRole),
    /// Any IPv4 address.
    AnyIpv4,
}

/// One directional ingress permission.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IngressRule {
    pub peer: IngressPeer,
    pub port: u16,
    pub protocol: Protocol,
    pub description: String,
}

impl IngressRule {
    pub fn tcp(peer: IngressPeer, port: u16, description: impl Into<String>) -> Self {
        Self {
            peer,
            port,
            protocol: Protocol::Tcp,
            description: description.into(),
        }
    }
}

/// A security group: one role plus its ingress permission set.
///
/// Ingress rules live in a set, so installing the same rule twice is a no-op
/// rather than an accumulated duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupSpec {
    pub role: SecurityGroupRole,
    pub allow_all_outbound: bool,
    pub ingress: BTreeSet<IngressRule>,
}

impl SecurityGroupSpec {
    pub fn new(role: SecurityGroupRole) -> Self {
        Self {
            role,
            // The database group is the narrowest-privilege node: no
            // unsolicited egress either.
            allow_all_outbound: role != SecurityGroupRole::Database,
            ingress: BTreeSet::new(),
        }
    }

    /// Install an ingress rule. Idempotent.
    pub fn allow(&mut self, rule: IngressRule) {
        self.ingress.insert(rule);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetTier {
    Public,
    PrivateWithEgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetSpec {
    pub name: String,
    pub tier: SubnetTier,
    pub cidr_mask: u8,
}

/// One address space across two availability zones, each split into a public
/// and a private-with-egress tier. Created once per environment and never
/// destroyed in prod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    pub max_azs: u8,
    pub nat_gateways: u8,
    pub subnets: Vec<SubnetSpec>,
    pub removal_policy: RemovalPolicy,
}

impl NetworkSpec {
    pub fn for_environment(env: Environment) -> Self {
        let policy = SizingPolicy::lookup(ResourceKind::Network, env);
        Self {
            name: format!("shared-vpc-{env}"),
            max_azs: 2,
            nat_gateways: 1,
            subnets: vec![
                SubnetSpec {
                    name: "public".to_string(),
                    tier: SubnetTier::Public,
                    cidr_mask: 24,
                },
                SubnetSpec {
                    name: "private".to_string(),
                    tier: SubnetTier::PrivateWithEgress,
                    cidr_mask: 24,
                },
            ],
            removal_policy: policy.removal_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_ingress_rules_do_not_accumulate() {
        let mut group = SecurityGroupSpec::new(SecurityGroupRole::Database);
        let rule = IngressRule::tcp(
            IngressPeer::Role(SecurityGroupRole::Application),
            5432,
            "application to database",
        );
        group.allow(rule.clone());
        group.allow(rule);
        assert_eq!(group.ingress.len(), 1);
    }

    #[test]
    fn database_group_has_no_open_egress() {
        assert!(!SecurityGroupSpec::new(SecurityGroupRole::Database).allow_all_outbound);
        assert!(SecurityGroupSpec::new(SecurityGroupRole::Application).allow_all_outbound);
    }

    #[test]
    fn network_spans_two_azs_with_both_tiers() {
        let net = NetworkSpec::for_environment(Environment::Prod);
        assert_eq!(net.max_azs, 2);
        assert_eq!(net.subnets.len(), 2);
        assert_eq!(net.removal_policy, RemovalPolicy::Retain);
    }
}
