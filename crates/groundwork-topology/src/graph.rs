//! Declarative resource graph.
//!
//! The graph is what the composers produce and the reconciliation engine
//! consumes. All collections are ordered sets/maps: re-declaring an identical
//! resource, edge, or grant is a no-op, so building the same topology twice
//! cannot accumulate duplicates, and serialization is deterministic.

use crate::error::{Result, TopologyError};
use groundwork_core::Environment;
use groundwork_cloud::{GrantDecl, ResourceBatch, ResourceDecl};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Access level of a grant edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum GrantAccess {
    Read,
    ReadWrite,
    Consume,
    Send,
    /// Read of one named secret field only.
    ReadField(String),
}

impl fmt::Display for GrantAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantAccess::Read => write!(f, "read"),
            GrantAccess::ReadWrite => write!(f, "read-write"),
            GrantAccess::Consume => write!(f, "consume"),
            GrantAccess::Send => write!(f, "send"),
            GrantAccess::ReadField(field) => write!(f, "read-field:{field}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ResourceEntry {
    resource_type: String,
    id: String,
    spec: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GrantEdge {
    resource: String,
    grantee: String,
    access: GrantAccess,
}

/// The assembled graph for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGraph {
    env: Environment,
    resources: BTreeMap<String, ResourceEntry>,
    edges: BTreeSet<(String, String)>,
    grants: BTreeSet<GrantEdge>,
    outputs: BTreeMap<String, String>,
}

impl ResourceGraph {
    pub fn new(env: Environment) -> Self {
        Self {
            env,
            resources: BTreeMap::new(),
            edges: BTreeSet::new(),
            grants: BTreeSet::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.env
    }

    /// Declare a resource, returning its key. Re-declaring an identical spec
    /// is a no-op; a differing spec under the same key is rejected.
    pub fn add_resource(
        &mut self,
        resource_type: &str,
        id: &str,
        spec: &impl Serialize,
    ) -> Result<String> {
        let key = format!("{resource_type}:{id}");
        let entry = ResourceEntry {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
            spec: serde_json::to_value(spec)?,
        };

        match self.resources.get(&key) {
            None => {
                tracing::debug!("Declared {key}");
                self.resources.insert(key.clone(), entry);
            }
            Some(existing) if *existing == entry => {
                tracing::debug!("{key} already declared, skipping");
            }
            Some(_) => return Err(TopologyError::ConflictingResource(key)),
        }
        Ok(key)
    }

    /// Declare that `from` depends on `to`. Both endpoints must already be
    /// declared: the engine's topological sort needs complete edges, and a
    /// dangling reference here is a composition bug, not an engine concern.
    pub fn depends_on(&mut self, from: &str, to: &str) -> Result<()> {
        for key in [from, to] {
            if !self.resources.contains_key(key) {
                return Err(TopologyError::UnknownResource(key.to_string()));
            }
        }
        self.edges.insert((from.to_string(), to.to_string()));
        Ok(())
    }

    /// Grant a consumer access to a declared resource. Grantor and grantee
    /// must both exist before the grant.
    pub fn grant(&mut self, resource: &str, grantee: &str, access: GrantAccess) -> Result<()> {
        for key in [resource, grantee] {
            if !self.resources.contains_key(key) {
                return Err(TopologyError::UnknownResource(key.to_string()));
            }
        }
        self.grants.insert(GrantEdge {
            resource: resource.to_string(),
            grantee: grantee.to_string(),
            access,
        });
        Ok(())
    }

    /// Grant access to a resource referenced by stable name rather than by a
    /// declared handle. The one legitimate use is a late-bound secret whose
    /// producer has not run yet; everything else should go through
    /// [`grant`](Self::grant).
    pub fn grant_by_name(
        &mut self,
        resource_name: &str,
        grantee: &str,
        access: GrantAccess,
    ) -> Result<()> {
        if !self.resources.contains_key(grantee) {
            return Err(TopologyError::UnknownResource(grantee.to_string()));
        }
        tracing::debug!("Late-bound grant on {resource_name} for {grantee}");
        self.grants.insert(GrantEdge {
            resource: resource_name.to_string(),
            grantee: grantee.to_string(),
            access,
        });
        Ok(())
    }

    pub fn output(&mut self, name: &str, value: impl Into<String>) {
        self.outputs.insert(name.to_string(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.resources.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Grants held by a consumer, as (resource, access) pairs.
    pub fn grants_for(&self, grantee: &str) -> Vec<(&str, &GrantAccess)> {
        self.grants
            .iter()
            .filter(|g| g.grantee == grantee)
            .map(|g| (g.resource.as_str(), &g.access))
            .collect()
    }

    /// Serialize into the batch handed to the reconciliation engine.
    pub fn to_batch(&self) -> ResourceBatch {
        let mut batch = ResourceBatch::new(self.env.as_str());
        for (key, entry) in &self.resources {
            let mut decl =
                ResourceDecl::new(&entry.resource_type, &entry.id, entry.spec.clone());
            decl.depends_on = self
                .edges
                .iter()
                .filter(|(from, _)| from == key)
                .map(|(_, to)| to.clone())
                .collect();
            batch.resources.push(decl);
        }
        for grant in &self.grants {
            batch.grants.push(GrantDecl {
                resource: grant.resource.clone(),
                grantee: grant.grantee.clone(),
                access: grant.access.to_string(),
            });
        }
        for (name, value) in &self.outputs {
            batch.outputs.push((name.clone(), value.clone()));
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph() -> ResourceGraph {
        ResourceGraph::new(Environment::Dev)
    }

    #[test]
    fn identical_redeclaration_is_a_noop() {
        let mut g = graph();
        g.add_resource("bucket", "media-dev", &json!({"versioned": true}))
            .unwrap();
        g.add_resource("bucket", "media-dev", &json!({"versioned": true}))
            .unwrap();
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn conflicting_redeclaration_is_rejected() {
        let mut g = graph();
        g.add_resource("bucket", "media-dev", &json!({"versioned": true}))
            .unwrap();
        let err = g
            .add_resource("bucket", "media-dev", &json!({"versioned": false}))
            .unwrap_err();
        assert!(matches!(err, TopologyError::ConflictingResource(_)));
    }

    #[test]
    fn edges_require_both_endpoints() {
        let mut g = graph();
        let bucket = g.add_resource("bucket", "media-dev", &json!({})).unwrap();
        let err = g.depends_on(&bucket, "network:missing").unwrap_err();
        assert!(matches!(err, TopologyError::UnknownResource(_)));
    }

    #[test]
    fn grants_require_grantor_and_grantee() {
        let mut g = graph();
        let secret = g.add_resource("secret", "db", &json!({})).unwrap();
        let err = g
            .grant(&secret, "compute:missing", GrantAccess::Read)
            .unwrap_err();
        assert!(matches!(err, TopologyError::UnknownResource(_)));
    }

    #[test]
    fn duplicate_grants_do_not_accumulate() {
        let mut g = graph();
        let secret = g.add_resource("secret", "db", &json!({})).unwrap();
        let consumer = g.add_resource("compute", "worker", &json!({})).unwrap();
        g.grant(&secret, &consumer, GrantAccess::Read).unwrap();
        g.grant(&secret, &consumer, GrantAccess::Read).unwrap();
        assert_eq!(g.grants_for(&consumer).len(), 1);
    }

    #[test]
    fn batch_serialization_is_deterministic() {
        let build = || {
            let mut g = graph();
            let queue = g.add_resource("queue", "work", &json!({})).unwrap();
            let worker = g.add_resource("compute", "worker", &json!({})).unwrap();
            g.depends_on(&worker, &queue).unwrap();
            g.grant(&queue, &worker, GrantAccess::Consume).unwrap();
            g.output("queue", "work");
            serde_json::to_string(&g.to_batch()).unwrap()
        };
        assert_eq!(build(), build());
    }
}
