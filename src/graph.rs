//! Resource graph model and the builder seam that produces it.
//!
//! A [`ResourceNode`] tree is what the provisioning engine consumes. The
//! shape mirrors the engine's own model closely enough to serialise directly:
//! each node has a logical id, a resource kind, free-form properties, tags,
//! and nested children.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::config::{RemovalPolicy, StackProps};
use crate::tags::{TagSet, Taggable};

mod vector_stack;

pub use vector_stack::VectorStackBuilder;

/// Resource types declared by this crate, serialised as engine type names.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum ResourceKind {
    /// Root of a stack.
    #[serde(rename = "Stack")]
    Stack,
    /// Existing VPC looked up by id.
    #[serde(rename = "AWS::EC2::VPC::Import")]
    ImportedVpc,
    /// Existing subnet looked up by id.
    #[serde(rename = "AWS::EC2::Subnet::Import")]
    ImportedSubnet,
    /// Security group.
    #[serde(rename = "AWS::EC2::SecurityGroup")]
    SecurityGroup,
    /// Ingress rule attached to a security group.
    #[serde(rename = "AWS::EC2::SecurityGroupIngress")]
    SecurityGroupIngress,
    /// Customer managed encryption key.
    #[serde(rename = "AWS::KMS::Key")]
    KmsKey,
    /// Secrets Manager secret.
    #[serde(rename = "AWS::SecretsManager::Secret")]
    Secret,
    /// IAM role.
    #[serde(rename = "AWS::IAM::Role")]
    IamRole,
    /// Subnet group for the database cluster.
    #[serde(rename = "AWS::RDS::DBSubnetGroup")]
    DbSubnetGroup,
    /// Aurora database cluster.
    #[serde(rename = "AWS::RDS::DBCluster")]
    DbCluster,
    /// Database instance inside a cluster.
    #[serde(rename = "AWS::RDS::DBInstance")]
    DbInstance,
    /// Aurora Limitless shard group.
    #[serde(rename = "AWS::RDS::DBShardGroup")]
    DbShardGroup,
    /// Serverless function.
    #[serde(rename = "AWS::Lambda::Function")]
    Function,
    /// Permission allowing a principal to invoke a function.
    #[serde(rename = "AWS::Lambda::Permission")]
    FunctionPermission,
    /// Event rule routing infrastructure events to targets.
    #[serde(rename = "AWS::Events::Rule")]
    EventRule,
    /// Stack output value.
    #[serde(rename = "Output")]
    Output,
}

/// A declared resource and the resources nested beneath it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceNode {
    /// Identifier unique within the graph.
    pub logical_id: String,
    /// Resource type.
    pub kind: ResourceKind,
    /// Engine-specific properties.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    /// Teardown policy for stateful resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removal_policy: Option<RemovalPolicy>,
    /// Tags applied to the resource.
    pub tags: TagSet,
    /// Nested resources.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ResourceNode>,
}

impl ResourceNode {
    /// Creates a node with no properties, tags, or children.
    #[must_use]
    pub fn new(logical_id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            logical_id: logical_id.into(),
            kind,
            properties: Map::new(),
            removal_policy: None,
            tags: TagSet::new(),
            children: Vec::new(),
        }
    }

    /// Sets a property.
    #[must_use]
    pub fn property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_owned(), value.into());
        self
    }

    /// Sets the teardown policy.
    #[must_use]
    pub const fn removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = Some(policy);
        self
    }

    /// Appends a child node.
    #[must_use]
    pub fn child(mut self, node: Self) -> Self {
        self.children.push(node);
        self
    }

    /// Appends several child nodes.
    #[must_use]
    pub fn children(mut self, nodes: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(nodes);
        self
    }

    /// Iterates this node and all descendants depth-first, parents first.
    pub fn walk(&self) -> impl Iterator<Item = &Self> {
        let mut pending = vec![self];
        std::iter::from_fn(move || {
            let node = pending.pop()?;
            pending.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Finds a node by logical id anywhere beneath (and including) this one.
    #[must_use]
    pub fn find(&self, logical_id: &str) -> Option<&Self> {
        self.walk().find(|node| node.logical_id == logical_id)
    }

    /// Property value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

impl Taggable for ResourceNode {
    fn tags_mut(&mut self) -> &mut TagSet {
        &mut self.tags
    }

    fn children_mut(&mut self) -> &mut [Self] {
        &mut self.children
    }
}

/// Value resolved by the engine to the identifier of `logical_id`.
#[must_use]
pub fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// Value resolved by the engine to an attribute of `logical_id`.
#[must_use]
pub fn attribute(logical_id: &str, name: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, name] })
}

/// Value resolved by the engine from a variable at deploy time, keeping the
/// plaintext out of the emitted plan.
#[must_use]
pub fn deploy_time_env(variable: &str) -> Value {
    json!({ "FromEnv": variable })
}

/// Errors raised while declaring the resource graph.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum BuildError {
    /// Two nodes share a logical id.
    #[error("duplicate logical id `{0}` in resource graph")]
    DuplicateLogicalId(String),
}

/// Declares the resource topology for a resolved configuration.
pub trait StackBuilder {
    /// Builds the resource graph rooted at a stack node.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] when the configuration cannot be expressed as a
    /// consistent graph.
    fn build(&self, props: &StackProps) -> Result<ResourceNode, BuildError>;
}

/// Ensures every logical id in the graph is unique.
///
/// # Errors
///
/// Returns [`BuildError::DuplicateLogicalId`] naming the first repeated id.
pub fn ensure_unique_ids(root: &ResourceNode) -> Result<(), BuildError> {
    let mut seen = BTreeSet::new();
    for node in root.walk() {
        if !seen.insert(node.logical_id.as_str()) {
            return Err(BuildError::DuplicateLogicalId(node.logical_id.clone()));
        }
    }
    Ok(())
}
