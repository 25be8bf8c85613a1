//! Core library for the `vecstack` provisioning tool.
//!
//! The crate turns environment configuration into a validated, immutable
//! [`StackProps`] bundle and declares an Aurora PostgreSQL (pgvector) stack
//! from it: imported VPC subnets, a serverless v2 cluster, a credentials
//! secret, an encryption key, and a function that enables the `vector`
//! extension once the cluster exists. The declared graph is tagged and
//! emitted as a JSON [`ProvisioningPlan`] for an external engine.

pub mod config;
pub mod env_check;
pub mod graph;
pub mod options;
pub mod plan;
pub mod settings;
pub mod source;
pub mod synth;
pub mod tags;
#[cfg(test)]
pub(crate) mod test_helpers;
pub mod test_support;

pub use config::{ConfigError, RemovalPolicy, Sensitive, StackProps, SubnetDescriptor};
pub use env_check::{REQUIRED_VARIABLES, check_required};
pub use graph::{BuildError, ResourceKind, ResourceNode, StackBuilder, VectorStackBuilder};
pub use options::{ClusterScalabilityType, ParseOptionError, StorageType, SubnetType};
pub use plan::{PlanError, ProvisioningPlan};
pub use settings::{SettingsError, SynthSettings};
pub use source::{ConfigSource, MapSource, ProcessEnv};
pub use synth::{SynthError, Synthesizer};
pub use tags::{TagPair, TagPairError, TagSet, Taggable, apply_tags, with_tags};
