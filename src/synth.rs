//! Orchestrates resolution, graph construction, and tagging.
//!
//! The synth workflow resolves [`StackProps`] from a [`ConfigSource`], asks a
//! [`StackBuilder`] for the resource graph, tags every node, and wraps the
//! result in a [`ProvisioningPlan`]. Any validation failure stops the flow
//! before a graph exists.

use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, StackProps};
use crate::graph::{BuildError, StackBuilder};
use crate::plan::{PlanError, ProvisioningPlan};
use crate::source::ConfigSource;
use crate::tags::{TagSet, with_tags};

/// Errors surfaced while synthesising a plan.
#[derive(Debug, Error, PartialEq)]
pub enum SynthError {
    /// Configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The resource graph could not be declared.
    #[error("failed to declare resources: {0}")]
    Build(#[from] BuildError),
    /// The plan could not be rendered or written.
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Drives the synth flow for a given [`StackBuilder`].
#[derive(Clone, Debug, Default)]
pub struct Synthesizer<B> {
    builder: B,
}

impl<B: StackBuilder> Synthesizer<B> {
    /// Creates a synthesizer around `builder`.
    #[must_use]
    pub const fn new(builder: B) -> Self {
        Self { builder }
    }

    /// Resolves and validates configuration without building anything.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError::Config`] when any input is missing or invalid.
    pub fn check<S: ConfigSource + ?Sized>(&self, source: &S) -> Result<StackProps, SynthError> {
        let props = StackProps::resolve(source)?;
        info!(
            prefix = props.resource_prefix(),
            environment = props.deploy_environment(),
            "configuration resolved"
        );
        Ok(props)
    }

    /// Builds and tags the resource graph for already-resolved props.
    ///
    /// `extra_tags` extend the base tags and win on conflicting keys.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError::Build`] when the builder rejects the props.
    pub fn plan(
        &self,
        props: &StackProps,
        extra_tags: &TagSet,
    ) -> Result<ProvisioningPlan, SynthError> {
        let root = self.builder.build(props)?;
        info!(stack = %root.logical_id, "resource graph declared");

        let mut tags = props.tag_set();
        tags.extend(extra_tags);
        let tagged = with_tags(&tags, root);
        info!(tags = tags.len(), "tags applied");

        Ok(ProvisioningPlan::new(props, tagged))
    }

    /// Runs the full flow: resolve, build, tag, and assemble the plan.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError`] from whichever stage fails first.
    pub fn synthesize<S: ConfigSource + ?Sized>(
        &self,
        source: &S,
        extra_tags: &TagSet,
    ) -> Result<ProvisioningPlan, SynthError> {
        let props = self.check(source)?;
        self.plan(&props, extra_tags)
    }
}
