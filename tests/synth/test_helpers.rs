//! Shared fixtures for synth BDD scenarios.

use rstest::fixture;
use vecstack::{MapSource, ProvisioningPlan, TagSet};

/// Outcome of the `When` step: the plan, or the rendered error.
pub type SynthOutcome = Result<ProvisioningPlan, String>;

#[derive(Clone, Debug, Default)]
pub struct SynthContext {
    pub source: MapSource,
    pub extra_tags: TagSet,
    pub outcome: Option<SynthOutcome>,
}

impl SynthContext {
    pub fn plan(&self) -> Result<&ProvisioningPlan, String> {
        match &self.outcome {
            Some(Ok(plan)) => Ok(plan),
            Some(Err(message)) => Err(format!("expected a plan, synthesis failed: {message}")),
            None => Err(String::from("synthesis has not run")),
        }
    }
}

#[fixture]
pub fn synth_context() -> SynthContext {
    SynthContext::default()
}
