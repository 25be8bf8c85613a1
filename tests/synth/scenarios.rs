//! BDD scenarios for the synth workflow.

use rstest_bdd_macros::scenario;

use super::test_helpers::{SynthContext, synth_context};

#[scenario(
    path = "tests/features/synth.feature",
    name = "Synthesise a development stack"
)]
fn scenario_development_stack(synth_context: SynthContext) {
    drop(synth_context);
}

#[scenario(
    path = "tests/features/synth.feature",
    name = "Production deployments retain stateful resources"
)]
fn scenario_production_retains(synth_context: SynthContext) {
    drop(synth_context);
}

#[scenario(
    path = "tests/features/synth.feature",
    name = "Reject an unknown subnet type"
)]
fn scenario_unknown_subnet_type(synth_context: SynthContext) {
    drop(synth_context);
}

#[scenario(
    path = "tests/features/synth.feature",
    name = "Report every missing variable at once"
)]
fn scenario_missing_variables(synth_context: SynthContext) {
    drop(synth_context);
}

#[scenario(
    path = "tests/features/synth.feature",
    name = "Reject subnet lists of different lengths"
)]
fn scenario_mismatched_subnets(synth_context: SynthContext) {
    drop(synth_context);
}

#[scenario(
    path = "tests/features/synth.feature",
    name = "Pair subnets by position"
)]
fn scenario_subnet_pairing(synth_context: SynthContext) {
    drop(synth_context);
}

#[scenario(
    path = "tests/features/synth.feature",
    name = "Extra tags reach every resource"
)]
fn scenario_extra_tags(synth_context: SynthContext) {
    drop(synth_context);
}
