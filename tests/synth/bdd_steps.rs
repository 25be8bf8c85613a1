//! BDD step definitions for synthesising the stack plan.

use rstest_bdd_macros::{given, then, when};
use vecstack::test_support::valid_map_source;
use vecstack::{RemovalPolicy, Synthesizer, TagSet, VectorStackBuilder};

use super::test_helpers::SynthContext;

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

impl From<String> for StepError {
    fn from(message: String) -> Self {
        Self::Assertion(message)
    }
}

const STATEFUL_RESOURCES: [&str; 4] = [
    "DatabaseCluster",
    "StorageKey",
    "DatabaseCredentials",
    "DatabaseSubnetGroup",
];

#[given("a complete development configuration")]
fn complete_configuration(mut synth_context: SynthContext) -> SynthContext {
    synth_context.source = valid_map_source();
    synth_context
}

#[given("the environment is \"{environment}\"")]
fn environment_is(mut synth_context: SynthContext, environment: String) -> SynthContext {
    synth_context.source.insert("ENVIRONMENT", environment);
    synth_context
}

#[given("\"{name}\" is set to \"{value}\"")]
fn variable_is_set(mut synth_context: SynthContext, name: String, value: String) -> SynthContext {
    synth_context.source.insert(name, value);
    synth_context
}

#[given("\"{name}\" is unset")]
fn variable_is_unset(synth_context: SynthContext, name: String) -> SynthContext {
    SynthContext {
        source: synth_context.source.without(&name),
        ..synth_context
    }
}

#[given("the extra tag \"{key}\" is \"{value}\"")]
fn extra_tag(mut synth_context: SynthContext, key: String, value: String) -> SynthContext {
    synth_context.extra_tags.insert(key, value);
    synth_context
}

#[when("I synthesise the stack")]
fn synthesise(synth_context: SynthContext) -> SynthContext {
    let outcome = Synthesizer::new(VectorStackBuilder::new())
        .synthesize(&synth_context.source, &synth_context.extra_tags)
        .map_err(|err| err.to_string());
    SynthContext {
        outcome: Some(outcome),
        ..synth_context
    }
}

#[then("synthesis succeeds")]
fn synthesis_succeeds(synth_context: &SynthContext) -> Result<(), StepError> {
    synth_context.plan()?;
    Ok(())
}

#[then("synthesis fails mentioning \"{fragment}\"")]
fn synthesis_fails(synth_context: &SynthContext, fragment: String) -> Result<(), StepError> {
    match &synth_context.outcome {
        Some(Err(message)) if message.contains(&fragment) => Ok(()),
        Some(Err(message)) => Err(StepError::Assertion(format!(
            "error `{message}` does not mention `{fragment}`"
        ))),
        Some(Ok(_)) => Err(StepError::Assertion(String::from(
            "expected synthesis to fail",
        ))),
        None => Err(StepError::Assertion(String::from("synthesis has not run"))),
    }
}

#[then("the stack is named \"{name}\"")]
fn stack_is_named(synth_context: &SynthContext, name: String) -> Result<(), StepError> {
    let plan = synth_context.plan()?;
    if plan.stack_name == name {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected stack {name}, got {}",
            plan.stack_name
        )))
    }
}

#[then("stateful resources use the \"{policy}\" removal policy")]
fn stateful_policy(synth_context: &SynthContext, policy: String) -> Result<(), StepError> {
    let expected = match policy.as_str() {
        "RETAIN" => RemovalPolicy::Retain,
        "DESTROY" => RemovalPolicy::Destroy,
        other => {
            return Err(StepError::Assertion(format!(
                "unknown removal policy {other}"
            )));
        }
    };
    let plan = synth_context.plan()?;
    for id in STATEFUL_RESOURCES {
        let node = plan
            .root
            .find(id)
            .ok_or_else(|| StepError::Assertion(format!("missing resource {id}")))?;
        if node.removal_policy != Some(expected) {
            return Err(StepError::Assertion(format!(
                "{id} has removal policy {:?}, expected {expected:?}",
                node.removal_policy
            )));
        }
    }
    Ok(())
}

#[then("every resource carries the base tags")]
fn base_tags_everywhere(synth_context: &SynthContext) -> Result<(), StepError> {
    let plan = synth_context.plan()?;
    let base = TagSet::new()
        .with("environment", plan.environment.as_str())
        .with("project", "myapp")
        .with("owner", "platform-team");
    match plan.root.walk().find(|node| !node.tags.contains_all(&base)) {
        None => Ok(()),
        Some(node) => Err(StepError::Assertion(format!(
            "{} is missing base tags: {:?}",
            node.logical_id, node.tags
        ))),
    }
}

#[then("every resource is tagged \"{key}\" with \"{value}\"")]
fn tagged_everywhere(
    synth_context: &SynthContext,
    key: String,
    value: String,
) -> Result<(), StepError> {
    let plan = synth_context.plan()?;
    match plan
        .root
        .walk()
        .find(|node| node.tags.get(&key) != Some(value.as_str()))
    {
        None => Ok(()),
        Some(node) => Err(StepError::Assertion(format!(
            "{} lacks tag {key}={value}",
            node.logical_id
        ))),
    }
}

#[then("subnet \"{subnet}\" is \"{id}\" in \"{zone}\" with route table \"{route_table}\"")]
fn subnet_is_paired(
    synth_context: &SynthContext,
    subnet: String,
    id: String,
    zone: String,
    route_table: String,
) -> Result<(), StepError> {
    let plan = synth_context.plan()?;
    let node = plan
        .root
        .find(&subnet)
        .ok_or_else(|| StepError::Assertion(format!("missing subnet {subnet}")))?;
    let field = |key: &str| node.get(key).and_then(|value| value.as_str()).map(str::to_owned);
    let actual = (
        field("SubnetId"),
        field("AvailabilityZone"),
        field("RouteTableId"),
    );
    let expected = (Some(id), Some(zone), Some(route_table));
    if actual == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "{subnet} is {actual:?}, expected {expected:?}"
        )))
    }
}
