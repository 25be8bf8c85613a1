//! Command-line interface definitions for the `vecstack` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page. It
//! must not depend on the library crate.

use clap::Parser;

/// Top-level CLI for the `vecstack` binary.
#[derive(Debug, Parser)]
#[command(
    name = "vecstack",
    about = "Validate environment configuration and synthesise an Aurora pgvector stack plan",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Validate the stack configuration without declaring resources.
    #[command(
        name = "check",
        about = "Validate the stack configuration without declaring resources"
    )]
    Check,
    /// Declare the stack and write the provisioning plan.
    #[command(name = "synth", about = "Declare the stack and write the provisioning plan")]
    Synth(SynthCommand),
}

/// Arguments for the `vecstack synth` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct SynthCommand {
    /// Write the plan here instead of the configured `plan_path`.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub(crate) output: Option<String>,
    /// Extra tag applied to every resource, written as `key=value`.
    ///
    /// May be repeated. Extra tags override the base `environment`,
    /// `project`, and `owner` tags when the keys collide.
    #[arg(long = "tag", value_name = "KEY=VALUE")]
    pub(crate) tags: Vec<String>,
}
