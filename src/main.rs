//! Binary entry point for the `vecstack` CLI.

use std::io::{self, Write};
use std::process;

use camino::Utf8PathBuf;
use clap::Parser;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use vecstack::{
    ConfigSource, ProcessEnv, SettingsError, SynthError, SynthSettings, Synthesizer, TagPair,
    TagPairError, TagSet, VectorStackBuilder,
};

mod cli;

use cli::{Cli, SynthCommand};

const DEFAULT_LOG_FILTER: &str = "vecstack=info";

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid --tag: {0}")]
    Tag(#[from] TagPairError),
    #[error("configuration error: {0}")]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Synth(#[from] SynthError),
    #[error("failed to write output: {0}")]
    Output(String),
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli, &ProcessEnv, &mut io::stdout()) {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .try_init()
        .ok();
}

fn dispatch<S: ConfigSource>(
    cli: Cli,
    source: &S,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let synthesizer = Synthesizer::new(VectorStackBuilder::new());
    match cli {
        Cli::Check => {
            let props = synthesizer.check(source)?;
            writeln!(out, "configuration valid for {}", props.resource_prefix())
                .map_err(|err| CliError::Output(err.to_string()))
        }
        Cli::Synth(command) => synth_command(&synthesizer, &command, source, out),
    }
}

fn synth_command<S: ConfigSource>(
    synthesizer: &Synthesizer<VectorStackBuilder>,
    command: &SynthCommand,
    source: &S,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let extra_tags = parse_tags(&command.tags)?;
    let settings = SynthSettings::load_without_cli_args()?;
    settings.validate()?;

    let plan = synthesizer.synthesize(source, &extra_tags)?;
    let destination = settings.plan_destination(command.output.as_deref().map(Utf8PathBuf::from));
    plan.write_to(&destination, settings.pretty)
        .map_err(SynthError::from)?;

    writeln!(
        out,
        "wrote {} resources for {} to {destination}",
        plan.resource_count, plan.stack_name
    )
    .map_err(|err| CliError::Output(err.to_string()))
}

fn parse_tags(raw: &[String]) -> Result<TagSet, TagPairError> {
    raw.iter()
        .map(|pair| pair.parse::<TagPair>().map(|tag| (tag.key, tag.value)))
        .collect()
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;
    use vecstack::test_support::{TEST_PASSWORD, valid_map_source};
    use vecstack::{ConfigError, MapSource};

    fn run(cli: Cli, source: &MapSource) -> (Result<(), CliError>, String) {
        let mut out = Vec::new();
        let result = dispatch(cli, source, &mut out);
        (result, String::from_utf8(out).expect("utf8 output"))
    }

    #[test]
    fn check_reports_prefix() {
        let (result, stdout) = run(Cli::Check, &valid_map_source());
        assert!(result.is_ok(), "{result:?}");
        assert_eq!(stdout, "configuration valid for myapp-development\n");
    }

    #[test]
    fn check_lists_every_missing_variable() {
        let source = valid_map_source().without("OWNER").without("VPC_ID");
        let (result, stdout) = run(Cli::Check, &source);
        let Err(CliError::Synth(SynthError::Config(ConfigError::MissingVariables { names }))) =
            &result
        else {
            panic!("expected missing variables, got {result:?}");
        };
        assert_eq!(names, &vec![String::from("OWNER"), String::from("VPC_ID")]);
        assert!(stdout.is_empty());
    }

    #[test]
    fn synth_writes_plan_to_override_path() {
        let tmp = TempDir::new().expect("tempdir");
        let target = tmp.path().join("out/plan.json");
        let command = SynthCommand {
            output: Some(target.to_string_lossy().into_owned()),
            tags: vec![String::from("team=search")],
        };

        let (result, stdout) = run(Cli::Synth(command), &valid_map_source());
        assert!(result.is_ok(), "{result:?}");
        assert!(stdout.starts_with("wrote "), "stdout: {stdout}");

        let written = std::fs::read_to_string(&target).expect("plan written");
        assert!(written.contains("\"team\""));
        assert!(!written.contains(TEST_PASSWORD));
    }

    #[test]
    fn synth_rejects_malformed_tag_before_writing() {
        let tmp = TempDir::new().expect("tempdir");
        let target = tmp.path().join("plan.json");
        let command = SynthCommand {
            output: Some(target.to_string_lossy().into_owned()),
            tags: vec![String::from("no-separator")],
        };

        let (result, _) = run(Cli::Synth(command), &valid_map_source());
        assert!(matches!(result, Err(CliError::Tag(_))), "{result:?}");
        assert!(!target.exists());
    }

    #[rstest]
    #[case(&[], 0)]
    #[case(&["a=1", "b=2"], 2)]
    #[case(&["a=1", "a=2"], 1)]
    fn parse_tags_collects_pairs(#[case] raw: &[&str], #[case] expected: usize) {
        let owned: Vec<String> = raw.iter().map(|s| (*s).to_owned()).collect();
        let tags = parse_tags(&owned).expect("valid tags");
        assert_eq!(tags.len(), expected);
    }

    #[test]
    fn write_error_writes_cli_error() {
        let mut buf = Vec::new();
        let err = CliError::Output(String::from("broken pipe"));
        write_error(&mut buf, &err);
        let rendered = String::from_utf8(buf).expect("utf8");
        assert_eq!(rendered, "failed to write output: broken pipe\n");
    }
}
