//! Tool settings for `vecstack synth`, layered via `ortho-config`.
//!
//! These settings control where and how the plan is written. They are
//! separate from the stack inputs, which are read unprefixed from the
//! environment by [`crate::config::StackProps::resolve`].

use std::ffi::OsString;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Plan destination used when nothing else is configured.
pub const DEFAULT_PLAN_PATH: &str = "cdk.out/plan.json";

/// Output settings loaded from defaults, `vecstack.toml`, and `VECSTACK_*`
/// environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "VECSTACK",
    discovery(
        app_name = "vecstack",
        env_var = "VECSTACK_CONFIG_PATH",
        config_file_name = "vecstack.toml",
        dotfile_name = ".vecstack.toml",
        project_file_name = "vecstack.toml"
    )
)]
pub struct SynthSettings {
    /// Where the provisioning plan is written.
    #[ortho_config(default = DEFAULT_PLAN_PATH.to_owned())]
    pub plan_path: String,
    /// Whether the plan JSON is indented.
    #[ortho_config(default = true)]
    pub pretty: bool,
}

/// Errors raised while loading or validating [`SynthSettings`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SettingsError {
    /// Merging configuration layers failed.
    #[error("settings parsing failed: {0}")]
    Parse(String),
    /// A required setting is blank.
    #[error("missing {field}: set VECSTACK_{env_suffix} or add {field} to vecstack.toml", env_suffix = field.to_uppercase())]
    InvalidField {
        /// Setting that failed validation.
        field: String,
    },
}

impl SynthSettings {
    /// Loads settings without parsing CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] when merging sources fails.
    pub fn load_without_cli_args() -> Result<Self, SettingsError> {
        Self::load_from_iter([OsString::from("vecstack")])
            .map_err(|err| SettingsError::Parse(err.to_string()))
    }

    /// Ensures the plan path is present after trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidField`] when `plan_path` is blank.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.plan_path.trim().is_empty() {
            return Err(SettingsError::InvalidField {
                field: String::from("plan_path"),
            });
        }
        Ok(())
    }

    /// Plan destination, preferring `override_path` when supplied.
    #[must_use]
    pub fn plan_destination(&self, override_path: Option<Utf8PathBuf>) -> Utf8PathBuf {
        override_path.unwrap_or_else(|| Utf8PathBuf::from(self.plan_path.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EnvGuard;
    use rstest::{fixture, rstest};

    #[fixture]
    fn defaults() -> SynthSettings {
        SynthSettings {
            plan_path: DEFAULT_PLAN_PATH.to_owned(),
            pretty: true,
        }
    }

    #[tokio::test]
    async fn loads_defaults_when_unset() {
        let _guard = EnvGuard::remove_vars(&["VECSTACK_PLAN_PATH", "VECSTACK_PRETTY"]).await;
        let settings = SynthSettings::load_without_cli_args().expect("defaults load");
        assert_eq!(settings, defaults());
    }

    #[tokio::test]
    async fn environment_overrides_defaults() {
        let _guard = EnvGuard::set_vars(&[
            ("VECSTACK_PLAN_PATH", "build/stack.json"),
            ("VECSTACK_PRETTY", "false"),
        ])
        .await;
        let settings = SynthSettings::load_without_cli_args().expect("env settings load");
        assert_eq!(settings.plan_path, "build/stack.json");
        assert!(!settings.pretty);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn validate_rejects_blank_plan_path(defaults: SynthSettings, #[case] plan_path: &str) {
        let settings = SynthSettings {
            plan_path: plan_path.to_owned(),
            ..defaults
        };
        let err = settings.validate().expect_err("blank path rejected");
        let message = err.to_string();
        assert!(message.contains("VECSTACK_PLAN_PATH"), "{message}");
        assert!(message.contains("vecstack.toml"), "{message}");
    }

    #[rstest]
    fn override_path_wins(defaults: SynthSettings) {
        assert_eq!(
            defaults.plan_destination(Some(Utf8PathBuf::from("elsewhere.json"))),
            Utf8PathBuf::from("elsewhere.json")
        );
        assert_eq!(
            defaults.plan_destination(None),
            Utf8PathBuf::from(DEFAULT_PLAN_PATH)
        );
    }
}
