//! Command builder for running the `vecstack` binary against a known
//! environment.
//!
//! The process environment is cleared so host variables never leak into a
//! test, then the valid stack variables are applied. Include via:
//!
//! ```rust
//! #[path = "common/stack_env.rs"]
//! mod stack_env;
//! ```

use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use vecstack::test_support::VALID_VARIABLES;

/// Builds a `vecstack` command running in `workdir` with only the valid
/// stack variables set.
pub fn vecstack_in(workdir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("vecstack");
    cmd.env_clear();
    cmd.envs(VALID_VARIABLES);
    cmd.current_dir(workdir);
    cmd
}
