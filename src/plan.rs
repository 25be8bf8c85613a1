//! Provisioning plan emitted for the external engine.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::{RemovalPolicy, StackProps};
use crate::graph::ResourceNode;

/// Version of the plan document layout.
pub const PLAN_FORMAT_VERSION: u32 = 1;

/// Errors raised while rendering or writing a plan.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum PlanError {
    /// Raised when the plan cannot be rendered as JSON.
    #[error("failed to render plan: {0}")]
    Render(String),
    /// Raised when the plan file cannot be written.
    #[error("failed to write plan to {path}: {message}")]
    Write {
        /// Destination that could not be written.
        path: Utf8PathBuf,
        /// Underlying error message.
        message: String,
    },
}

/// Tagged resource graph plus the stack-level settings the engine needs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProvisioningPlan {
    /// Layout version, see [`PLAN_FORMAT_VERSION`].
    pub format_version: u32,
    /// Name of the stack, matching the root node.
    pub stack_name: String,
    /// Target region; absent means the engine default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Deployment environment.
    pub environment: String,
    /// Teardown policy applied to stateful resources.
    pub removal_policy: RemovalPolicy,
    /// Number of declared resources, including the root.
    pub resource_count: usize,
    /// Root of the resource graph.
    pub root: ResourceNode,
}

impl ProvisioningPlan {
    /// Assembles a plan from resolved props and a tagged graph.
    #[must_use]
    pub fn new(props: &StackProps, root: ResourceNode) -> Self {
        Self {
            format_version: PLAN_FORMAT_VERSION,
            stack_name: root.logical_id.clone(),
            region: props.deploy_region().map(str::to_owned),
            environment: props.deploy_environment().to_owned(),
            removal_policy: props.removal_policy(),
            resource_count: root.walk().count(),
            root,
        }
    }

    /// Renders the plan as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Render`] when serialisation fails.
    pub fn to_json(&self, pretty: bool) -> Result<String, PlanError> {
        let rendered = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        rendered.map_err(|err| PlanError::Render(err.to_string()))
    }

    /// Writes the rendered plan to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] when rendering fails or the file cannot be
    /// written.
    pub fn write_to(&self, path: &Utf8Path, pretty: bool) -> Result<(), PlanError> {
        let contents = self.to_json(pretty)?;
        let write_error = |message: String| PlanError::Write {
            path: path.to_owned(),
            message,
        };

        let file_name = path
            .file_name()
            .ok_or_else(|| write_error(String::from("path has no file name")))?;
        let parent = match path.parent() {
            Some(dir) if !dir.as_str().is_empty() => dir,
            _ => Utf8Path::new("."),
        };

        Dir::create_ambient_dir_all(parent, ambient_authority())
            .map_err(|err| write_error(err.to_string()))?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority())
            .map_err(|err| write_error(err.to_string()))?;
        dir.write(file_name, contents)
            .map_err(|err| write_error(err.to_string()))?;

        info!(path = %path, resources = self.resource_count, "wrote provisioning plan");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{StackBuilder, VectorStackBuilder};
    use crate::tags::apply_tags;
    use crate::test_helpers::{valid_props, valid_source};
    use crate::test_support::TEST_PASSWORD;
    use rstest::rstest;
    use tempfile::TempDir;

    fn plan_for(props: &StackProps) -> ProvisioningPlan {
        let mut root = VectorStackBuilder::new()
            .build(props)
            .unwrap_or_else(|err| panic!("build: {err}"));
        apply_tags(&props.tag_set(), &mut root);
        ProvisioningPlan::new(props, root)
    }

    #[rstest]
    fn plan_summarises_stack(valid_props: StackProps) {
        let plan = plan_for(&valid_props);
        assert_eq!(plan.stack_name, "myapp-development-stack");
        assert_eq!(plan.region.as_deref(), Some("eu-west-1"));
        assert_eq!(plan.environment, "development");
        assert_eq!(plan.removal_policy, RemovalPolicy::Destroy);
        assert_eq!(plan.resource_count, plan.root.walk().count());
    }

    #[rstest]
    fn region_is_omitted_when_unset(valid_source: crate::source::MapSource) {
        let props = StackProps::resolve(&valid_source.without("CDK_DEPLOY_REGION"))
            .expect("resolves without region");
        let rendered = plan_for(&props).to_json(false).expect("render");
        assert!(!rendered.contains("\"region\""), "rendered: {rendered}");
    }

    #[rstest]
    fn rendered_plan_is_tagged_and_redacted(valid_props: StackProps) {
        let rendered = plan_for(&valid_props).to_json(true).expect("render");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");

        assert!(!rendered.contains(TEST_PASSWORD));
        assert_eq!(value["removal_policy"], "DESTROY");
        assert_eq!(value["root"]["tags"]["owner"], "platform-team");
    }

    #[rstest]
    fn write_to_creates_parent_directories(valid_props: StackProps) {
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf())
            .unwrap_or_else(|path| panic!("temp dir should be utf8: {}", path.display()));
        let target = root.join("nested/out/plan.json");

        let plan = plan_for(&valid_props);
        plan.write_to(&target, false)
            .unwrap_or_else(|err| panic!("write plan: {err}"));

        let written = std::fs::read_to_string(&target).expect("read plan");
        assert_eq!(written, plan.to_json(false).expect("render"));
    }

    #[rstest]
    fn write_to_reports_unwritable_destination(valid_props: StackProps) {
        let err = plan_for(&valid_props)
            .write_to(Utf8Path::new("/"), false)
            .expect_err("root has no file name");
        assert!(matches!(err, PlanError::Write { .. }), "{err:?}");
    }
}
