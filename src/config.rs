//! Resolution of the stack configuration from raw key/value input.
//!
//! [`StackProps::resolve`] turns stringly-typed variables into a single
//! immutable, fully-typed request. Every failure is reported before a
//! resource graph exists, so nothing downstream ever sees a partial value.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::env_check::{
    self, APP_NAME, CDK_DEPLOY_REGION, CLUSTER_SCALABILITY_TYPE, DEFAULT_DATABASE_NAME,
    EMBEDDING_MODEL_DIMENSIONS, ENVIRONMENT, MONITORING_INTERVAL, OWNER, PGVECTOR_DRIVER,
    RDS_PASSWORD, RDS_USERNAME, REQUIRED_VARIABLES, SERVERLESS_V2_MAX_CAPACITY,
    SERVERLESS_V2_MIN_CAPACITY, STORAGE_TYPE, VECTOR_DIMENTIONS, VPC_ID,
    VPC_PRIVATE_SUBNET_AZS, VPC_PRIVATE_SUBNET_IDS, VPC_PRIVATE_SUBNET_ROUTE_TABLE_IDS,
    VPC_SUBNET_TYPE,
};
use crate::options::{ClusterScalabilityType, ParseOptionError, StorageType, SubnetType};
use crate::source::ConfigSource;
use crate::tags::TagSet;

/// Separator between the application name and environment in resource names.
pub const PREFIX_SEPARATOR: &str = "-";

/// The only environment whose resources survive teardown.
pub const PRODUCTION_ENVIRONMENT: &str = "production";

/// Port the cluster listens on.
pub const POSTGRES_PORT: u16 = 5432;

/// Errors raised while resolving the stack configuration.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// One or more required variables are absent or blank.
    #[error("missing required environment variables: {}", names.join(", "))]
    MissingVariables {
        /// Every missing name, in the order it was checked.
        names: Vec<String>,
    },
    /// A variable holds a token outside its closed option set.
    #[error("{variable}: {source}")]
    InvalidOption {
        /// Variable that held the token.
        variable: &'static str,
        /// Parser failure naming the value and accepted tokens.
        #[source]
        source: ParseOptionError,
    },
    /// A numeric variable could not be parsed.
    #[error("{variable}: `{value}` is not a valid {expected}")]
    InvalidNumber {
        /// Variable that held the value.
        variable: &'static str,
        /// Raw value as supplied.
        value: String,
        /// Description of the expected number.
        expected: &'static str,
    },
    /// A numeric variable parsed but is outside its permitted range.
    #[error("{variable}: {message}")]
    OutOfRange {
        /// Variable that held the value.
        variable: &'static str,
        /// Description of the violated bound.
        message: String,
    },
    /// A comma-separated list contains an empty entry.
    #[error("{variable}: entry {position} is empty")]
    EmptyListItem {
        /// Variable that held the list.
        variable: &'static str,
        /// One-based position of the empty entry.
        position: usize,
    },
    /// The positional subnet lists do not describe the same number of subnets.
    #[error(
        "subnet lists differ in length: VPC_PRIVATE_SUBNET_IDS has {subnet_ids}, \
         VPC_PRIVATE_SUBNET_AZS has {availability_zones}, \
         VPC_PRIVATE_SUBNET_ROUTE_TABLE_IDS has {route_table_ids}"
    )]
    MismatchedSubnets {
        /// Number of subnet identifiers.
        subnet_ids: usize,
        /// Number of availability zones.
        availability_zones: usize,
        /// Number of route table identifiers.
        route_table_ids: usize,
    },
    /// The serverless v2 minimum capacity exceeds the maximum.
    #[error(
        "SERVERLESS_V2_MIN_CAPACITY ({min}) must not exceed SERVERLESS_V2_MAX_CAPACITY ({max})"
    )]
    CapacityBounds {
        /// Resolved minimum capacity.
        min: f64,
        /// Resolved maximum capacity.
        max: f64,
    },
}

/// A secret value that never appears in logs, debug output, or plans.
#[derive(Clone, Eq, PartialEq)]
pub struct Sensitive(String);

impl Sensitive {
    /// Wraps a secret value.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns the plaintext. Only the provisioning call may use it.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sensitive(***)")
    }
}

impl fmt::Display for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Whether stateful resources survive stack teardown.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemovalPolicy {
    /// Keep the resource when the stack is deleted.
    Retain,
    /// Delete the resource with the stack.
    Destroy,
}

impl RemovalPolicy {
    /// Selects the policy for a deployment environment.
    ///
    /// Only an exact match on [`PRODUCTION_ENVIRONMENT`] retains resources;
    /// every other name, including differently cased ones, destroys them.
    #[must_use]
    pub fn for_environment(environment: &str) -> Self {
        if environment == PRODUCTION_ENVIRONMENT {
            Self::Retain
        } else {
            Self::Destroy
        }
    }
}

/// One private subnet, assembled from the positional subnet lists.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SubnetDescriptor {
    /// Subnet identifier.
    pub subnet_id: String,
    /// Availability zone of the subnet.
    pub availability_zone: String,
    /// Route table associated with the subnet.
    pub route_table_id: String,
}

/// Builds the namespacing prefix shared by every resource name.
#[must_use]
pub fn resource_prefix(app_name: &str, environment: &str) -> String {
    format!("{app_name}{PREFIX_SEPARATOR}{environment}")
}

/// Fully resolved, immutable stack configuration.
///
/// Fields are private: downstream code only reads through accessors.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StackProps {
    app_name: String,
    resource_prefix: String,
    deploy_region: Option<String>,
    deploy_environment: String,
    owner: String,
    removal_policy: RemovalPolicy,
    vpc_id: String,
    vpc_subnet_type: SubnetType,
    vpc_private_subnets: Vec<SubnetDescriptor>,
    serverless_v2_min_capacity: f64,
    serverless_v2_max_capacity: f64,
    rds_username: String,
    #[serde(skip)]
    rds_password: Sensitive,
    default_database_name: String,
    storage_type: StorageType,
    monitoring_interval: u32,
    cluster_scalability_type: ClusterScalabilityType,
    vector_dimensions: u32,
    embedding_model_dimensions: u32,
    pgvector_driver: String,
}

impl StackProps {
    /// Resolves the stack configuration from `source`.
    ///
    /// Presence of every required variable is checked first, so a single
    /// error lists everything missing. Values are then parsed field by field
    /// and the first invalid one aborts resolution.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first failure category hit.
    pub fn resolve<S: ConfigSource + ?Sized>(source: &S) -> Result<Self, ConfigError> {
        env_check::check_required(source, &REQUIRED_VARIABLES)?;
        let fields = Fields { source };

        let vpc_subnet_type = fields.option::<SubnetType>(VPC_SUBNET_TYPE)?;
        let storage_type = fields.option::<StorageType>(STORAGE_TYPE)?;
        let cluster_scalability_type =
            fields.option::<ClusterScalabilityType>(CLUSTER_SCALABILITY_TYPE)?;

        let vpc_private_subnets = zip_subnets(
            fields.list(VPC_PRIVATE_SUBNET_IDS)?,
            fields.list(VPC_PRIVATE_SUBNET_AZS)?,
            fields.list(VPC_PRIVATE_SUBNET_ROUTE_TABLE_IDS)?,
        )?;

        let serverless_v2_min_capacity = fields.capacity(SERVERLESS_V2_MIN_CAPACITY)?;
        let serverless_v2_max_capacity = fields.capacity(SERVERLESS_V2_MAX_CAPACITY)?;
        if serverless_v2_min_capacity > serverless_v2_max_capacity {
            return Err(ConfigError::CapacityBounds {
                min: serverless_v2_min_capacity,
                max: serverless_v2_max_capacity,
            });
        }

        let monitoring_interval = fields.positive(MONITORING_INTERVAL)?;
        let vector_dimensions = fields.positive(VECTOR_DIMENTIONS)?;
        let embedding_model_dimensions = fields.positive(EMBEDDING_MODEL_DIMENSIONS)?;
        if vector_dimensions != embedding_model_dimensions {
            warn!(
                vector_dimensions,
                embedding_model_dimensions,
                "VECTOR_DIMENTIONS and EMBEDDING_MODEL_DIMENSIONS disagree"
            );
        }

        let app_name = fields.text(APP_NAME);
        let deploy_environment = fields.raw(ENVIRONMENT);
        let props = Self {
            resource_prefix: resource_prefix(&app_name, &deploy_environment),
            removal_policy: RemovalPolicy::for_environment(&deploy_environment),
            deploy_region: source
                .non_empty(CDK_DEPLOY_REGION)
                .map(|region| region.trim().to_owned()),
            owner: fields.text(OWNER),
            vpc_id: fields.text(VPC_ID),
            rds_username: fields.text(RDS_USERNAME),
            rds_password: Sensitive::new(source.get(RDS_PASSWORD).unwrap_or_default()),
            default_database_name: fields.text(DEFAULT_DATABASE_NAME),
            pgvector_driver: fields.text(PGVECTOR_DRIVER),
            app_name,
            deploy_environment,
            vpc_subnet_type,
            vpc_private_subnets,
            serverless_v2_min_capacity,
            serverless_v2_max_capacity,
            storage_type,
            monitoring_interval,
            cluster_scalability_type,
            vector_dimensions,
            embedding_model_dimensions,
        };

        debug!(
            prefix = %props.resource_prefix,
            region = props.deploy_region.as_deref().unwrap_or("<engine default>"),
            subnet_type = %props.vpc_subnet_type,
            storage_type = %props.storage_type,
            scalability = %props.cluster_scalability_type,
            subnets = props.vpc_private_subnets.len(),
            "resolved stack configuration"
        );
        Ok(props)
    }

    /// Application name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Prefix applied to every resource name (`{app}-{environment}`).
    #[must_use]
    pub fn resource_prefix(&self) -> &str {
        &self.resource_prefix
    }

    /// Target region; `None` defers to the provisioning engine.
    #[must_use]
    pub fn deploy_region(&self) -> Option<&str> {
        self.deploy_region.as_deref()
    }

    /// Deployment environment name.
    #[must_use]
    pub fn deploy_environment(&self) -> &str {
        &self.deploy_environment
    }

    /// Owner recorded in tags.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Teardown policy for stateful resources.
    #[must_use]
    pub const fn removal_policy(&self) -> RemovalPolicy {
        self.removal_policy
    }

    /// Identifier of the VPC to deploy into.
    #[must_use]
    pub fn vpc_id(&self) -> &str {
        &self.vpc_id
    }

    /// Subnet placement.
    #[must_use]
    pub const fn vpc_subnet_type(&self) -> SubnetType {
        self.vpc_subnet_type
    }

    /// Subnets, in the order they were listed.
    #[must_use]
    pub fn vpc_private_subnets(&self) -> &[SubnetDescriptor] {
        &self.vpc_private_subnets
    }

    /// Lower serverless v2 capacity bound in ACUs.
    #[must_use]
    pub const fn serverless_v2_min_capacity(&self) -> f64 {
        self.serverless_v2_min_capacity
    }

    /// Upper serverless v2 capacity bound in ACUs.
    #[must_use]
    pub const fn serverless_v2_max_capacity(&self) -> f64 {
        self.serverless_v2_max_capacity
    }

    /// Master username.
    #[must_use]
    pub fn rds_username(&self) -> &str {
        &self.rds_username
    }

    /// Master password, redacted in every rendering.
    #[must_use]
    pub const fn rds_password(&self) -> &Sensitive {
        &self.rds_password
    }

    /// Database created with the cluster.
    #[must_use]
    pub fn default_database_name(&self) -> &str {
        &self.default_database_name
    }

    /// Cluster storage type.
    #[must_use]
    pub const fn storage_type(&self) -> StorageType {
        self.storage_type
    }

    /// Enhanced monitoring interval in seconds.
    #[must_use]
    pub const fn monitoring_interval(&self) -> u32 {
        self.monitoring_interval
    }

    /// Cluster scalability type.
    #[must_use]
    pub const fn cluster_scalability_type(&self) -> ClusterScalabilityType {
        self.cluster_scalability_type
    }

    /// Engine version implied by the scalability type.
    #[must_use]
    pub const fn engine_version(&self) -> &'static str {
        self.cluster_scalability_type.engine_version()
    }

    /// Width of the `pgvector` extension.
    #[must_use]
    pub const fn vector_dimensions(&self) -> u32 {
        self.vector_dimensions
    }

    /// Output width of the embedding model.
    #[must_use]
    pub const fn embedding_model_dimensions(&self) -> u32 {
        self.embedding_model_dimensions
    }

    /// Driver the data-plane function connects with.
    #[must_use]
    pub fn pgvector_driver(&self) -> &str {
        &self.pgvector_driver
    }

    /// Base organisational tags applied to every resource.
    #[must_use]
    pub fn tag_set(&self) -> TagSet {
        TagSet::new()
            .with("environment", &self.deploy_environment)
            .with("project", &self.app_name)
            .with("owner", &self.owner)
    }

    /// Static part of the environment handed to the data-plane function.
    ///
    /// Connection endpoints and the password, which is only ever a secret
    /// reference, are added by the graph builder once those resources exist.
    #[must_use]
    pub fn function_environment(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (String::from("DB_NAME"), self.default_database_name.clone()),
            (String::from("DB_PORT"), POSTGRES_PORT.to_string()),
            (String::from("DB_USER"), self.rds_username.clone()),
            (String::from(PGVECTOR_DRIVER), self.pgvector_driver.clone()),
            (
                String::from(VECTOR_DIMENTIONS),
                self.vector_dimensions.to_string(),
            ),
            (
                String::from(EMBEDDING_MODEL_DIMENSIONS),
                self.embedding_model_dimensions.to_string(),
            ),
        ])
    }
}

/// Typed readers over a source whose required keys are known to be present.
struct Fields<'a, S: ?Sized> {
    source: &'a S,
}

impl<S: ConfigSource + ?Sized> Fields<'_, S> {
    fn raw(&self, variable: &str) -> String {
        self.source.get(variable).unwrap_or_default()
    }

    fn text(&self, variable: &str) -> String {
        self.raw(variable).trim().to_owned()
    }

    fn option<T>(&self, variable: &'static str) -> Result<T, ConfigError>
    where
        T: FromStr<Err = ParseOptionError>,
    {
        self.raw(variable)
            .parse()
            .map_err(|source| ConfigError::InvalidOption { variable, source })
    }

    fn list(&self, variable: &'static str) -> Result<Vec<String>, ConfigError> {
        self.raw(variable)
            .split(',')
            .enumerate()
            .map(|(index, item)| {
                let entry = item.trim();
                if entry.is_empty() {
                    Err(ConfigError::EmptyListItem {
                        variable,
                        position: index + 1,
                    })
                } else {
                    Ok(entry.to_owned())
                }
            })
            .collect()
    }

    fn capacity(&self, variable: &'static str) -> Result<f64, ConfigError> {
        let raw = self.raw(variable);
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidNumber {
                variable,
                value: raw.clone(),
                expected: "capacity in ACUs",
            })?;
        if !value.is_finite() || value.is_sign_negative() {
            return Err(ConfigError::OutOfRange {
                variable,
                message: format!("capacity must be a finite, non-negative number, got `{raw}`"),
            });
        }
        Ok(value)
    }

    fn positive(&self, variable: &'static str) -> Result<u32, ConfigError> {
        let raw = self.raw(variable);
        let value = raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidNumber {
                variable,
                value: raw.clone(),
                expected: "whole number",
            })?;
        if value == 0 {
            return Err(ConfigError::OutOfRange {
                variable,
                message: String::from("must be greater than zero"),
            });
        }
        Ok(value)
    }
}

fn zip_subnets(
    subnet_ids: Vec<String>,
    availability_zones: Vec<String>,
    route_table_ids: Vec<String>,
) -> Result<Vec<SubnetDescriptor>, ConfigError> {
    if subnet_ids.len() != availability_zones.len() || subnet_ids.len() != route_table_ids.len() {
        return Err(ConfigError::MismatchedSubnets {
            subnet_ids: subnet_ids.len(),
            availability_zones: availability_zones.len(),
            route_table_ids: route_table_ids.len(),
        });
    }
    Ok(subnet_ids
        .into_iter()
        .zip(availability_zones)
        .zip(route_table_ids)
        .map(
            |((subnet_id, availability_zone), route_table_id)| SubnetDescriptor {
                subnet_id,
                availability_zone,
                route_table_id,
            },
        )
        .collect())
}
