//! Presence checks for the variables that drive stack resolution.

use tracing::debug;

use crate::config::ConfigError;
use crate::source::ConfigSource;

/// Application name, also used as the `project` tag.
pub const APP_NAME: &str = "APP_NAME";
/// Optional deployment region; the engine default applies when unset.
pub const CDK_DEPLOY_REGION: &str = "CDK_DEPLOY_REGION";
/// Deployment environment name (`development`, `production`, ...).
pub const ENVIRONMENT: &str = "ENVIRONMENT";
/// Owner recorded in the `owner` tag.
pub const OWNER: &str = "OWNER";
/// Identifier of the existing VPC to deploy into.
pub const VPC_ID: &str = "VPC_ID";
/// Subnet placement for the cluster and function.
pub const VPC_SUBNET_TYPE: &str = "VPC_SUBNET_TYPE";
/// Comma-separated subnet identifiers.
pub const VPC_PRIVATE_SUBNET_IDS: &str = "VPC_PRIVATE_SUBNET_IDS";
/// Comma-separated availability zones, positionally matching the subnet ids.
pub const VPC_PRIVATE_SUBNET_AZS: &str = "VPC_PRIVATE_SUBNET_AZS";
/// Comma-separated route table ids, positionally matching the subnet ids.
pub const VPC_PRIVATE_SUBNET_ROUTE_TABLE_IDS: &str = "VPC_PRIVATE_SUBNET_ROUTE_TABLE_IDS";
/// Upper serverless v2 capacity bound in ACUs.
pub const SERVERLESS_V2_MAX_CAPACITY: &str = "SERVERLESS_V2_MAX_CAPACITY";
/// Lower serverless v2 capacity bound in ACUs.
pub const SERVERLESS_V2_MIN_CAPACITY: &str = "SERVERLESS_V2_MIN_CAPACITY";
/// Master username for the cluster.
pub const RDS_USERNAME: &str = "RDS_USERNAME";
/// Master password for the cluster.
pub const RDS_PASSWORD: &str = "RDS_PASSWORD";
/// Database created with the cluster.
pub const DEFAULT_DATABASE_NAME: &str = "DEFAULT_DATABASE_NAME";
/// Cluster storage type.
pub const STORAGE_TYPE: &str = "STORAGE_TYPE";
/// Enhanced monitoring interval in seconds.
pub const MONITORING_INTERVAL: &str = "MONITORING_INTERVAL";
/// Cluster scalability type.
pub const CLUSTER_SCALABILITY_TYPE: &str = "CLUSTER_SCALABILITY_TYPE";
/// Vector width for the `pgvector` extension. The spelling is what the
/// data-plane function reads and must not be corrected.
pub const VECTOR_DIMENTIONS: &str = "VECTOR_DIMENTIONS";
/// Output width of the embedding model.
pub const EMBEDDING_MODEL_DIMENSIONS: &str = "EMBEDDING_MODEL_DIMENSIONS";
/// Database driver used by the data-plane function.
pub const PGVECTOR_DRIVER: &str = "PGVECTOR_DRIVER";

/// Variables that must be set before the stack can be resolved.
pub const REQUIRED_VARIABLES: [&str; 19] = [
    APP_NAME,
    ENVIRONMENT,
    OWNER,
    VPC_ID,
    VPC_SUBNET_TYPE,
    VPC_PRIVATE_SUBNET_IDS,
    VPC_PRIVATE_SUBNET_AZS,
    VPC_PRIVATE_SUBNET_ROUTE_TABLE_IDS,
    SERVERLESS_V2_MAX_CAPACITY,
    SERVERLESS_V2_MIN_CAPACITY,
    RDS_USERNAME,
    RDS_PASSWORD,
    DEFAULT_DATABASE_NAME,
    STORAGE_TYPE,
    MONITORING_INTERVAL,
    CLUSTER_SCALABILITY_TYPE,
    VECTOR_DIMENTIONS,
    EMBEDDING_MODEL_DIMENSIONS,
    PGVECTOR_DRIVER,
];

/// Verifies every name in `names` has a non-blank value in `source`.
///
/// Values are not inspected beyond presence.
///
/// # Errors
///
/// Returns [`ConfigError::MissingVariables`] listing every absent or empty
/// name, in the order given.
pub fn check_required<S: ConfigSource + ?Sized>(
    source: &S,
    names: &[&str],
) -> Result<(), ConfigError> {
    let missing: Vec<String> = names
        .iter()
        .filter(|name| source.non_empty(name).is_none())
        .map(|name| (*name).to_owned())
        .collect();

    if missing.is_empty() {
        debug!(checked = names.len(), "required variables present");
        return Ok(());
    }
    Err(ConfigError::MissingVariables { names: missing })
}
