//! Aurora PostgreSQL + pgvector stack topology.

use serde_json::{Value, json};
use tracing::debug;

use super::{
    BuildError, ResourceKind, ResourceNode, StackBuilder, attribute, deploy_time_env,
    ensure_unique_ids, reference,
};
use crate::config::{POSTGRES_PORT, RemovalPolicy, StackProps};
use crate::env_check::RDS_PASSWORD;
use crate::options::ClusterScalabilityType;

const VPC: &str = "Vpc";
const DATABASE_SECURITY_GROUP: &str = "DatabaseSecurityGroup";
const FUNCTION_SECURITY_GROUP: &str = "FunctionSecurityGroup";
const DATABASE_INGRESS: &str = "DatabaseIngressFromFunction";
const STORAGE_KEY: &str = "StorageKey";
const CREDENTIALS: &str = "DatabaseCredentials";
const SUBNET_GROUP: &str = "DatabaseSubnetGroup";
const MONITORING_ROLE: &str = "MonitoringRole";
const CLUSTER: &str = "DatabaseCluster";
const WRITER: &str = "DatabaseWriter";
const SHARD_GROUP: &str = "DatabaseShardGroup";
const FUNCTION: &str = "CreatePgvectorExtension";
const FUNCTION_ROLE: &str = "CreatePgvectorExtensionRole";
const CLUSTER_CREATED_RULE: &str = "ClusterCreatedRule";
const RULE_PERMISSION: &str = "ClusterCreatedRuleInvokePermission";

const ENGINE: &str = "aurora-postgresql";
const FUNCTION_RUNTIME: &str = "python3.12";
const FUNCTION_HANDLER: &str = "index.handler";
const FUNCTION_ASSET: &str = "src/lambdas/create_pgvector_extension";
const FUNCTION_TIMEOUT_SECONDS: u32 = 60;

/// Declares the database cluster, the extension-creating function, the event
/// rule that triggers it, and their networking and security dependencies.
#[derive(Clone, Copy, Debug, Default)]
pub struct VectorStackBuilder;

impl VectorStackBuilder {
    /// Creates the builder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl StackBuilder for VectorStackBuilder {
    fn build(&self, props: &StackProps) -> Result<ResourceNode, BuildError> {
        let prefix = props.resource_prefix();
        let subnet_ids: Vec<String> = (1..=props.vpc_private_subnets().len())
            .map(|index| format!("Subnet{index}"))
            .collect();
        let subnet_refs: Vec<Value> = subnet_ids.iter().map(|id| reference(id)).collect();

        let root = ResourceNode::new(format!("{prefix}-stack"), ResourceKind::Stack)
            .property("Description", format!("pgvector database stack for {prefix}"))
            .child(vpc(props, &subnet_ids))
            .child(
                ResourceNode::new(DATABASE_SECURITY_GROUP, ResourceKind::SecurityGroup)
                    .property("GroupName", format!("{prefix}-database"))
                    .property("GroupDescription", "Aurora cluster access")
                    .property("VpcId", reference(VPC))
                    .property("AllowAllOutbound", false),
            )
            .child(
                ResourceNode::new(FUNCTION_SECURITY_GROUP, ResourceKind::SecurityGroup)
                    .property("GroupName", format!("{prefix}-function"))
                    .property("GroupDescription", "pgvector extension function")
                    .property("VpcId", reference(VPC))
                    .property("AllowAllOutbound", true),
            )
            .child(
                ResourceNode::new(DATABASE_INGRESS, ResourceKind::SecurityGroupIngress)
                    .property("GroupId", reference(DATABASE_SECURITY_GROUP))
                    .property("SourceSecurityGroupId", reference(FUNCTION_SECURITY_GROUP))
                    .property("IpProtocol", "tcp")
                    .property("FromPort", POSTGRES_PORT)
                    .property("ToPort", POSTGRES_PORT),
            )
            .child(
                ResourceNode::new(STORAGE_KEY, ResourceKind::KmsKey)
                    .property("Description", format!("{prefix} Aurora storage encryption"))
                    .property("Alias", format!("alias/{prefix}-aurora"))
                    .property("EnableKeyRotation", true)
                    .removal_policy(props.removal_policy()),
            )
            .child(credentials(props))
            .child(
                ResourceNode::new(SUBNET_GROUP, ResourceKind::DbSubnetGroup)
                    .property("DBSubnetGroupName", format!("{prefix}-subnets"))
                    .property(
                        "DBSubnetGroupDescription",
                        format!("{} subnets for {prefix}", props.vpc_subnet_type()),
                    )
                    .property("SubnetIds", subnet_refs.clone())
                    .removal_policy(props.removal_policy()),
            )
            .child(
                ResourceNode::new(MONITORING_ROLE, ResourceKind::IamRole)
                    .property("AssumedBy", "monitoring.rds.amazonaws.com")
                    .property(
                        "ManagedPolicyArns",
                        json!([
                            "arn:aws:iam::aws:policy/service-role/AmazonRDSEnhancedMonitoringRole"
                        ]),
                    ),
            )
            .child(cluster(props))
            .child(function(props, &subnet_refs))
            .child(event_rule(props))
            .child(
                ResourceNode::new(RULE_PERMISSION, ResourceKind::FunctionPermission)
                    .property("FunctionName", reference(FUNCTION))
                    .property("Action", "lambda:InvokeFunction")
                    .property("Principal", "events.amazonaws.com")
                    .property("SourceArn", attribute(CLUSTER_CREATED_RULE, "Arn")),
            )
            .children(outputs());

        ensure_unique_ids(&root)?;
        debug!(
            stack = %root.logical_id,
            resources = root.walk().count(),
            "declared resource graph"
        );
        Ok(root)
    }
}

fn vpc(props: &StackProps, subnet_ids: &[String]) -> ResourceNode {
    ResourceNode::new(VPC, ResourceKind::ImportedVpc)
        .property("VpcId", props.vpc_id())
        .children(
            props
                .vpc_private_subnets()
                .iter()
                .zip(subnet_ids)
                .map(|(subnet, logical_id)| {
                    ResourceNode::new(logical_id.as_str(), ResourceKind::ImportedSubnet)
                        .property("SubnetId", subnet.subnet_id.as_str())
                        .property("AvailabilityZone", subnet.availability_zone.as_str())
                        .property("RouteTableId", subnet.route_table_id.as_str())
                        .property("SubnetType", props.vpc_subnet_type().as_str())
                }),
        )
}

fn credentials(props: &StackProps) -> ResourceNode {
    let prefix = props.resource_prefix();
    ResourceNode::new(CREDENTIALS, ResourceKind::Secret)
        .property("Name", format!("{prefix}-credentials"))
        .property("KmsKeyId", reference(STORAGE_KEY))
        .property(
            "SecretString",
            json!({
                "username": props.rds_username(),
                "password": deploy_time_env(RDS_PASSWORD),
            }),
        )
        .removal_policy(props.removal_policy())
}

fn cluster(props: &StackProps) -> ResourceNode {
    let prefix = props.resource_prefix();
    let scalability = props.cluster_scalability_type();
    let retained = props.removal_policy() == RemovalPolicy::Retain;

    let node = ResourceNode::new(CLUSTER, ResourceKind::DbCluster)
        .property("DBClusterIdentifier", format!("{prefix}-cluster"))
        .property("Engine", ENGINE)
        .property("EngineVersion", props.engine_version())
        .property("ClusterScalabilityType", scalability.as_str())
        .property("DatabaseName", props.default_database_name())
        .property(
            "MasterUsername",
            json!({ "Fn::SecretValue": [CREDENTIALS, "username"] }),
        )
        .property(
            "MasterUserPassword",
            json!({ "Fn::SecretValue": [CREDENTIALS, "password"] }),
        )
        .property("Port", POSTGRES_PORT)
        .property("StorageType", props.storage_type().as_str())
        .property("StorageEncrypted", true)
        .property("KmsKeyId", reference(STORAGE_KEY))
        .property(
            "ServerlessV2ScalingConfiguration",
            json!({
                "MinCapacity": props.serverless_v2_min_capacity(),
                "MaxCapacity": props.serverless_v2_max_capacity(),
            }),
        )
        .property("MonitoringInterval", props.monitoring_interval())
        .property("MonitoringRoleArn", attribute(MONITORING_ROLE, "Arn"))
        .property("EnablePerformanceInsights", true)
        .property("DBSubnetGroupName", reference(SUBNET_GROUP))
        .property("VpcSecurityGroupIds", json!([reference(DATABASE_SECURITY_GROUP)]))
        .property("DeletionProtection", retained)
        .removal_policy(props.removal_policy());

    match scalability {
        ClusterScalabilityType::Standard => node.child(
            ResourceNode::new(WRITER, ResourceKind::DbInstance)
                .property("DBInstanceIdentifier", format!("{prefix}-writer"))
                .property("DBInstanceClass", "db.serverless")
                .property("Engine", ENGINE)
                .property("DBClusterIdentifier", reference(CLUSTER))
                .property("PubliclyAccessible", props.vpc_subnet_type().is_public())
                .property("MonitoringInterval", props.monitoring_interval()),
        ),
        ClusterScalabilityType::Limitless => node.child(
            ResourceNode::new(SHARD_GROUP, ResourceKind::DbShardGroup)
                .property("DBShardGroupIdentifier", format!("{prefix}-shards"))
                .property("DBClusterIdentifier", reference(CLUSTER))
                .property("MaxACU", props.serverless_v2_max_capacity())
                .property("PubliclyAccessible", props.vpc_subnet_type().is_public()),
        ),
    }
}

fn function(props: &StackProps, subnet_refs: &[Value]) -> ResourceNode {
    let prefix = props.resource_prefix();
    let mut variables: serde_json::Map<String, Value> = props
        .function_environment()
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    variables.insert(
        String::from("DB_HOST"),
        attribute(CLUSTER, "Endpoint.Address"),
    );
    variables.insert(String::from("DB_SECRET_ARN"), reference(CREDENTIALS));
    variables.insert(
        String::from("DB_PASSWORD"),
        json!({ "Fn::SecretValue": [CREDENTIALS, "password"] }),
    );

    ResourceNode::new(FUNCTION, ResourceKind::Function)
        .property("FunctionName", format!("{prefix}-create-pgvector-extension"))
        .property("Runtime", FUNCTION_RUNTIME)
        .property("Handler", FUNCTION_HANDLER)
        .property("Code", json!({ "Asset": FUNCTION_ASSET }))
        .property("Timeout", FUNCTION_TIMEOUT_SECONDS)
        .property("Role", attribute(FUNCTION_ROLE, "Arn"))
        .property("Environment", json!({ "Variables": variables }))
        .property(
            "VpcConfig",
            json!({
                "SubnetIds": subnet_refs,
                "SecurityGroupIds": [reference(FUNCTION_SECURITY_GROUP)],
            }),
        )
        .child(
            ResourceNode::new(FUNCTION_ROLE, ResourceKind::IamRole)
                .property("AssumedBy", "lambda.amazonaws.com")
                .property(
                    "ManagedPolicyArns",
                    json!([
                        "arn:aws:iam::aws:policy/service-role/AWSLambdaVPCAccessExecutionRole"
                    ]),
                )
                .property(
                    "Policies",
                    json!([
                        {
                            "Action": ["secretsmanager:GetSecretValue"],
                            "Resource": [reference(CREDENTIALS)],
                        },
                        {
                            "Action": ["kms:Decrypt"],
                            "Resource": [attribute(STORAGE_KEY, "Arn")],
                        },
                    ]),
                ),
        )
}

fn event_rule(props: &StackProps) -> ResourceNode {
    let prefix = props.resource_prefix();
    ResourceNode::new(CLUSTER_CREATED_RULE, ResourceKind::EventRule)
        .property("Name", format!("{prefix}-cluster-created"))
        .property(
            "EventPattern",
            json!({
                "source": ["aws.rds"],
                "detail-type": ["RDS DB Cluster Event"],
                "detail": {
                    "EventCategories": ["creation"],
                    "SourceIdentifier": [format!("{prefix}-cluster")],
                },
            }),
        )
        .property(
            "Targets",
            json!([{ "Id": FUNCTION, "Arn": attribute(FUNCTION, "Arn") }]),
        )
}

fn outputs() -> Vec<ResourceNode> {
    vec![
        ResourceNode::new("ClusterEndpointOutput", ResourceKind::Output)
            .property("Value", attribute(CLUSTER, "Endpoint.Address")),
        ResourceNode::new("SecretArnOutput", ResourceKind::Output)
            .property("Value", reference(CREDENTIALS)),
        ResourceNode::new("FunctionNameOutput", ResourceKind::Output)
            .property("Value", reference(FUNCTION)),
    ]
}
