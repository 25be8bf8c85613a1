//! Test support utilities shared across unit and integration tests.

use std::collections::BTreeSet;
use std::env;
use std::ffi::OsString;

use tokio::sync::{Mutex, MutexGuard};

use crate::env_check::{
    APP_NAME, CDK_DEPLOY_REGION, CLUSTER_SCALABILITY_TYPE, DEFAULT_DATABASE_NAME,
    EMBEDDING_MODEL_DIMENSIONS, ENVIRONMENT, MONITORING_INTERVAL, OWNER, PGVECTOR_DRIVER,
    RDS_PASSWORD, RDS_USERNAME, SERVERLESS_V2_MAX_CAPACITY, SERVERLESS_V2_MIN_CAPACITY,
    STORAGE_TYPE, VECTOR_DIMENTIONS, VPC_ID, VPC_PRIVATE_SUBNET_AZS, VPC_PRIVATE_SUBNET_IDS,
    VPC_PRIVATE_SUBNET_ROUTE_TABLE_IDS, VPC_SUBNET_TYPE,
};
use crate::source::MapSource;

/// Password used by [`VALID_VARIABLES`]; tests assert it never leaks.
pub const TEST_PASSWORD: &str = "s3cr3t-password";

/// A complete, valid set of stack variables for a development deployment.
pub const VALID_VARIABLES: [(&str, &str); 20] = [
    (APP_NAME, "myapp"),
    (CDK_DEPLOY_REGION, "eu-west-1"),
    (ENVIRONMENT, "development"),
    (OWNER, "platform-team"),
    (VPC_ID, "vpc-0123456789abcdef0"),
    (VPC_SUBNET_TYPE, "PRIVATE_ISOLATED"),
    (VPC_PRIVATE_SUBNET_IDS, "subnet-a,subnet-b"),
    (VPC_PRIVATE_SUBNET_AZS, "eu-west-1a,eu-west-1b"),
    (VPC_PRIVATE_SUBNET_ROUTE_TABLE_IDS, "rtb-a,rtb-b"),
    (SERVERLESS_V2_MAX_CAPACITY, "4"),
    (SERVERLESS_V2_MIN_CAPACITY, "0.5"),
    (RDS_USERNAME, "postgres"),
    (RDS_PASSWORD, TEST_PASSWORD),
    (DEFAULT_DATABASE_NAME, "vectors"),
    (STORAGE_TYPE, "aurora-iopt1"),
    (MONITORING_INTERVAL, "60"),
    (CLUSTER_SCALABILITY_TYPE, "standard"),
    (VECTOR_DIMENTIONS, "1536"),
    (EMBEDDING_MODEL_DIMENSIONS, "1536"),
    (PGVECTOR_DRIVER, "psycopg"),
];

/// Builds an in-memory source holding [`VALID_VARIABLES`].
#[must_use]
pub fn valid_map_source() -> MapSource {
    VALID_VARIABLES.into_iter().collect()
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }

    /// Removes variables while holding the global mutex, restoring them on
    /// drop.
    pub async fn remove_vars(keys: &[&str]) -> Self {
        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(keys.len());
        for key in keys {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::remove_var(key) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
