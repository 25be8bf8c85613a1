//! Closed option sets for the stack configuration.
//!
//! Each axis maps a raw token to a typed member. Tokens are matched after
//! trimming surrounding whitespace and ignoring ASCII case; anything else is
//! rejected with the full list of accepted tokens.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Raised when a raw token does not belong to an option axis.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("invalid {axis} `{value}`: expected one of {}", accepted.join(", "))]
pub struct ParseOptionError {
    /// Human-readable name of the option axis.
    pub axis: &'static str,
    /// Raw value exactly as supplied.
    pub value: String,
    /// Every token the axis accepts, in canonical spelling.
    pub accepted: Vec<&'static str>,
}

fn parse_token<T: Copy>(
    axis: &'static str,
    raw: &str,
    table: &[(&'static str, T)],
) -> Result<T, ParseOptionError> {
    let needle = raw.trim();
    table
        .iter()
        .find(|(token, _)| token.eq_ignore_ascii_case(needle))
        .map(|(_, member)| *member)
        .ok_or_else(|| ParseOptionError {
            axis,
            value: raw.to_owned(),
            accepted: table.iter().map(|(token, _)| *token).collect(),
        })
}

/// Placement of the database and function within the VPC.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SubnetType {
    /// Subnets with a route to an internet gateway.
    Public,
    /// Private subnets with outbound access through a NAT.
    PrivateWithEgress,
    /// Private subnets without any route outside the VPC.
    PrivateIsolated,
}

impl SubnetType {
    const TOKENS: [(&'static str, Self); 3] = [
        ("PUBLIC", Self::Public),
        ("PRIVATE_WITH_EGRESS", Self::PrivateWithEgress),
        ("PRIVATE_ISOLATED", Self::PrivateIsolated),
    ];

    /// Canonical token for this subnet type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::PrivateWithEgress => "PRIVATE_WITH_EGRESS",
            Self::PrivateIsolated => "PRIVATE_ISOLATED",
        }
    }

    /// Whether resources placed here are reachable from the internet.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

impl FromStr for SubnetType {
    type Err = ParseOptionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_token("VPC subnet type", raw, &Self::TOKENS)
    }
}

/// Aurora cluster storage configuration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StorageType {
    /// Standard Aurora storage, billed per I/O.
    Aurora,
    /// I/O-optimised storage.
    AuroraIopt1,
}

impl StorageType {
    const TOKENS: [(&'static str, Self); 2] =
        [("aurora", Self::Aurora), ("aurora-iopt1", Self::AuroraIopt1)];

    /// Canonical token for this storage type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aurora => "aurora",
            Self::AuroraIopt1 => "aurora-iopt1",
        }
    }
}

impl FromStr for StorageType {
    type Err = ParseOptionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_token("storage type", raw, &Self::TOKENS)
    }
}

/// Aurora PostgreSQL engine version requested for standard clusters.
pub const STANDARD_ENGINE_VERSION: &str = "16.6";

/// Aurora PostgreSQL engine version requested for limitless clusters.
pub const LIMITLESS_ENGINE_VERSION: &str = "16.6-limitless";

/// Scaling model of the cluster. Also decides the engine version.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ClusterScalabilityType {
    /// Single-writer cluster.
    Standard,
    /// Aurora Limitless Database with sharded writers.
    Limitless,
}

impl ClusterScalabilityType {
    const TOKENS: [(&'static str, Self); 2] =
        [("standard", Self::Standard), ("limitless", Self::Limitless)];

    /// Canonical token for this scalability type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Limitless => "limitless",
        }
    }

    /// Engine version the cluster must request for this scalability type.
    #[must_use]
    pub const fn engine_version(self) -> &'static str {
        match self {
            Self::Standard => STANDARD_ENGINE_VERSION,
            Self::Limitless => LIMITLESS_ENGINE_VERSION,
        }
    }
}

impl FromStr for ClusterScalabilityType {
    type Err = ParseOptionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_token("cluster scalability type", raw, &Self::TOKENS)
    }
}

impl Serialize for SubnetType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Serialize for StorageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Serialize for ClusterScalabilityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for SubnetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ClusterScalabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
