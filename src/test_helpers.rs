//! Shared fixtures for unit tests.

use rstest::fixture;

use crate::config::StackProps;
use crate::source::MapSource;
use crate::test_support::valid_map_source;

/// In-memory source holding a complete development configuration.
#[fixture]
pub fn valid_source() -> MapSource {
    valid_map_source()
}

/// Props resolved from [`valid_source`].
#[fixture]
pub fn valid_props(valid_source: MapSource) -> StackProps {
    StackProps::resolve(&valid_source)
        .unwrap_or_else(|err| panic!("valid source should resolve: {err}"))
}
