//! Step definitions, fixtures, and scenarios for `tests/features/synth.feature`.

mod bdd_steps;
mod scenarios;
mod test_helpers;
