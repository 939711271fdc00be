//! Integration tests for the canopy namespace and snapshot pipeline

mod merge_failures;
mod shell_commands;
mod snapshot_round_trip;
