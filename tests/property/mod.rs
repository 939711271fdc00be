//! Property-based tests for snapshot correctness

mod round_trip;
