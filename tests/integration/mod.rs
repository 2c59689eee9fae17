//! Integration test suite.
//!
//! Exercises full runs of the `build` pipeline against temp-dir projects
//! with a stubbed external build, plus CLI smoke tests on the real binary.

mod build_plan;
mod cli_smoke;
