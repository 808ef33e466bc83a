//! Behavioral specifications for the Atlas task engine.
//!
//! These tests are black-box: they drive the public engine and store APIs
//! over a temporary state directory and verify persisted outcomes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// engine/
#[path = "specs/engine/abandon.rs"]
mod engine_abandon;
#[path = "specs/engine/ci_failure.rs"]
mod engine_ci_failure;
#[path = "specs/engine/happy_path.rs"]
mod engine_happy_path;
#[path = "specs/engine/no_changes.rs"]
mod engine_no_changes;
#[path = "specs/engine/parallel.rs"]
mod engine_parallel;
#[path = "specs/engine/resume.rs"]
mod engine_resume;

// store/
#[path = "specs/store/contention.rs"]
mod store_contention;
#[path = "specs/store/durability.rs"]
mod store_durability;
