//! Pure domain logic for the import pipeline.
//!
//! This crate has zero internal dependencies (no async, no I/O). It provides
//! the job lifecycle codes, the error-description routines, change
//! correlation keys, author identity resolution, and reserved-ref
//! classification used by the orchestration layer.

pub mod change;
pub mod describe;
pub mod identity;
pub mod refs;
pub mod status;
