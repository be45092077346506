//! # at-core
//!
//! Core types, ID generation, and error types for the action tracker.
//!
//! This crate provides the foundational types shared across all tracker crates:
//! - Action record structs (the enriched observation and its snapshots)
//! - The batch payload envelope posted to the collector
//! - ID prefix constants and random identifier generation
//! - ISO-8601 timestamp rendering
//! - Cross-cutting error types

pub mod errors;
pub mod ids;
pub mod payload;
pub mod records;
pub mod timestamp;

pub use errors::CoreError;
pub use payload::{BatchPayload, SendMeta};
pub use records::{ActionRecord, ElementSnapshot, InteractionSnapshot, PageSnapshot, TrackedAction};
