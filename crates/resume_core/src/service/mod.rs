//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate persistence, summarization and notification into the
//!   resume use-case.
//! - Classify failures into caller faults and system faults for the
//!   transport boundary.

pub mod resume_service;
pub mod submission;
