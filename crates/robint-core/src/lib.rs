//! Core types and trait definitions for the robint market-intelligence store.
//!
//! This crate is deliberately free of database and CLI dependencies. It owns
//! the domain model (data points, subjects, periods, validation status), the
//! error taxonomy, the pure validation engine, and the two orchestration
//! layers that run against any [`store::IntelStore`] backend: the validation
//! workflow and the change detector.

pub mod detect;
pub mod error;
pub mod ingest;
pub mod period;
pub mod point;
pub mod report;
pub mod rules;
pub mod source;
pub mod status;
pub mod store;
pub mod subject;
pub mod taxonomy;
pub mod workflow;

pub use error::{Error, Result};
