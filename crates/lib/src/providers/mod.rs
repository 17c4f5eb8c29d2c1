//! # Providers
//!
//! Boundaries to the external systems the pipeline calls: the inference engine and
//! embedding endpoint (`ai`), and the persisted law chunks (`store`).

pub mod ai;
pub mod factory;
pub mod store;
