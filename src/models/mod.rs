//! Data models shared between the engine and the presentation layer

pub mod metrics;

pub use metrics::{Metrics, SessionReport, SessionSnapshot};
