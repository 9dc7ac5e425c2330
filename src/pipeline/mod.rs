//! Speech-to-speech orchestration.
//!
//! A [`Pipeline`] owns a [`ServiceContext`] of loaded adapters and drives each
//! request through bounded phases, persisting one artifact per session in an
//! [`OutputStore`].

pub mod context;
pub mod latency;
pub mod operations;
pub mod orchestrator;
pub mod storage;
pub mod types;

pub use context::{ServiceContext, SynthesizerFactory};
pub use latency::PhaseTimings;
pub use operations::HealthReport;
pub use orchestrator::{Pipeline, PipelineSettings};
pub use storage::OutputStore;
pub use types::{Enhancement, PipelineResult};
