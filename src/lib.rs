//! Flow-Shield - DDoS Flow Classifier
//!
//! Trains a small feed-forward classifier on flow-level traffic features
//! (CIC-IDS style CSV exports), evaluates it on a held-out split and alerts
//! over SMS and email when a scored record looks like an attack.

pub mod constants;
pub mod logic;

pub use logic::config::AppConfig;
pub use logic::error::{PipelineError, PipelineResult};
pub use logic::pipeline::{predict_row, run, train_pipeline, RunReport, SampleOutcome};
