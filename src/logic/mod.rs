//! Logic Module - Classifier Pipeline
//!
//! - `dataset/` - CSV loading and cleaning
//! - `features/` - relevance scoring and selection
//! - `split/` - train/test partition and scaling
//! - `model/` - network, training, artifacts
//! - `response/` - SMS and email alerts

pub mod error;
pub mod config;

pub mod dataset;
pub mod labels;
pub mod features;
pub mod split;
pub mod model;
pub mod evaluate;
pub mod response;

pub mod pipeline;
