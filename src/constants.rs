//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults and the
//! environment variable names that override them.

use std::path::PathBuf;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Flow-Shield";

// ============================================
// Pipeline defaults
// ============================================

/// Default dataset (CIC-IDS 2017 Friday afternoon DDoS capture)
pub const DEFAULT_DATASET_PATH: &str =
    "./MachineLearningCVE/Friday-WorkingHours-Afternoon-DDos.pcap_ISCX.csv";

/// Number of top-ranked features kept before threshold filtering
pub const DEFAULT_TOP_K: usize = 50;

/// Features scoring below this are dropped after ranking
pub const DEFAULT_MIN_SCORE: f64 = 0.2;

/// Fraction of rows held out for testing
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Seed for the train/test shuffle
pub const DEFAULT_SPLIT_SEED: u64 = 0;

/// Row used for the single-sample demonstration
pub const DEFAULT_DEMO_SAMPLE_ROW: usize = 18885;

// ============================================
// Training defaults
// ============================================

pub const DEFAULT_HIDDEN_LAYERS: [usize; 2] = [64, 32];
pub const DEFAULT_EPOCHS: usize = 10;
pub const DEFAULT_BATCH_SIZE: usize = 64;
pub const DEFAULT_LEARNING_RATE: f32 = 0.001;
pub const DEFAULT_MODEL_SEED: u64 = 0;

// ============================================
// Alert defaults
// ============================================

pub const DEFAULT_SINCH_BASE_URL: &str = "https://us.conversation.api.sinch.com";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_ALERT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_ALERT_RETRY_BACKOFF_MS: u64 = 500;
pub const DEFAULT_ALERT_TIMEOUT_SECS: u64 = 30;

// ============================================
// Environment variable names
// ============================================

pub const ENV_DATASET_PATH: &str = "DATASET_PATH";
pub const ENV_TOP_K: &str = "FEATURE_TOP_K";
pub const ENV_MIN_SCORE: &str = "FEATURE_MIN_SCORE";
pub const ENV_TEST_FRACTION: &str = "TEST_FRACTION";
pub const ENV_SPLIT_SEED: &str = "SPLIT_SEED";
pub const ENV_SCALER_FIT_MODE: &str = "SCALER_FIT_MODE";
pub const ENV_DEMO_SAMPLE_ROW: &str = "DEMO_SAMPLE_ROW";

pub const ENV_HIDDEN_LAYERS: &str = "HIDDEN_LAYERS";
pub const ENV_EPOCHS: &str = "EPOCHS";
pub const ENV_BATCH_SIZE: &str = "BATCH_SIZE";
pub const ENV_LEARNING_RATE: &str = "LEARNING_RATE";
pub const ENV_MODEL_SEED: &str = "MODEL_SEED";
pub const ENV_MODEL_DIR: &str = "MODEL_DIR";
pub const ENV_CHECKPOINT_DIR: &str = "CHECKPOINT_DIR";

pub const ENV_ALERT_RULE: &str = "ALERT_RULE";
pub const ENV_ALERT_MAX_ATTEMPTS: &str = "ALERT_MAX_ATTEMPTS";
pub const ENV_ALERT_RETRY_BACKOFF_MS: &str = "ALERT_RETRY_BACKOFF_MS";
pub const ENV_ALERT_TIMEOUT_SECS: &str = "ALERT_TIMEOUT_SECS";

// Messaging API keys keep their established .env names.
pub const ENV_SINCH_APP_ID: &str = "APPID";
pub const ENV_SINCH_ACCESS_KEY: &str = "ACCESSKEY";
pub const ENV_SINCH_ACCESS_SECRET: &str = "ACCESSSECRET";
pub const ENV_SINCH_PROJECT_ID: &str = "PROJECTID";
pub const ENV_SINCH_BASE_URL: &str = "SINCH_BASE_URL";
pub const ENV_SMS_RECIPIENT: &str = "SMS_RECIPIENT";

pub const ENV_SMTP_HOST: &str = "SMTP_HOST";
pub const ENV_SMTP_PORT: &str = "SMTP_PORT";
pub const ENV_SMTP_USERNAME: &str = "SMTP_USERNAME";
pub const ENV_SMTP_PASSWORD: &str = "SMTP_PASSWORD";
pub const ENV_ALERT_EMAIL_FROM: &str = "ALERT_EMAIL_FROM";
pub const ENV_ALERT_EMAIL_TO: &str = "ALERT_EMAIL_TO";

// ============================================
// Helper functions
// ============================================

/// Default directory for saved model bundles
pub fn default_model_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flow-shield")
        .join("model")
}

/// Host name used in alert bodies
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown-host".to_string())
}
