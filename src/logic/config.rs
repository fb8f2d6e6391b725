//! Configuration module
//!
//! Every setting comes from the environment (a `.env` file is loaded by
//! the binary first). Unset values fall back to the defaults in
//! `constants.rs`; alert channels are only enabled when all of their
//! required keys are present.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::*;
use crate::logic::error::ConfigError;
use crate::logic::features::SelectionConfig;
use crate::logic::model::TrainingConfig;
use crate::logic::response::{AlertConfig, AlertRule, EmailConfig, SmsConfig};
use crate::logic::split::ScalerFitMode;

/// Data preparation settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub dataset_path: PathBuf,
    pub selection: SelectionConfig,
    pub test_fraction: f64,
    pub split_seed: u64,
    pub scaler_fit_mode: ScalerFitMode,
    /// Row scored after training to exercise the alert path
    pub demo_sample_row: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            selection: SelectionConfig::default(),
            test_fraction: DEFAULT_TEST_FRACTION,
            split_seed: DEFAULT_SPLIT_SEED,
            scaler_fit_mode: ScalerFitMode::default(),
            demo_sample_row: DEFAULT_DEMO_SAMPLE_ROW,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub training: TrainingConfig,
    pub alert: AlertConfig,
    /// `None` when the messaging API is not configured
    pub sms: Option<SmsConfig>,
    /// `None` when SMTP is not configured
    pub email: Option<EmailConfig>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let pipeline = PipelineConfig {
            dataset_path: get(ENV_DATASET_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_PATH)),
            selection: SelectionConfig {
                top_k: parse_or(&get, ENV_TOP_K, DEFAULT_TOP_K)?,
                min_score: parse_or(&get, ENV_MIN_SCORE, DEFAULT_MIN_SCORE)?,
            },
            test_fraction: parse_or(&get, ENV_TEST_FRACTION, DEFAULT_TEST_FRACTION)?,
            split_seed: parse_or(&get, ENV_SPLIT_SEED, DEFAULT_SPLIT_SEED)?,
            scaler_fit_mode: parse_or(&get, ENV_SCALER_FIT_MODE, ScalerFitMode::default())?,
            demo_sample_row: parse_or(&get, ENV_DEMO_SAMPLE_ROW, DEFAULT_DEMO_SAMPLE_ROW)?,
        };

        if pipeline.selection.top_k == 0 {
            return Err(invalid(ENV_TOP_K, "0", "must be at least 1"));
        }
        if !(pipeline.test_fraction > 0.0 && pipeline.test_fraction < 1.0) {
            return Err(invalid(
                ENV_TEST_FRACTION,
                &pipeline.test_fraction.to_string(),
                "must be strictly between 0 and 1",
            ));
        }

        let training = TrainingConfig {
            hidden_layers: match get(ENV_HIDDEN_LAYERS) {
                Some(raw) => parse_layers(&raw)?,
                None => DEFAULT_HIDDEN_LAYERS.to_vec(),
            },
            epochs: parse_or(&get, ENV_EPOCHS, DEFAULT_EPOCHS)?,
            batch_size: parse_or(&get, ENV_BATCH_SIZE, DEFAULT_BATCH_SIZE)?,
            learning_rate: parse_or(&get, ENV_LEARNING_RATE, DEFAULT_LEARNING_RATE)?,
            seed: parse_or(&get, ENV_MODEL_SEED, DEFAULT_MODEL_SEED)?,
            model_dir: get(ENV_MODEL_DIR).map(PathBuf::from).unwrap_or_else(default_model_dir),
            checkpoint_dir: get(ENV_CHECKPOINT_DIR).map(PathBuf::from),
        };
        training
            .validate()
            .map_err(|e| invalid("training", "", &e.to_string()))?;

        let alert = AlertConfig {
            rule: parse_or(&get, ENV_ALERT_RULE, AlertRule::default())?,
            max_attempts: parse_or(&get, ENV_ALERT_MAX_ATTEMPTS, DEFAULT_ALERT_MAX_ATTEMPTS)?,
            retry_backoff: Duration::from_millis(parse_or(
                &get,
                ENV_ALERT_RETRY_BACKOFF_MS,
                DEFAULT_ALERT_RETRY_BACKOFF_MS,
            )?),
            timeout: Duration::from_secs(parse_or(&get, ENV_ALERT_TIMEOUT_SECS, DEFAULT_ALERT_TIMEOUT_SECS)?),
        };
        if alert.max_attempts == 0 {
            return Err(invalid(ENV_ALERT_MAX_ATTEMPTS, "0", "must be at least 1"));
        }

        let sms = match required(
            &get,
            "sms",
            &[
                ENV_SINCH_APP_ID,
                ENV_SINCH_ACCESS_KEY,
                ENV_SINCH_ACCESS_SECRET,
                ENV_SINCH_PROJECT_ID,
                ENV_SMS_RECIPIENT,
            ],
        )? {
            Some(values) => {
                let [app_id, access_key, access_secret, project_id, recipient]: [String; 5] = to_array(values);
                Some(SmsConfig {
                    app_id,
                    access_key,
                    access_secret,
                    project_id,
                    recipient,
                    base_url: get(ENV_SINCH_BASE_URL).unwrap_or_else(|| DEFAULT_SINCH_BASE_URL.to_string()),
                })
            }
            None => None,
        };

        let email = match required(
            &get,
            "email",
            &[ENV_SMTP_USERNAME, ENV_SMTP_PASSWORD, ENV_ALERT_EMAIL_TO],
        )? {
            Some(values) => {
                let [username, password, to]: [String; 3] = to_array(values);
                Some(EmailConfig {
                    host: get(ENV_SMTP_HOST).unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                    port: parse_or(&get, ENV_SMTP_PORT, DEFAULT_SMTP_PORT)?,
                    from: get(ENV_ALERT_EMAIL_FROM).unwrap_or_else(|| username.clone()),
                    username,
                    password,
                    to,
                })
            }
            None => None,
        };

        Ok(Self {
            pipeline,
            training,
            alert,
            sms,
            email,
        })
    }

    /// One-line overview for startup logs, secrets omitted
    pub fn describe(&self) -> String {
        format!(
            "dataset={} top_k={} min_score={} test_fraction={} scaler={} layers={:?} epochs={} alert_rule={} sms={} email={}",
            self.pipeline.dataset_path.display(),
            self.pipeline.selection.top_k,
            self.pipeline.selection.min_score,
            self.pipeline.test_fraction,
            self.pipeline.scaler_fit_mode,
            self.training.hidden_layers,
            self.training.epochs,
            self.alert.rule,
            if self.sms.is_some() { "on" } else { "off" },
            if self.email.is_some() { "on" } else { "off" },
        )
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| invalid(key, &raw, &e.to_string())),
        None => Ok(default),
    }
}

fn parse_layers(raw: &str) -> Result<Vec<usize>, ConfigError> {
    let layers = raw
        .split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| invalid(ENV_HIDDEN_LAYERS, raw, &e.to_string()))?;

    if layers.iter().any(|&u| u == 0) {
        return Err(invalid(ENV_HIDDEN_LAYERS, raw, "layer sizes must be at least 1"));
    }
    Ok(layers)
}

/// All of `keys` or none of them; a partial set is an error
fn required<G>(get: &G, channel: &'static str, keys: &[&'static str]) -> Result<Option<Vec<String>>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let values: Vec<Option<String>> = keys.iter().map(|k| get(*k)).collect();
    let missing: Vec<&'static str> = keys
        .iter()
        .zip(&values)
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| *k)
        .collect();

    if missing.len() == keys.len() {
        return Ok(None);
    }
    if !missing.is_empty() {
        return Err(ConfigError::Incomplete { channel, missing });
    }
    Ok(Some(values.into_iter().flatten().collect()))
}

fn to_array<const N: usize>(values: Vec<String>) -> [String; N]
where
    [String; N]: Default,
{
    let mut out: [String; N] = Default::default();
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = value;
    }
    out
}
