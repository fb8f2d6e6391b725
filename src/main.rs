//! Flow-Shield CLI
//!
//! ```text
//! flow-shield train            full pipeline, saves the model bundle
//! flow-shield predict <row>    score one dataset row with the saved model
//! ```

use std::process::ExitCode;

use anyhow::{bail, Context, Result};

use flow_shield::constants::{APP_NAME, APP_VERSION};
use flow_shield::logic::response::AlertDispatcher;
use flow_shield::{predict_row, run, AppConfig};

fn usage() -> String {
    format!(
        "usage: flow-shield train\n       flow-shield predict <row>\n\n{} v{}",
        APP_NAME, APP_VERSION
    )
}

fn execute(args: &[String]) -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().context("invalid configuration")?;
    log::info!("{}", config.describe());

    let dispatcher = AlertDispatcher::from_config(&config);
    log::info!(
        "Alert rule '{}' on channels: [{}]",
        dispatcher.rule(),
        dispatcher.channel_names().join(", ")
    );

    match args.first().map(String::as_str) {
        Some("train") => {
            let report = run(&config, &dispatcher).context("training pipeline failed")?;
            log::info!(
                "Run {} finished: accuracy {:.4}, model saved to {}",
                report.run_id,
                report.evaluation.accuracy,
                report.model_path.display()
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some("predict") => {
            let row: usize = match args.get(1) {
                Some(raw) => raw.parse().with_context(|| format!("invalid row index '{}'", raw))?,
                None => bail!("{}", usage()),
            };
            let outcome = predict_row(&config, &config.training.model_dir, row, &dispatcher)
                .context("prediction failed")?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        _ => bail!("{}", usage()),
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}
