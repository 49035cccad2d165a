use anyhow::Result;
use codes2html::{cli, run_codes2html};
use env_logger::Env;
use log::info;
use std::time::Instant;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let started = Instant::now();

    let matches = cli::command().get_matches();
    env_logger::Builder::from_env(Env::default().default_filter_or(cli::log_level(&matches)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let outcome = match cli::config_from_matches(&matches) {
        Ok(config) => run_codes2html(&config).await,
        Err(err) => Err(err),
    };

    if let Ok(summary) = &outcome {
        info!("{summary}");
    }
    info!("total time: {:.1}s", started.elapsed().as_secs_f64());

    outcome.map(|_| ())
}
