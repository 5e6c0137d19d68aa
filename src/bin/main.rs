use std::process::ExitCode;

use boardsync::{cli, config, telemetry};

fn main() -> ExitCode {
    let cli = cli::parse_from(std::env::args_os());

    // no subscriber yet, so a broken config is reported on stderr directly
    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("config load failed, using defaults: {err}");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };
    let _telemetry_guard = telemetry::init(telemetry::TelemetryConfig::new(
        cli.verbose,
        cfg.logging.clone(),
    ));

    match cli::run(cli, &cfg) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("error: {}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
