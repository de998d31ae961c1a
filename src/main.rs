use clap::Parser;
use consult_desk::app::commands;
use consult_desk::config::{Cli, Command};
use consult_desk::utils::error::ErrorSeverity;
use consult_desk::utils::logger;
use consult_desk::{AppConfig, AppContext, ConsultError, LlmSettings};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e).max(1));
        }
    };

    if matches!(cli.command, Command::Serve { .. }) {
        logger::init_server_logger(config.logging.json, cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    if let Err(e) = run(cli, config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::debug!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let code = exit_code(&e);
        if code > 0 {
            std::process::exit(code);
        }
    }
}

async fn run(cli: Cli, mut config: AppConfig) -> consult_desk::Result<()> {
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = data_dir.display().to_string();
    }
    tracing::debug!("Configuration: {:?}", config);

    let ctx = AppContext::bootstrap(config, LlmSettings::from_env()).await?;

    match cli.command {
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| ctx.config.server.host.clone());
            let port = port.unwrap_or(ctx.config.server.port);
            let addr = consult_desk::server::resolve_addr(&host, port).await?;
            consult_desk::server::run_server(Arc::new(ctx), addr).await
        }
        command => commands::run(&ctx, command).await,
    }
}

fn exit_code(e: &ConsultError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
