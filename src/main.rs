use clap::Parser;
use heart_risk_form::core::ConfigProvider;
use heart_risk_form::startup::build_app;
use heart_risk_form::utils::error::ErrorSeverity;
use heart_risk_form::utils::{logger, validation::Validate};
use heart_risk_form::{CliConfig, RiskError, TomlConfig};
use tokio::signal;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    match cli.config.clone() {
        Some(path) => {
            let config = match TomlConfig::from_file(&path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("❌ Failed to load config file '{}': {}", path, e);
                    eprintln!("💡 Make sure the file exists and is valid TOML format");
                    std::process::exit(1);
                }
            };
            logger::init_logger(cli.verbose, config.json_logs());
            tracing::info!("📁 Loaded configuration from: {}", path);
            serve(config).await
        }
        None => {
            logger::init_logger(cli.verbose, cli.json_logs);
            tracing::debug!("CLI config: {:?}", cli);
            serve(cli).await
        }
    }
}

async fn serve<C: ConfigProvider + Validate>(config: C) -> anyhow::Result<()> {
    if let Err(e) = config.validate() {
        exit_with(&e, "Configuration validation failed");
    }

    tracing::info!(
        version = VERSION,
        address = config.bind_address(),
        model = config.model_path(),
        pid = std::process::id(),
        "🚀 Starting heart-risk-form"
    );

    let (app, addr) = match build_app(&config).await {
        Ok(built) => built,
        Err(e) => exit_with(&e, "Startup failed"),
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn exit_with(e: &RiskError, context: &str) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::Medium | ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
