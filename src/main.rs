use clap::Parser;
use zeus_risk::cli::{Cli, Commands};
use zeus_risk::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            Config::parse(include_str!("../config.toml.example"))?
        }
    };

    // Initialize telemetry
    zeus_risk::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Evaluate(args) => {
            tracing::info!(symbol = %args.symbol, "Evaluating trade candidate");
            args.execute(&config).await?;
        }
        Commands::Simulate(args) => {
            tracing::info!("Starting session replay");
            args.execute(&config).await?;
        }
        Commands::Limits => {
            config.risk.validate()?;
            println!("{}", serde_json::to_string_pretty(&config.risk)?);
        }
    }

    Ok(())
}
