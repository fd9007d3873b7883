use anyhow::{Context, Result};
use chartup::cli::commands::{DeployCommand, ValidateCommand};
use chartup::cli::output::*;
use chartup::cli::{Cli, Command};
use chartup::{install_pipeline, InstallConfig, ProcessRunner};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Deploy(cmd) => deploy(cmd).await?,
        Command::Validate(cmd) => validate(cmd)?,
    }

    Ok(())
}

async fn deploy(cmd: &DeployCommand) -> Result<()> {
    let config = cmd.resolve()?;

    println!(
        "{} Deploying release {} to namespace {}",
        INFO,
        style(&config.release).bold(),
        style(&config.namespace).cyan()
    );

    let runner = Arc::new(ProcessRunner::new());
    let mut pipeline = install_pipeline(runner);
    pipeline.add_event_handler(|event| {
        println!("{}", format_step_event(event));
    });

    println!();
    match pipeline.run(&config).await {
        Ok(_) => {
            println!(
                "\n{} {} deployed {}",
                CHECK,
                style(&config.release).bold(),
                style("successfully").green()
            );
            println!(
                "  The application will be available at {}",
                style(format!("https://{}", config.domain)).cyan()
            );
            Ok(())
        }
        Err(e) => {
            println!(
                "\n{} Deployment of {} {}",
                CROSS,
                style(&config.release).bold(),
                style("failed").red()
            );
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn validate(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating install configuration...", INFO);

    match InstallConfig::from_file(&cmd.file) {
        Ok(config) => {
            println!("{} Configuration is valid!", CHECK);
            println!("  Namespace: {}", style(&config.namespace).bold());
            println!("  Release: {}", style(&config.release).bold());
            println!("  Domain: {}", style(&config.domain).cyan());
            println!("  Multi-tenant: {}", style(config.multi_tenant).cyan());
            println!("  TLS: {}", style(config.tls).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}
