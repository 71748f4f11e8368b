//! Scrivener CLI - classify documents and append their fields to Excel workbooks.

use clap::Parser;
use scrivener_cli::commands;
use scrivener_cli::{logging, Cli, Command, Config, Formatter};

#[tokio::main]
async fn main() {
    // .env feeds RUST_LOG, SCRIVENER_CONFIG and the provider settings; a missing file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.log_level());

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> scrivener_cli::Result<i32> {
    let source = Config::discover(cli.config.as_deref())?;
    let mut config = Config::load(source.as_deref())?;
    config.apply_env(|name| std::env::var(name).ok())?;

    let formatter = Formatter::new(cli.format, !cli.no_color);

    match cli.command {
        Command::Run(args) => {
            config.apply_run_args(&args);
            let exit = commands::execute_run(&config, &formatter).await?;
            Ok(exit.code())
        }
        Command::Schema(args) => {
            commands::execute_schema(args, &config, &formatter)?;
            Ok(0)
        }
        Command::Stats => {
            commands::execute_stats(&config, &formatter)?;
            Ok(0)
        }
        Command::Config => {
            config.validate()?;
            commands::execute_config(&config, source.as_deref(), &formatter)?;
            Ok(0)
        }
    }
}
