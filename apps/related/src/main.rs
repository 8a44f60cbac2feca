mod cli;
mod command;
mod config;
mod error;
mod progress;

use error::WrapErr;

use clap::CommandFactory;
use clap::Parser;
use tracing::Level;

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    color_eyre::install()?;
    let command_line = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(log_level(command_line.verbose))
        .with_writer(std::io::stderr)
        .init();

    if let Some(command) = command_line.command {
        let mut cfg = config::Config::load(command_line.config.as_deref())
            .wrap_err("Load configuration error")?;

        let cmd: Box<dyn command::Command> = match command {
            cli::Commands::Generate(args) => {
                cfg.merge_args(&args);
                Box::new(command::GenerateCommand::new(cfg, args.languages))
            }
            cli::Commands::Languages { path } => {
                Box::new(command::LanguagesCommand::new(cfg, path))
            }
            cli::Commands::ClearCache => Box::new(command::ClearCacheCommand::new(cfg)),
        };
        cmd.execute().await?;
    } else {
        cli::Cli::command().print_help()?;
    }

    Ok(())
}
