use clap::Parser;
use colored::*;
use phylocfg::cli::Cli;
use phylocfg::Locator;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    // PHYLOCFG_LOG overrides the level picked from --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PHYLOCFG_LOG")
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let selection = cli.selection()?;
    let locator = Locator::from_env();

    let config = phylocfg::generate(&selection, &cli.output, cli.overwrite, &locator)?;

    if cli.verbose {
        eprintln!(
            "Wrote {} stages ({}) to {}",
            config.len(),
            config
                .stages()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            cli.output.display()
        );
    }
    Ok(())
}
