use clap::Parser;
use habit_app::app::run;
use habit_app::cli::Cli;
use habit_app::config::AppConfig;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(mode) = cli.mode {
        config.view_mode = mode;
    }
    let format = cli.output_format();
    let cursor = cli.date;
    let command = cli.into_command();

    let stdout = std::io::stdout();
    if let Err(err) = run(&config, cursor, command, format, &mut stdout.lock()) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
