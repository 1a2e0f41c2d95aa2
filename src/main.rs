use clap::Parser;
use miette::Result;
use podrecon::cli::{Cli, Commands, LogLevel};
use tracing_subscriber::EnvFilter;

fn initialize_tracing(log_level: LogLevel) {
    let filter = EnvFilter::new(log_level.to_filter_directive());

    // Logs go to stderr so exported data on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    initialize_tracing(cli.global.log_level);
    let global = &cli.global;

    match cli.command {
        Commands::Order(cmd) => podrecon::cli::commands::order::run(cmd, global),
        Commands::Search(args) => podrecon::cli::commands::search::run(args, global),
        Commands::Repo(cmd) => podrecon::cli::commands::repo::run(cmd, global),
        Commands::Template(args) => podrecon::cli::commands::template::run(args),
        Commands::Completions(args) => podrecon::cli::commands::completions::run(args),
    }
}
