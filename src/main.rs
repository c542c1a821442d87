mod cli;

use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    shell_updater::logging::init(cli.output.verbose);

    if let Err(e) = cli::run(cli).await {
        cli::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
