use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = hetzner_cli::cli::Cli::parse();
    hetzner_cli::util::logging::init(cli.verbose);

    // Ctrl-C at a prompt is a cancellation, not a failure.
    hetzner_cli::util::terminal::install_cancel_handler();

    match cli.run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", hetzner_cli::cli::error_line(&e));
            ExitCode::FAILURE
        }
    }
}
