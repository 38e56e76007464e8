use std::process::ExitCode;

fn main() -> ExitCode {
    aurum_cli::run()
}
