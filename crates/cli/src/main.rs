use std::process::ExitCode;

fn main() -> ExitCode {
    metrika_cli::run()
}
