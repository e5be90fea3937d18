use std::process::ExitCode;

fn main() -> ExitCode {
    greencart_cli::run()
}
