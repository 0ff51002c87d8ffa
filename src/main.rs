use std::process::ExitCode;

fn main() -> ExitCode {
    teamboard::run()
}
