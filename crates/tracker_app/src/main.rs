mod app;
mod cli;
mod effects;
mod logging;
mod persistence;
mod render;

fn main() -> std::process::ExitCode {
    match cli::parse(std::env::args().skip(1)) {
        Ok(options) => app::run(options),
        // An empty message means the user asked for help.
        Err(message) if message.is_empty() => {
            println!("{}", cli::USAGE);
            std::process::ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            eprintln!();
            eprintln!("{}", cli::USAGE);
            std::process::ExitCode::FAILURE
        }
    }
}
