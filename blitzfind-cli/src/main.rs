//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = blitzfind_cli::init_logging() {
        eprintln!("blitzfind: logging disabled: {err}");
    }

    if let Err(err) = blitzfind_cli::run() {
        eprintln!("blitzfind: {err}");
        std::process::exit(1);
    }
}
