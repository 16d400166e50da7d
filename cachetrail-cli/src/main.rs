//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = cachetrail_cli::run() {
        eprintln!("cachetrail: {err}");
        std::process::exit(1);
    }
}
