use log::error;
use std::env;
use std::process;

use outbreak::data_management;
use outbreak::logging;

fn main() {
    // process command line arguments: model root directory and an optional log level
    let args: Vec<_> = env::args().collect();
    let model_root = if args.len() > 1 {
        &args[1]
    } else {
        eprintln!("Usage: outbreak <model directory> [log level]");
        process::exit(2);
    };

    let level = match args.get(2).map(|l| logging::parse_level(l)) {
        Some(Ok(level)) => level,
        Some(Err(e)) => {
            eprintln!("{}", e);
            process::exit(2);
        }
        None => logging::DEFAULT_LEVEL,
    };
    if let Err(e) = logging::init(level) {
        eprintln!("{}", e);
        process::exit(1);
    }

    if let Err(e) = data_management::run_model(model_root) {
        error!("{}", e);
        process::exit(1);
    }
}
