use std::process;

use triangle_loop::{logging, AppConfig, EXIT_INIT_FAILURE};

fn main() {
    logging::init();
    if let Err(err) = triangle_loop::run(&AppConfig::red()) {
        log::error!("{}", err);
        process::exit(EXIT_INIT_FAILURE);
    }
}
