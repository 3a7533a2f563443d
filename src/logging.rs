use env_logger::Env;

/// Installs `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
///
/// Calling this more than once leaves the first logger in place.
pub fn init() {
    let installed = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .try_init()
        .is_ok();
    if installed {
        log::debug!("logging initialized");
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_twice_is_harmless() {
        super::init();
        super::init();
        log::info!("still logging");
    }
}
