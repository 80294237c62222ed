use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Install the global subscriber, `RUST_LOG` picks the filter (default `info`)
///
/// Safe to call more than once, only the first call installs anything.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let result = fmt().with_env_filter(filter).with_target(true).try_init();
        if let Err(error) = result {
            eprintln!("unable to install tracing subscriber: {error}");
        }
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_is_idempotent() {
        super::init();
        super::init();
        tracing::info!("logging initialised");
    }
}
