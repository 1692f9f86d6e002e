use encore_dependencies::{better_panic, kankyo};
use tracing_subscriber::EnvFilter;

const QUIET_MODULES: [&str; 4] = ["sqlx", "sqlx::query", "hyper", "reqwest"];

pub fn logging() {
    better_panic::install();
    let env_loaded = kankyo::load(false);
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info"),
    };
    let filter = QUIET_MODULES.iter().fold(filter, |filter, module| {
        match format!("{}=warn", module).parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
    // only now is there a subscriber to report to
    if let Err(e) = env_loaded {
        info!("couldn't load .env file: {}, this is probably fine", e);
    }
}
