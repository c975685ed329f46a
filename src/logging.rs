use crate::config::LogConfig;
use log::LevelFilter;
use std::io::Write;

/// Initializes the process logger. `RUST_LOG`, when set, wins over the
/// configured level.
pub fn init(config: &LogConfig) {
    let level = match std::env::var("RUST_LOG") {
        Ok(value) => value,
        Err(_) => config.level.clone(),
    };

    let filter = parse_level(&level);

    let mut builder = env_logger::Builder::new();
    builder.filter_level(filter);

    if config.format == "json" {
        builder.format(|buf, record| {
            let line = serde_json::json!({
                "ts": chrono::Utc::now().to_rfc3339(),
                "level": record.level().to_string(),
                "target": record.target(),
                "msg": record.args().to_string(),
            });
            writeln!(buf, "{}", line)
        });
    }

    // A second init (tests, embedded use) is not fatal.
    let _ = builder.try_init();
}

fn parse_level(level: &str) -> LevelFilter {
    match level {
        "debug" => LevelFilter::Debug,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}
