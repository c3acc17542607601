//! Tracing setup shared by the service binaries.

use tracing_subscriber::{filter::ParseError, fmt, prelude::*, EnvFilter};

/// Environment variable selecting JSON log lines.
const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Crates shared by every service.
const PIPELINE_CRATES: [&str; 3] = ["incident", "notify", "cluster"];

/// Initialize the global subscriber.
///
/// A set `RUST_LOG` is used as is. Otherwise the pipeline crates and
/// `targets` (the calling service's crate and binary) log at `info` and
/// everything else at `warn`. Set `LOG_FORMAT=json` for structured output.
pub fn init_tracing(targets: &[&str]) -> Result<(), ParseError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(targets))?,
    };

    let json = std::env::var(ENV_LOG_FORMAT).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .with(filter)
        .init();

    Ok(())
}

/// Filter used when `RUST_LOG` is unset.
fn default_directives(targets: &[&str]) -> String {
    std::iter::once("warn".to_string())
        .chain(
            PIPELINE_CRATES
                .iter()
                .chain(targets)
                .map(|target| format!("{target}=info")),
        )
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_service_crates() {
        let directives = default_directives(&["diagnosis", "diagnosis_server"]);
        assert_eq!(
            directives,
            "warn,incident=info,notify=info,cluster=info,diagnosis=info,diagnosis_server=info"
        );
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
