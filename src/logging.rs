//! Structured logging setup.
//!
//! Installs a `tracing` subscriber on stderr:
//! - `RUST_LOG` wins when set
//! - otherwise the level follows `-v` count (warn, info, debug, trace)
//! - `--quiet` lowers it to error
//! - `VOXBRIDGE_LOG_FORMAT=json` switches to JSON lines

use tracing_subscriber::EnvFilter;

/// Default filter directive for a verbosity level.
pub fn default_directive(verbosity: u8, quiet: bool) -> String {
    let level = if quiet {
        "error"
    } else {
        match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    format!("voxbridge={}", level)
}

fn json_requested() -> bool {
    std::env::var("VOXBRIDGE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(verbosity: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity, quiet)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let installed = if json_requested() {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    if installed.is_err() {
        tracing::trace!("Tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_does_not_panic_when_called_twice() {
        init(0, false);
        init(2, false);
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(default_directive(0, false), "voxbridge=warn");
        assert_eq!(default_directive(1, false), "voxbridge=info");
        assert_eq!(default_directive(2, false), "voxbridge=debug");
        assert_eq!(default_directive(7, false), "voxbridge=trace");
    }

    #[test]
    fn quiet_overrides_verbosity() {
        assert_eq!(default_directive(3, true), "voxbridge=error");
    }
}
