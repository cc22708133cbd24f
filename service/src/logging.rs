use crate::config::Config;
use log::{LevelFilter, SetLoggerError};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// HTTP stack targets that only add noise below TRACE.
const HTTP_STACK_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "h2"];

pub struct Logger {}

impl Logger {
    /// Install the terminal logger at the configured level.
    ///
    /// Output goes to stderr so that sample results printed on stdout stay machine
    /// readable. `esign-auth` emits `tracing` events, which reach this logger through
    /// tracing's `log` forwarding under their module targets.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        TermLogger::init(
            config.log_level_filter,
            Self::log_config(config.log_level_filter),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )
    }

    fn log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder
            .set_time_format_rfc3339()
            .set_target_level(LevelFilter::Error)
            .set_location_level(LevelFilter::Off);

        for target in Self::ignored_targets(level) {
            builder.add_filter_ignore_str(*target);
        }

        builder.build()
    }

    fn ignored_targets(level: LevelFilter) -> &'static [&'static str] {
        if level == LevelFilter::Trace {
            &[]
        } else {
            HTTP_STACK_TARGETS
        }
    }
}
