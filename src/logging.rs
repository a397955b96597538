//! Console logging for the command line programs.
//!
//! The library itself only uses the `log` macros; a program decides where the
//! messages go by calling [`init_logging`] once at startup.
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{runtime::ConfigErrors, Appender, Root},
    encode::pattern::PatternEncoder,
    Config,
};

pub const LOG_PATTERN: &str = "{h({d(%Y-%m-%d %H:%M:%S)} [{l}] from line {L} in {M})} - {m}{n}";

/// Logging configuration writing everything at `level` or above to stderr.
pub fn logging_config(level: log::LevelFilter) -> Result<Config, ConfigErrors> {
    // stdout is reserved for program output (factors, tables, resampled series)
    let stderr = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .target(Target::Stderr)
        .build();

    Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
}

pub fn init_logging(level: log::LevelFilter) {
    let config = logging_config(level).expect("Failed to configure logger");
    log4rs::init_config(config).expect("Failed to initialize logger");
}
