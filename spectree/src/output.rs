// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::{Args, ValueEnum};
use owo_colors::{OwoColorize, Style, style};
use std::{
    fmt,
    io::{self, BufWriter, Write},
    sync::Once,
};
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
    level_filters::LevelFilter,
    warn,
};
use tracing_subscriber::{
    Layer,
    filter::{ParseError, Targets},
    fmt::{FmtContext, FormatEvent, FormatFields, format},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

pub(crate) mod clap_styles {
    use clap::builder::{
        Styles,
        styling::{AnsiColor, Effects},
    };

    pub(crate) const fn style() -> Styles {
        let heading = AnsiColor::Green.on_default().effects(Effects::BOLD);
        Styles::styled()
            .header(heading)
            .usage(heading)
            .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
            .placeholder(AnsiColor::Cyan.on_default())
            .error(AnsiColor::Red.on_default().effects(Effects::BOLD))
    }
}

/// The environment variable used to filter log output, in `tracing` target syntax.
pub const LOG_ENV: &str = "SPECTREE_LOG";

/// The target for log lines that are printed without a level heading.
pub(crate) const NO_HEADING_TARGET: &str = "spectree::no_heading";

#[derive(Copy, Clone, Debug, Args)]
#[must_use]
pub(crate) struct OutputOpts {
    /// Verbose output
    #[arg(long, short, global = true, env = "SPECTREE_VERBOSE")]
    pub(crate) verbose: bool,

    /// Produce color output: auto, always, never
    #[arg(
        long,
        value_enum,
        default_value_t,
        hide_possible_values = true,
        global = true,
        value_name = "WHEN",
        env = "SPECTREE_COLOR"
    )]
    pub(crate) color: Color,
}

impl OutputOpts {
    /// Installs the logger and returns the resulting context.
    pub(crate) fn init(self) -> OutputContext {
        init_logger(self.color.should_colorize(supports_color::Stream::Stderr));
        OutputContext {
            verbose: self.verbose,
            color: self.color,
        }
    }
}

/// Output settings for a single invocation.
#[derive(Copy, Clone, Debug)]
#[must_use]
pub struct OutputContext {
    pub(crate) verbose: bool,
    pub(crate) color: Color,
}

impl OutputContext {
    /// Returns the style used to highlight paths and counts in error messages.
    pub fn stderr_emphasis(&self) -> Style {
        if self.color.should_colorize(supports_color::Stream::Stderr) {
            style().bold()
        } else {
            Style::new()
        }
    }

    pub(crate) fn colorize_stdout(&self) -> bool {
        self.color.should_colorize(supports_color::Stream::Stdout)
    }
}

/// When to produce colored output.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, ValueEnum)]
#[must_use]
pub enum Color {
    /// Colorize if the stream is a terminal that supports it.
    #[default]
    Auto,
    /// Always colorize.
    Always,
    /// Never colorize.
    Never,
}

impl Color {
    pub(crate) fn should_colorize(self, stream: supports_color::Stream) -> bool {
        match self {
            Color::Auto => supports_color::on_cached(stream).is_some(),
            Color::Always => true,
            Color::Never => false,
        }
    }
}

static INIT_LOGGER: Once = Once::new();

fn init_logger(colorize: bool) {
    INIT_LOGGER.call_once(|| {
        let filter = std::env::var(LOG_ENV).unwrap_or_default();
        let (targets, parse_error) = match log_targets(&filter) {
            Ok(targets) => (targets, None),
            Err(error) => (default_targets(), Some(error)),
        };

        let layer = tracing_subscriber::fmt::layer()
            .event_format(LevelFormatter { colorize })
            .with_writer(io::stderr)
            .with_filter(targets);

        // A global subscriber may already be set, for example in tests.
        _ = tracing_subscriber::registry().with(layer).try_init();

        if let Some(error) = parse_error {
            warn!("ignoring invalid {LOG_ENV} value `{filter}`: {error}");
        }
    });
}

/// Parses the value of [`LOG_ENV`]. An empty value means info and above.
fn log_targets(filter: &str) -> Result<Targets, ParseError> {
    if filter.trim().is_empty() {
        Ok(default_targets())
    } else {
        filter.parse()
    }
}

fn default_targets() -> Targets {
    Targets::new().with_default(LevelFilter::INFO)
}

/// Prints each event as `level: message`, with no timestamps or spans.
struct LevelFormatter {
    colorize: bool,
}

impl LevelFormatter {
    fn heading(&self, level: Level) -> (&'static str, Style) {
        let (heading, colored) = match level {
            Level::ERROR => ("error", style().red().bold()),
            Level::WARN => ("warning", style().yellow().bold()),
            Level::INFO => ("info", style().bold()),
            Level::DEBUG => ("debug", style().dimmed()),
            Level::TRACE => ("trace", style().dimmed()),
        };
        (heading, if self.colorize { colored } else { Style::new() })
    }
}

impl<S, N> FormatEvent<S, N> for LevelFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        if metadata.target() != NO_HEADING_TARGET {
            let (heading, heading_style) = self.heading(*metadata.level());
            write!(writer, "{}: ", heading.style(heading_style))?;
        }

        let mut message = MessageWriter {
            writer: &mut writer,
            result: Ok(()),
        };
        event.record(&mut message);
        message.result?;

        writeln!(writer)
    }
}

/// Writes the `message` field of an event and drops the others.
struct MessageWriter<'writer, 'a> {
    writer: &'a mut format::Writer<'writer>,
    result: fmt::Result,
}

impl Visit for MessageWriter<'_, '_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" && self.result.is_ok() {
            self.result = write!(self.writer, "{value:?}");
        }
    }
}

/// Where command output goes. Tests capture stdout in memory.
#[derive(Default)]
pub enum OutputWriter {
    /// Buffered process stdout.
    #[default]
    Normal,
    /// Output captured.
    #[cfg(test)]
    Test {
        /// stdout capture
        stdout: Vec<u8>,
    },
}

impl OutputWriter {
    pub(crate) fn stdout_writer(&mut self) -> Box<dyn Write + '_> {
        match self {
            Self::Normal => Box::new(BufWriter::new(io::stdout())),
            #[cfg(test)]
            Self::Test { stdout } => Box::new(stdout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("" ; "empty")]
    #[test_case("  " ; "whitespace")]
    fn empty_log_filter_is_info(filter: &str) {
        let targets = log_targets(filter).expect("empty filter is valid");
        assert!(targets.would_enable("spectree_runner::scanner", &Level::INFO));
        assert!(!targets.would_enable("spectree_runner::scanner", &Level::DEBUG));
    }

    #[test]
    fn log_filter_by_target() {
        let targets = log_targets("warn,spectree_runner::scanner=debug").expect("valid filter");
        assert!(targets.would_enable("spectree_runner::scanner", &Level::DEBUG));
        assert!(!targets.would_enable("spectree_runner::batcher", &Level::INFO));
        assert!(targets.would_enable("spectree_runner::batcher", &Level::WARN));
    }

    #[test]
    fn invalid_log_filter() {
        log_targets("spectree=loud").expect_err("unknown level is rejected");
    }

    #[test]
    fn headings_are_plain_without_color() {
        let formatter = LevelFormatter { colorize: false };
        let (heading, style) = formatter.heading(Level::WARN);
        assert_eq!(heading, "warning");
        assert_eq!(format!("{}", heading.style(style)), "warning");
    }
}
