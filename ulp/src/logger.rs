#[cfg(feature = "tui")]
use core::time::Duration;
use std::{
    borrow::Cow,
    fmt::Display,
};

use colored::Colorize;
use indicatif::{
    ProgressBar,
    ProgressStyle,
};

/// How much output a [`Logger`] produces
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Only errors are shown
    Quiet,
    /// Errors, warnings and info messages are shown
    #[default]
    Normal,
    /// Everything including debug messages is shown
    Verbose,
}

/// The Logger is handed to every stage of the toolchain and decides which messages reach the terminal.
///
/// All output goes to stderr so that metadata written to stdout stays intact.
pub struct Logger {
    bar: ProgressBar,
    running: bool,
    prefix: Option<String>,
    verbosity: Verbosity,
}

#[cfg(feature = "tui")]
const ANIMATION: &[&str; 9] = &[".  ", ".. ", "...", " ..", "  .", " ..", "...", "..", ""];

#[cfg(not(feature = "tui"))]
const ANIMATION: &[&str; 2] = &["...", ""];

impl Logger {
    /// Create a logger that shows a spinner with the current stage next to its messages
    pub fn spinner(verbosity: Verbosity) -> Self {
        let bar = if verbosity == Verbosity::Quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();

            if let Ok(style) = ProgressStyle::with_template("{prefix:.magenta/red} {msg} {spinner}") {
                bar.set_style(style.tick_strings(ANIMATION));
            }

            bar.set_prefix("[ulp]");
            bar
        };

        Self {
            bar,
            running: false,
            prefix: None,
            verbosity,
        }
    }

    /// Create a logger that only reports errors and never draws anything
    pub fn silent() -> Self {
        Self::spinner(Verbosity::Quiet)
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn set_prefix<S: Into<String>>(&mut self, prefix: S) {
        self.prefix = Some(prefix.into());
    }

    pub fn clear_prefix(&mut self) {
        self.prefix = None;
    }

    pub fn set_title(&mut self, title: impl Into<Cow<'static, str>>) {
        if self.verbosity == Verbosity::Quiet {
            return;
        }

        #[cfg(feature = "tui")]
        if !self.running {
            self.bar.enable_steady_tick(Duration::from_millis(100));
            self.running = true;
        }
        self.bar.set_message(title.into());
    }

    fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.bar.finish_and_clear();
        }
    }

    fn emit<L: Display, S: AsRef<str>>(&self, level: L, msg: S) {
        let line = if let Some(prefix) = &self.prefix {
            format!("{} {}{}{} {}", level, "(".bold(), prefix.bold(), ")".bold(), msg.as_ref())
        } else {
            format!("{} {}", level, msg.as_ref())
        };

        self.bar.suspend(|| eprintln!("{}", line));
    }

    pub fn info<S: AsRef<str>>(&self, msg: S) {
        if self.verbosity != Verbosity::Quiet {
            self.emit("[ulp::INFO]".blue().bold(), msg);
        }
    }

    pub fn warning<S: AsRef<str>>(&self, msg: S) {
        if self.verbosity != Verbosity::Quiet {
            self.emit("[ulp::WARN]".yellow().bold(), msg);
        }
    }

    pub fn debug<S: AsRef<str>>(&self, msg: S) {
        if self.verbosity == Verbosity::Verbose {
            self.emit("[ulp::DEBUG]".black().on_white(), msg);
        }
    }

    pub fn error<S: AsRef<str>>(&self, msg: S) {
        self.emit("[ulp::ERROR]".red().bold(), msg);
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.stop();
    }
}
