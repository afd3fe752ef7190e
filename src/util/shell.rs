//! Centralized shell output and progress management.
//!
//! The Shell module provides a unified API for all CLI output:
//! - Status messages with consistent formatting
//! - Spinners for network round-trips (via indicatif)
//! - Timing spans that report how long an operation took
//!
//! Commands never manage spacing or colors directly. Status lines go to
//! stderr; only command results (flattened source, addresses) go to stdout.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only, no spinners
    Quiet,
    /// Default: status messages + spinners
    #[default]
    Normal,
    /// --verbose: immediate status lines, debug logs, no spinners
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use ANSI colors.
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Created,
    Installed,
    Published,
    Deployed,
    Finished,

    // In-progress statuses (cyan)
    Checking,
    Compiling,
    Deploying,
    Fetching,
    Publishing,
    Resolving,
    Uploading,

    // Info statuses (blue/default)
    Info,

    // Warning statuses (yellow)
    Warning,

    // Error status (red)
    Error,
}

impl Status {
    /// Get the display text for this status.
    fn as_str(&self) -> &'static str {
        match self {
            Status::Created => "Created",
            Status::Installed => "Installed",
            Status::Published => "Published",
            Status::Deployed => "Deployed",
            Status::Finished => "Finished",
            Status::Checking => "Checking",
            Status::Compiling => "Compiling",
            Status::Deploying => "Deploying",
            Status::Fetching => "Fetching",
            Status::Publishing => "Publishing",
            Status::Resolving => "Resolving",
            Status::Uploading => "Uploading",
            Status::Info => "Info",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    /// Get the ANSI color code for this status.
    fn color_code(&self) -> &'static str {
        match self {
            Status::Created
            | Status::Installed
            | Status::Published
            | Status::Deployed
            | Status::Finished => "\x1b[1;32m",
            Status::Checking
            | Status::Compiling
            | Status::Deploying
            | Status::Fetching
            | Status::Publishing
            | Status::Resolving
            | Status::Uploading => "\x1b[1;36m",
            Status::Info => "\x1b[1;34m",
            Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

/// Status column width.
const STATUS_WIDTH: usize = 12;

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
}

impl Shell {
    /// Create a new shell.
    pub fn new(verbosity: Verbosity, color: ColorChoice) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };

        Shell {
            verbosity,
            use_color,
        }
    }

    /// Create a shell from CLI flags. Quiet wins over verbose.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Shell::new(verbosity, color)
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Check if shell is in quiet mode.
    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    /// Check if shell is in verbose mode.
    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Check if colors are enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }


    /// Print `{status:>12} {message}` to stderr. Quiet shells only print
    /// errors.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() && status != Status::Error {
            return;
        }
        eprintln!("{} {}", self.format_status(status), msg);
    }

    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    fn format_status(&self, status: Status) -> String {
        let label = format!("{:>width$}", status.as_str(), width = STATUS_WIDTH);
        if self.use_color {
            format!("{}{}\x1b[0m", status.color_code(), label)
        } else {
            label
        }
    }

    /// Time an operation. Verbose shells announce the start; every shell
    /// reports the finish with the elapsed time.
    pub fn span(self: &Arc<Self>, status: Status, msg: impl Display) -> Span {
        if self.is_verbose() {
            self.status(status, &msg);
        }
        Span {
            shell: Arc::clone(self),
            start: Instant::now(),
        }
    }

    /// Spinner for a blocking network call.
    ///
    /// In quiet or verbose mode, or when stderr is not a terminal, the
    /// message is printed as a status line instead.
    pub fn spinner(self: &Arc<Self>, status: Status, msg: impl Display) -> Spinner {
        let interactive = !self.is_quiet() && !self.is_verbose() && io::stderr().is_terminal();
        if !interactive {
            self.status(status, msg);
            return Spinner { pb: None };
        }

        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(format!("{} {}", status.as_str(), msg));
        pb.enable_steady_tick(Duration::from_millis(80));
        Spinner { pb: Some(pb) }
    }
}

/// A timed operation started with [`Shell::span`].
pub struct Span {
    shell: Arc<Shell>,
    start: Instant,
}

impl Span {
    pub fn finish_with_message(self, status: Status, msg: impl Display) {
        let elapsed = format_duration(self.start.elapsed());
        self.shell.status(status, format!("{} in {}", msg, elapsed));
    }
}

/// A terminal spinner, cleared when finished or dropped.
pub struct Spinner {
    pb: Option<ProgressBar>,
}

impl Spinner {
    pub fn finish(&self) {
        if let Some(pb) = &self.pb {
            pb.finish_and_clear();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Format a duration in a human-readable way.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_modes() {
        let shell = Shell::new(Verbosity::Normal, ColorChoice::Never);
        assert!(!shell.is_quiet());
        assert!(!shell.is_verbose());
        assert!(!shell.use_color());

        let quiet_shell = Shell::new(Verbosity::Quiet, ColorChoice::Never);
        assert!(quiet_shell.is_quiet());
    }

    #[test]
    fn test_color_choice_parse() {
        assert_eq!("auto".parse::<ColorChoice>().unwrap(), ColorChoice::Auto);
        assert_eq!("always".parse::<ColorChoice>().unwrap(), ColorChoice::Always);
        assert_eq!("NEVER".parse::<ColorChoice>().unwrap(), ColorChoice::Never);
        assert!("invalid".parse::<ColorChoice>().is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "0.50s");
        assert_eq!(format_duration(Duration::from_secs(2)), "2.00s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn test_status_formatting() {
        let shell = Shell::new(Verbosity::Normal, ColorChoice::Never);

        let formatted = shell.format_status(Status::Published);
        assert_eq!(formatted.trim(), "Published");
        assert_eq!(formatted.len(), STATUS_WIDTH);
    }

    #[test]
    fn test_colored_status() {
        let shell = Shell::new(Verbosity::Normal, ColorChoice::Always);
        let formatted = shell.format_status(Status::Error);
        assert!(formatted.starts_with("\x1b[1;31m"));
        assert!(formatted.ends_with("\x1b[0m"));
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(
            Shell::from_flags(false, false, ColorChoice::Never).verbosity(),
            Verbosity::Normal
        );
        assert!(Shell::from_flags(true, false, ColorChoice::Never).is_quiet());
        assert!(Shell::from_flags(false, true, ColorChoice::Never).is_verbose());
        // Quiet takes precedence
        assert!(Shell::from_flags(true, true, ColorChoice::Never).is_quiet());
    }
}
