//! Terminal rendering of errors.
//!
//! An error is shown as one `error:` line, then `=` lines of context, then
//! numbered suggestions.

use std::fmt;

/// Suggestions shared by the commands.
pub mod suggestions {
    /// Missing project descriptor or credentials.
    pub const CONFIGURE: &str =
        "Check config.json and the .env file in the project root (WALLET_ADDRESS, PINATA_JWT)";

    /// Package not in the registry.
    pub const CHECK_NAME: &str = "Check the component name, or drop `@version` to install the latest release";

    /// Registry, store or chain failures.
    pub const NETWORK: &str = "Check your network connection and the endpoints in .jutsu/config.toml";

    /// Not enough balance to register.
    pub const FUND_WALLET: &str = "Deposit some ETH in your wallet to pay for gas fees";

    /// Precheck rejected the name/version.
    pub const BUMP_VERSION: &str = "Bump the version in config.json or choose another name";

    pub const BREAK_CYCLE: &str = "Move the shared declarations into a file both can import";

    pub const BUILD_FAILED: &str = "Run `jutsu flatten <file>` to inspect the source handed to the compiler";
}

const RED: &str = "\x1b[1;31m";
const GREEN: &str = "\x1b[1;32m";
const RESET: &str = "\x1b[0m";

/// An error message with context lines and suggested fixes.
#[derive(Debug, Clone, Default)]
pub struct Diagnostic {
    pub message: String,
    pub context: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            ..Diagnostic::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Render for a terminal, with ANSI colors when `color` is set.
    pub fn format(&self, color: bool) -> String {
        let paint = |code: &str, text: &str| {
            if color {
                format!("{}{}{}", code, text, RESET)
            } else {
                text.to_string()
            }
        };

        let mut out = format!("{}: {}\n", paint(RED, "error"), self.message);
        for line in &self.context {
            out.push_str(&format!("  = {}\n", line));
        }

        if !self.suggestions.is_empty() {
            out.push_str(&format!("\n{}: consider:\n", paint(GREEN, "help")));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                out.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("compilation failed")
            .with_context("DeclarationError: Identifier not found")
            .with_suggestion(suggestions::BUILD_FAILED);

        let output = diag.format(false);
        assert!(output.starts_with("error: compilation failed\n"));
        assert!(output.contains("  = DeclarationError"));
        assert!(output.contains("help: consider:\n  1. Run `jutsu flatten"));
    }

    #[test]
    fn test_color_wraps_labels_only() {
        let output = Diagnostic::error("boom").format(true);
        assert!(output.starts_with("\x1b[1;31merror\x1b[0m: boom"));
    }

    #[test]
    fn test_no_suggestions_no_help() {
        assert!(!Diagnostic::error("boom").to_string().contains("help"));
    }
}
