//! Output helpers for consistent CLI output.
//!
//! Status lines go to stdout with a colored prefix, errors go to stderr.
//! Diagnostics from the library are separate and go through `tracing`.

use owo_colors::OwoColorize;

/// Standard output helper for consistent CLI formatting.
pub struct Output;

impl Output {
    /// Print a success message with a green checkmark.
    ///
    /// Example: `✓ Device matched`
    pub fn success(msg: impl AsRef<str>) {
        println!("{} {}", "✓".green().bold(), msg.as_ref());
    }

    /// Print an error message with a red X to stderr.
    ///
    /// Example: `✗ Cannot connect to system bus`
    pub fn error(msg: impl AsRef<str>) {
        eprintln!("{} {}", "✗".red().bold(), msg.as_ref().red());
    }

    /// Print a warning message with a yellow warning symbol.
    pub fn warning(msg: impl AsRef<str>) {
        println!("{} {}", "⚠".yellow(), msg.as_ref());
    }

    /// Print an item in a list (indented).
    pub fn list_item(msg: impl AsRef<str>) {
        println!("  {}", msg.as_ref());
    }

    /// Print a key-value pair with alignment.
    ///
    /// Example: `  Mounted:       yes`
    pub fn kv(key: impl AsRef<str>, value: impl AsRef<str>) {
        println!("  {:<14} {}", format!("{}:", key.as_ref()).cyan(), value.as_ref());
    }

    /// Print a hint/suggestion message (indented with arrow).
    pub fn hint(msg: impl AsRef<str>) {
        println!("  {} {}", "→".cyan(), msg.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_methods_dont_panic() {
        Output::success("test");
        Output::error("test");
        Output::warning("test");
        Output::list_item("test");
        Output::kv("key", "value");
        Output::hint("test");
    }
}
