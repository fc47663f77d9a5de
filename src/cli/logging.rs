// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::sync::atomic::{AtomicBool, Ordering};

use colored::{ColoredString, Colorize};

/// Global verbosity flag.
static VERBOSE: AtomicBool = AtomicBool::new(true);

/// Set the global verbosity flag.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

/// Check if verbose output is enabled.
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Marker printed in front of a verdict: red cross for bad posture, green tick otherwise.
pub fn verdict_marker(is_bad: bool) -> ColoredString {
    if is_bad { "✗".red().bold() } else { "✓".green().bold() }
}

/// Section title with a rule of the same width underneath.
pub fn section_title(title: &str) -> String {
    format!("{title}\n{}", "─".repeat(title.chars().count()))
}

/// Macro for standard info messages.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        println!("{}", format!($($arg)*));
    }};
}

/// Macro for warning messages.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        eprintln!("{} {}", "WARNING ⚠️".yellow().bold(), format!($($arg)*));
    }};
}

/// Macro for error messages.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        eprintln!("{} {}", "Error:".red().bold(), format!($($arg)*));
    }};
}

/// Macro for success messages.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {{
        if $crate::cli::logging::is_verbose() {
            println!("{} {}", $crate::cli::logging::verdict_marker(false), format!($($arg)*));
        }
    }};
}

/// Macro for a posture verdict line, colored by outcome.
#[macro_export]
macro_rules! verdict {
    ($bad:expr, $($arg:tt)*) => {{
        use colored::Colorize;
        let bad: bool = $bad;
        let text = format!($($arg)*);
        let text = if bad { text.red().bold() } else { text.green() };
        println!("{} {}", $crate::cli::logging::verdict_marker(bad), text);
    }};
}

/// Macro for verbose messages.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {{
        if $crate::cli::logging::is_verbose() {
            println!("{}", format!($($arg)*));
        }
    }};
}

/// Macro for section headers.
#[macro_export]
macro_rules! section {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        if $crate::cli::logging::is_verbose() {
            println!();
            println!("{}", $crate::cli::logging::section_title(&format!($($arg)*)).cyan().bold());
        }
    }};
}
