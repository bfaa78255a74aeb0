//! Colored status output for locally
//!
//! Uses owo-colors for terminal colors. Status lines go to stdout, warnings
//! and errors to stderr. Callers decide whether to print based on
//! `Config::quiet`; warnings are always shown.

use owo_colors::OwoColorize;

/// Print a stage header (blue, bold)
/// Example: "---[ download dependencies ]---"
pub fn action(message: &str) {
    println!("{} {}", "==>".blue().bold(), message.bold());
}

/// Print an action with a dependency counter
/// Example: "(1/5) unpacking msys2-base-i686-20160205.tar.xz"
pub fn action_numbered(current: usize, total: usize, message: &str) {
    println!(
        "{} {}",
        format!("({}/{})", current, total).cyan(),
        message
    );
}

/// Print a detail line (dimmed)
/// Example: "     checking hash/size for 7za920.zip"
pub fn detail(message: &str) {
    println!("     {}", message.dimmed());
}

/// Print a success message (green)
pub fn success(message: &str) {
    println!("{} {}", "==>".green().bold(), message.green());
}

/// Print an info message (cyan)
pub fn info(message: &str) {
    println!("{} {}", "::".cyan(), message);
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

/// Print a skip message (dimmed)
/// Example: "(skip) 7zip is unpacked"
pub fn skip(message: &str) {
    println!("{} {}", "(skip)".dimmed(), message.dimmed());
}
