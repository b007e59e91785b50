//! Consistent CLI output formatting
//!
//! All user-facing output goes through these helpers so commands look
//! uniform: errors and warnings to stderr, results to stdout.

use colored::Colorize;

/// Print an error message to stderr (red).
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{} {}", "error:".red().bold(), msg);
}

/// Print a warning message to stderr (yellow).
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}", format!("{msg}").yellow());
}

/// Print a success message with a green check mark.
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an indented success detail line.
pub fn success_detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "✓".green(), msg);
}

/// Print an indented failure line with a red cross.
pub fn failure(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "✗".red(), msg);
}

/// Print an action with a green label, e.g. "decision: ...".
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", format!("{label}:").green().bold(), msg);
}

/// Print a section header (cyan, bold).
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", format!("{msg}").cyan().bold());
}

/// Print an added line in diff style (green "+").
pub fn diff_add(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "+".green(), msg);
}

/// Print a removed line in diff style (red "-").
pub fn diff_remove(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "-".red(), msg);
}

/// Print an indented detail line.
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {msg}");
}

/// Print a plain informational line.
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{msg}");
}
