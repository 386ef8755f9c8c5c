use std::time::Duration;

use owo_colors::OwoColorize;
use readmode_core::{AttemptOutcome, Trace};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "ReadMode".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Fetch a readable article from any URL\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

fn format_ms(duration: Duration) -> String {
    format!("{:>8.2}ms", duration.as_secs_f64() * 1000.0)
}

fn print_attempt(strategy: &str, elapsed: Duration, outcome: &AttemptOutcome) {
    let label = format!("{strategy}:");
    match outcome {
        AttemptOutcome::Accepted => {
            eprintln!("  {:<22} {} {}", label.dimmed(), format_ms(elapsed), "accepted".bright_green())
        }
        AttemptOutcome::AcceptedDegraded => {
            eprintln!("  {:<22} {} {}", label.dimmed(), format_ms(elapsed), "accepted (degraded)".bright_yellow())
        }
        AttemptOutcome::Failed { reason, timed_out: true } => {
            eprintln!("  {:<22} {} {} {}", label.dimmed(), format_ms(elapsed), "timed out".bright_red(), reason.dimmed())
        }
        AttemptOutcome::Failed { reason, .. } => {
            eprintln!("  {:<22} {} {} {}", label.dimmed(), format_ms(elapsed), "failed".red(), reason.dimmed())
        }
    }
}

/// Print every attempted strategy, retrieval first
pub fn print_trace(trace: &Trace) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Retrieval".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    for attempt in &trace.retrieval {
        print_attempt(&attempt.strategy.to_string(), attempt.elapsed, &attempt.outcome);
    }

    if !trace.extraction.is_empty() {
        eprintln!("{}", "Extraction".bold().cyan());
        eprintln!("{}", "═".repeat(60).dimmed());
        for attempt in &trace.extraction {
            print_attempt(attempt.strategy.name(), attempt.elapsed, &attempt.outcome);
        }
    }
    eprintln!();
}

/// Print the total run time
pub fn print_total(total: Duration) {
    eprintln!("  {} {}\n", "Total:".bold().dimmed(), format_ms(total));
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
