//! Terminal styling for CLI output

use colored::*;

pub struct Theme;

impl Theme {
    pub fn header(text: &str) -> ColoredString {
        text.bold()
    }

    pub fn primary(text: &str) -> ColoredString {
        text.normal()
    }

    pub fn muted(text: &str) -> ColoredString {
        text.dimmed()
    }

    pub fn value(text: &str) -> ColoredString {
        text.cyan().bold()
    }

    pub fn command(text: &str) -> ColoredString {
        text.cyan()
    }

    pub fn success(text: &str) -> ColoredString {
        text.green()
    }

    pub fn created(text: &str) -> ColoredString {
        text.green()
    }

    pub fn deleted(text: &str) -> ColoredString {
        text.red()
    }

    pub fn warning(text: &str) -> ColoredString {
        text.yellow()
    }

    pub fn divider(width: usize) -> ColoredString {
        "─".repeat(width).dimmed()
    }

    pub fn divider_bold(width: usize) -> ColoredString {
        "━".repeat(width).normal()
    }
}
