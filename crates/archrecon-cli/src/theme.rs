//! CLI theme and styling.

use colored::Colorize;

/// Inner width of [`Theme::review_box`].
const BOX_WIDTH: usize = 60;

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// Format an info message.
    pub(crate) fn info(text: &str) -> String {
        format!("{} {}", "i".blue(), text)
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// Format a separator line.
    pub(crate) fn separator() -> String {
        "━".repeat(50).dimmed().to_string()
    }

    /// Box a pending tool call for the reviewer.
    pub(crate) fn review_box(title: &str, content: &str) -> String {
        let inner = BOX_WIDTH.saturating_sub(2);
        let top = format!("╭{}╮", "─".repeat(inner));
        let bottom = format!("╰{}╯", "─".repeat(inner));
        let empty = format!("│{:w$}│", "", w = inner);

        let pad_line = |text: &str| -> String {
            let visible_len = strip_ansi(text).chars().count();
            let padding = BOX_WIDTH.saturating_sub(4).saturating_sub(visible_len);
            format!("│ {text}{:p$} │", "", p = padding)
        };

        let mut lines = vec![
            top.yellow().to_string(),
            pad_line(&title.bold().to_string()),
            empty.yellow().to_string(),
        ];
        for line in content.lines() {
            lines.push(pad_line(line));
        }
        lines.push(bottom.yellow().to_string());
        lines.join("\n")
    }

    /// Format a key-value pair.
    pub(crate) fn kv(key: &str, value: &str) -> String {
        format!("{}: {}", key.bold(), value)
    }

    /// Format a check result label.
    pub(crate) fn status(ok: bool) -> String {
        if ok {
            "OK".green().to_string()
        } else {
            "FAIL".red().to_string()
        }
    }
}

/// Strip ANSI escape codes from a string for visible-length calculation.
fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut in_escape = false;
    for c in s.chars() {
        if in_escape {
            if c.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if c == '\x1b' {
            in_escape = true;
        } else {
            result.push(c);
        }
    }
    result
}

/// Print a banner for the CLI.
pub(crate) fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!("{} {}", "archrecon".cyan().bold(), format!("v{version}").dimmed());
    println!("{}", "Repository reconnaissance and architecture diagrams".dimmed());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1;31mhello\x1b[0m"), "hello");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn test_review_box_lines_have_equal_width() {
        let boxed = Theme::review_box("Review", "Tool: git_clone\nArguments: {}");
        let widths: Vec<usize> = boxed
            .lines()
            .map(|l| strip_ansi(l).chars().count())
            .collect();
        assert!(widths.iter().all(|w| *w == BOX_WIDTH));
    }
}
