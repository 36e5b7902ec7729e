//! Terminal styling for scan reports and listings.

use colored::Colorize;

/// Styles for each kind of report line.
pub(crate) struct Theme;

impl Theme {
    /// Section title, bold cyan.
    pub(crate) fn header(text: &str) -> String {
        text.bold().cyan().to_string()
    }

    /// A plugin that loaded.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {text}", "loaded".green())
    }

    /// A file that was claimed but failed.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "failed".red().bold(), text.red())
    }

    /// An unclaimed file whose extension is ignorable.
    pub(crate) fn skipped(text: &str) -> String {
        format!("{} {}", "skipped".dimmed(), text.dimmed())
    }

    /// An unclaimed file whose extension is not ignorable.
    pub(crate) fn unclaimed(text: &str) -> String {
        format!("{} {text}", "no loader".yellow())
    }

    pub(crate) fn dimmed(text: &str) -> String {
        text.dimmed().to_string()
    }
}
