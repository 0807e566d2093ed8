//! Whitespace normalisation of rendered output.

use regex::Regex;
use std::sync::LazyLock;

/// Three or more consecutive line breaks, allowing blank-but-indented lines.
static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").unwrap_or_else(|_| unreachable!()));

/// Blank lines at the start of the output.
static LEADING_BLANK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A(?:[ \t]*\n)+").unwrap_or_else(|_| unreachable!()));

/// Collapses runs of blank lines to a single blank line and removes blank
/// lines at the start.
pub(crate) fn tidy(text: &str) -> String {
    let collapsed = BLANK_RUN.replace_all(text, "\n\n");
    LEADING_BLANK.replace(&collapsed, "").into_owned()
}
