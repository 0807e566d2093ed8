//! Built-in template functions.
//!
//! Every function is total: a missing variable renders as empty text and a
//! bad argument degrades to empty text with a [`FunctionError::Degraded`].

use chrono::format::{Item, StrftimeItems};
use thiserror::Error as ThisError;

use super::expression::number_literal;
use super::scope::Lookup;
use crate::models::{RenderContext, Value, format_float};

/// Names of the built-in functions.
pub const KNOWN_FUNCTIONS: &[&str] = &[
    "truncate",
    "date_format",
    "tag_list",
    "number_format",
    "conditional",
    "length",
    "default",
];

/// Appended by `truncate` when text is cut.
const ELLIPSIS: &str = "...";

/// Largest precision accepted by `number_format(x, "decimal_N")`.
const MAX_DECIMALS: usize = 12;

/// Why a function call produced no output.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum FunctionError {
    /// The name is not a built-in function.
    #[error("unknown function")]
    Unknown,
    /// The arguments could not be used.
    #[error("{0}")]
    Degraded(String),
}

/// Calls a function against a context, rendering failures as empty text.
#[must_use]
pub fn call_function(name: &str, args: &str, context: &RenderContext) -> String {
    call(name, args, context).unwrap_or_else(|e| {
        tracing::warn!(function = name, error = %e, "Function rendered empty");
        String::new()
    })
}

/// Calls a function with raw argument source.
///
/// # Errors
///
/// Returns [`FunctionError::Unknown`] for a name outside
/// [`KNOWN_FUNCTIONS`] and [`FunctionError::Degraded`] for unusable
/// arguments.
pub fn call(name: &str, args: &str, lookup: &dyn Lookup) -> Result<String, FunctionError> {
    let args = Args {
        raw: split_args(args),
        lookup,
    };
    match name {
        "truncate" => truncate(&args),
        "date_format" => date_format(&args),
        "tag_list" => tag_list(&args),
        "number_format" => number_format(&args),
        "conditional" => conditional(&args),
        "length" => length(&args),
        "default" => default(&args),
        _ => Err(FunctionError::Unknown),
    }
}

/// One argument as written.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawArg {
    text: String,
    quoted: bool,
}

struct Args<'l> {
    raw: Vec<RawArg>,
    lookup: &'l dyn Lookup,
}

impl Args<'_> {
    fn require(&self, count: usize) -> Result<(), FunctionError> {
        if self.raw.len() < count {
            return Err(FunctionError::Degraded(format!(
                "expected {count} argument(s), got {}",
                self.raw.len()
            )));
        }
        Ok(())
    }

    /// Quoted text is a string, numeric text a number, anything else a
    /// variable (null when unbound).
    fn value(&self, index: usize) -> Value {
        let Some(arg) = self.raw.get(index) else {
            return Value::Null;
        };
        if arg.quoted {
            return Value::String(arg.text.clone());
        }
        number_literal(&arg.text)
            .or_else(|| self.lookup.lookup_value(&arg.text))
            .unwrap_or_default()
    }

    /// The argument text itself, without quotes.
    fn literal(&self, index: usize) -> &str {
        self.raw.get(index).map_or("", |a| a.text.as_str())
    }
}

/// Splits on commas outside quotes.
fn split_args(source: &str) -> Vec<RawArg> {
    if source.trim().is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in source.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            },
            (None, '"' | '\'') => {
                quote = Some(c);
                current.push(c);
            },
            (None, ',') => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);

    parts.into_iter().map(|p| raw_arg(p.trim())).collect()
}

fn raw_arg(text: &str) -> RawArg {
    let quoted = text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\'') && text.ends_with('\'')));
    if quoted {
        RawArg {
            text: text[1..text.len() - 1].to_string(),
            quoted: true,
        }
    } else {
        RawArg {
            text: text.to_string(),
            quoted: false,
        }
    }
}

fn truncate(args: &Args<'_>) -> Result<String, FunctionError> {
    args.require(2)?;
    let max = args
        .value(1)
        .to_number()
        .filter(|n| *n >= 0.0 && n.fract() == 0.0)
        .ok_or_else(|| {
            FunctionError::Degraded(format!(
                "length '{}' is not a non-negative integer",
                args.literal(1)
            ))
        })?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let max = max as usize;

    let text = args.value(0).to_display_string();
    if text.chars().count() <= max {
        return Ok(text);
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push_str(ELLIPSIS);
    Ok(cut)
}

fn date_format(args: &Args<'_>) -> Result<String, FunctionError> {
    args.require(2)?;
    let pattern = args.literal(1);
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(FunctionError::Degraded(format!(
            "invalid date pattern '{pattern}'"
        )));
    }

    Ok(args.value(0).as_datetime().map_or_else(String::new, |dt| {
        dt.format_with_items(items.iter()).to_string()
    }))
}

fn tag_list(args: &Args<'_>) -> Result<String, FunctionError> {
    args.require(1)?;
    let value = args.value(0);
    let tags: Vec<String> = match &value {
        Value::List(items) => items.iter().map(Value::to_display_string).collect(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };

    Ok(tags
        .iter()
        .map(|t| t.trim().trim_start_matches('#'))
        .filter(|t| !t.is_empty())
        .map(|t| format!("#{t}"))
        .collect::<Vec<_>>()
        .join(" "))
}

fn number_format(args: &Args<'_>) -> Result<String, FunctionError> {
    args.require(1)?;
    let value = args.value(0);
    let Some(number) = value.to_number() else {
        if value.is_null() || value.as_str().is_some_and(|s| s.trim().is_empty()) {
            return Ok(String::new());
        }
        return Err(FunctionError::Degraded(format!(
            "'{}' is not a number",
            value.to_display_string()
        )));
    };

    let mode = args.literal(1);
    if mode == "currency" {
        let sign = if number < 0.0 { "-" } else { "" };
        let whole = format!("{:.0}", number.abs());
        return Ok(format!("{sign}¥{}", group_thousands(&whole)));
    }
    if mode == "percent" {
        return Ok(format!("{:.1}%", number * 100.0));
    }
    if let Some(digits) = mode.strip_prefix("decimal_") {
        let precision = digits
            .parse::<usize>()
            .ok()
            .filter(|p| *p <= MAX_DECIMALS)
            .ok_or_else(|| FunctionError::Degraded(format!("invalid precision in '{mode}'")))?;
        return Ok(format!("{number:.precision$}"));
    }

    let text = format_float(number);
    let (sign, unsigned) = text
        .strip_prefix('-')
        .map_or(("", text.as_str()), |rest| ("-", rest));
    let (whole, fraction) = unsigned
        .split_once('.')
        .map_or((unsigned, None), |(w, f)| (w, Some(f)));
    let grouped = group_thousands(whole);
    Ok(fraction.map_or_else(
        || format!("{sign}{grouped}"),
        |f| format!("{sign}{grouped}.{f}"),
    ))
}

/// Inserts `,` every three digits from the right.
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

fn conditional(args: &Args<'_>) -> Result<String, FunctionError> {
    args.require(2)?;
    let branch = if args.value(0).is_truthy() { 1 } else { 2 };
    Ok(args.literal(branch).to_string())
}

fn length(args: &Args<'_>) -> Result<String, FunctionError> {
    args.require(1)?;
    Ok(args.value(0).len().unwrap_or(0).to_string())
}

fn default(args: &Args<'_>) -> Result<String, FunctionError> {
    args.require(2)?;
    let text = args.value(0).to_display_string();
    if text.trim().is_empty() {
        return Ok(args.literal(1).to_string());
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, TimeZone};
    use test_case::test_case;

    fn created() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .and_then(|tz| tz.with_ymd_and_hms(2024, 3, 5, 8, 7, 0).single())
            .unwrap()
    }

    fn ctx() -> RenderContext {
        RenderContext::new()
            .with("content", "Hello, world")
            .with("short", "Hi")
            .with("jp", "日本語のテキスト")
            .with("created", created())
            .with("tags", Value::list(["rust", "#notes", "", " vault "]))
            .with("tag_text", "a, b")
            .with("amount", 1_234_567)
            .with("price", 1234.56)
            .with("negative", -9876.4)
            .with("ratio", 0.256)
            .with("word", "abc")
            .with("flag", true)
            .with("empty", "")
            .with("items", Value::list([1, 2, 3]))
            .with("meta", Value::map([("a", 1), ("b", 2)]))
    }

    fn run(name: &str, args: &str) -> Result<String, FunctionError> {
        call(name, args, &ctx())
    }

    #[test_case("content, 5", "Hello..." ; "cut with ellipsis")]
    #[test_case("short, 5", "Hi" ; "short text verbatim")]
    #[test_case("content, 12", "Hello, world" ; "exact length verbatim")]
    #[test_case("jp, 3", "日本語..." ; "counts characters not bytes")]
    #[test_case("missing, 5", "" ; "missing variable")]
    #[test_case("\"literal text\", 4", "lite..." ; "quoted literal")]
    fn test_truncate(args: &str, expected: &str) {
        assert_eq!(run("truncate", args).unwrap(), expected);
    }

    #[test]
    fn test_truncate_bad_length_degrades() {
        assert!(matches!(
            run("truncate", "content, many"),
            Err(FunctionError::Degraded(_))
        ));
        assert!(matches!(
            run("truncate", "content, -1"),
            Err(FunctionError::Degraded(_))
        ));
        assert!(matches!(
            run("truncate", "content"),
            Err(FunctionError::Degraded(_))
        ));
    }

    #[test_case("created, \"%Y-%m-%d\"", "2024-03-05" ; "date only")]
    #[test_case("created, '%H:%M'", "08:07" ; "single quoted pattern")]
    #[test_case("created, %Y", "2024" ; "unquoted pattern")]
    #[test_case("content, \"%Y\"", "" ; "not a datetime")]
    #[test_case("missing, \"%Y\"", "" ; "missing variable")]
    fn test_date_format(args: &str, expected: &str) {
        assert_eq!(run("date_format", args).unwrap(), expected);
    }

    #[test]
    fn test_date_format_invalid_pattern_degrades() {
        assert!(matches!(
            run("date_format", "created, \"%Q\""),
            Err(FunctionError::Degraded(_))
        ));
    }

    #[test_case("tags", "#rust #notes #vault" ; "list drops empties and existing hashes")]
    #[test_case("tag_text", "#a #b" ; "comma separated string")]
    #[test_case("missing", "" ; "missing variable")]
    #[test_case("amount", "" ; "not a list")]
    fn test_tag_list(args: &str, expected: &str) {
        assert_eq!(run("tag_list", args).unwrap(), expected);
    }

    #[test_case("amount, \"currency\"", "¥1,234,567" ; "currency")]
    #[test_case("price, currency", "¥1,235" ; "currency rounds to whole yen")]
    #[test_case("negative, \"currency\"", "-¥9,876" ; "negative currency")]
    #[test_case("ratio, \"percent\"", "25.6%" ; "percent")]
    #[test_case("price, \"decimal_1\"", "1234.6" ; "fixed decimals")]
    #[test_case("price, \"decimal_0\"", "1235" ; "zero decimals")]
    #[test_case("amount", "1,234,567" ; "default mode")]
    #[test_case("price, \"default\"", "1,234.56" ; "default keeps fraction")]
    #[test_case("negative, \"other\"", "-9,876.4" ; "unknown mode uses default")]
    #[test_case("missing, \"currency\"", "" ; "missing variable")]
    #[test_case("empty, \"currency\"", "" ; "empty variable")]
    #[test_case("\"1500\", \"currency\"", "¥1,500" ; "numeric string")]
    #[test_case("42", "42" ; "numeric literal")]
    fn test_number_format(args: &str, expected: &str) {
        assert_eq!(run("number_format", args).unwrap(), expected);
    }

    #[test]
    fn test_number_format_degrades() {
        assert!(matches!(
            run("number_format", "word, \"currency\""),
            Err(FunctionError::Degraded(_))
        ));
        assert!(matches!(
            run("number_format", "price, \"decimal_x\""),
            Err(FunctionError::Degraded(_))
        ));
        assert!(matches!(
            run("number_format", "price, \"decimal_40\""),
            Err(FunctionError::Degraded(_))
        ));
    }

    #[test_case("flag, \"yes\", \"no\"", "yes" ; "truthy")]
    #[test_case("empty, \"yes\", \"no\"", "no" ; "falsy")]
    #[test_case("missing, yes, no", "no" ; "missing is falsy and branches are literal")]
    #[test_case("missing, \"yes\"", "" ; "no else branch")]
    fn test_conditional(args: &str, expected: &str) {
        assert_eq!(run("conditional", args).unwrap(), expected);
    }

    #[test_case("items", "3" ; "list")]
    #[test_case("meta", "2" ; "mapping")]
    #[test_case("jp", "8" ; "string characters")]
    #[test_case("amount", "0" ; "number")]
    #[test_case("missing", "0" ; "missing")]
    fn test_length(args: &str, expected: &str) {
        assert_eq!(run("length", args).unwrap(), expected);
    }

    #[test_case("short, \"fallback\"", "Hi" ; "present value")]
    #[test_case("missing, \"fallback\"", "fallback" ; "missing value")]
    #[test_case("empty, \"n/a\"", "n/a" ; "blank value")]
    #[test_case("missing, \"a, b\"", "a, b" ; "comma inside quotes")]
    fn test_default(args: &str, expected: &str) {
        assert_eq!(run("default", args).unwrap(), expected);
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(run("shout", "content"), Err(FunctionError::Unknown));
        assert_eq!(call_function("shout", "content", &ctx()), "");
    }

    #[test]
    fn test_split_args() {
        let args = split_args(r#" a , "b, c" , 'd' ,3"#);
        assert_eq!(
            args,
            vec![
                RawArg {
                    text: "a".to_string(),
                    quoted: false
                },
                RawArg {
                    text: "b, c".to_string(),
                    quoted: true
                },
                RawArg {
                    text: "d".to_string(),
                    quoted: true
                },
                RawArg {
                    text: "3".to_string(),
                    quoted: false
                },
            ]
        );
        assert!(split_args("  ").is_empty());
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }
}
