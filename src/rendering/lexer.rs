//! Splits template text into literal text and classified `{{...}}` tags.

use regex::Regex;
use std::sync::LazyLock;

/// Function call tag: `name(args)`.
static CALL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([A-Za-z_]\w*)\s*\((.*)\)$").unwrap_or_else(|_| unreachable!())
});

/// Variable tag: `name`, `a.b.c`, `@index`, `@item`, `this.field`.
static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@?[A-Za-z_]\w*(?:\.\w+)*$").unwrap_or_else(|_| unreachable!())
});

/// A lexical token with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

/// Classification of a piece of template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Text(String),
    If(String),
    Elif(String),
    Else,
    EndIf,
    Each(String),
    EndEach,
    Block(String),
    EndBlock,
    Extends(String),
    Include(String),
    Call { name: String, args: String },
    Var(String),
    Unknown(String),
}

impl TokenKind {
    /// Tag text as written, for error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Text(_) => "text".to_string(),
            Self::If(_) => "{{#if}}".to_string(),
            Self::Elif(_) => "{{#elif}}".to_string(),
            Self::Else => "{{#else}}".to_string(),
            Self::EndIf => "{{/if}}".to_string(),
            Self::Each(_) => "{{#each}}".to_string(),
            Self::EndEach => "{{/each}}".to_string(),
            Self::Block(name) => format!("{{{{block \"{name}\"}}}}"),
            Self::EndBlock => "{{/block}}".to_string(),
            Self::Extends(name) => format!("{{{{extends \"{name}\"}}}}"),
            Self::Include(name) => format!("{{{{include \"{name}\"}}}}"),
            Self::Call { name, .. } => format!("{{{{{name}(...)}}}}"),
            Self::Var(path) => format!("{{{{{path}}}}}"),
            Self::Unknown(tag) => format!("{{{{{tag}}}}}"),
        }
    }
}

/// Tokenizes template source.
///
/// Text without a closing `}}` is literal. Adjacent text runs are merged.
pub(crate) fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut rest = source;
    let mut line = 1;

    loop {
        let Some(open) = rest.find("{{") else {
            push_text(&mut tokens, rest, line);
            break;
        };
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            push_text(&mut tokens, rest, line);
            break;
        };
        let inner = &after_open[..close];

        // `{{ a {{b}}`: the first opening is literal text
        if let Some(nested) = inner.rfind("{{") {
            let cut = open + 2 + nested;
            push_text(&mut tokens, &rest[..cut], line);
            line += count_newlines(&rest[..cut]);
            rest = &rest[cut..];
            continue;
        }

        push_text(&mut tokens, &rest[..open], line);
        line += count_newlines(&rest[..open]);
        tokens.push(Token {
            kind: classify(inner),
            line,
        });
        line += count_newlines(inner);
        rest = &after_open[close + 2..];
    }

    tokens
}

fn push_text(tokens: &mut Vec<Token>, text: &str, line: usize) {
    if text.is_empty() {
        return;
    }
    if let Some(Token {
        kind: TokenKind::Text(existing),
        ..
    }) = tokens.last_mut()
    {
        existing.push_str(text);
        return;
    }
    tokens.push(Token {
        kind: TokenKind::Text(text.to_string()),
        line,
    });
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

/// Classifies the content between `{{` and `}}`.
fn classify(raw: &str) -> TokenKind {
    let inner = raw.trim();

    if let Some(rest) = inner.strip_prefix('#') {
        let (keyword, arg) = split_keyword(rest);
        return match keyword {
            "if" => TokenKind::If(arg.to_string()),
            "elif" => TokenKind::Elif(arg.to_string()),
            "else" if arg.is_empty() => TokenKind::Else,
            "each" => TokenKind::Each(arg.to_string()),
            _ => TokenKind::Unknown(inner.to_string()),
        };
    }

    if let Some(rest) = inner.strip_prefix('/') {
        return match rest.trim() {
            "if" => TokenKind::EndIf,
            "each" => TokenKind::EndEach,
            "block" => TokenKind::EndBlock,
            _ => TokenKind::Unknown(inner.to_string()),
        };
    }

    if inner == "else" {
        return TokenKind::Else;
    }

    let (keyword, arg) = split_keyword(inner);
    let named = match keyword {
        "block" => quoted_name(arg).map(TokenKind::Block),
        "extends" => quoted_name(arg).map(TokenKind::Extends),
        "include" => quoted_name(arg).map(TokenKind::Include),
        _ => None,
    };
    if let Some(kind) = named {
        return kind;
    }

    if let Some(caps) = CALL_PATTERN.captures(inner) {
        let name = caps.get(1).map_or("", |m| m.as_str());
        let args = caps.get(2).map_or("", |m| m.as_str());
        return TokenKind::Call {
            name: name.to_string(),
            args: args.trim().to_string(),
        };
    }

    if VAR_PATTERN.is_match(inner) {
        return TokenKind::Var(inner.to_string());
    }

    TokenKind::Unknown(inner.to_string())
}

fn split_keyword(text: &str) -> (&str, &str) {
    let text = text.trim();
    text.split_once(char::is_whitespace)
        .map_or((text, ""), |(keyword, arg)| (keyword, arg.trim()))
}

/// Parses `"name"` or `'name'`.
fn quoted_name(text: &str) -> Option<String> {
    let text = text.trim();
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = text.strip_prefix(quote)?.strip_suffix(quote)?;
    if inner.is_empty() || inner.contains(quote) {
        return None;
    }
    Some(inner.to_string())
}

/// Opening and closing tag counts per group kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TagCounts {
    pub if_open: usize,
    pub if_close: usize,
    pub each_open: usize,
    pub each_close: usize,
    pub block_open: usize,
    pub block_close: usize,
}

impl TagCounts {
    /// `(group, opened, closed)` for every unbalanced group.
    pub(crate) fn unbalanced(&self) -> Vec<(&'static str, usize, usize)> {
        [
            ("{{#if}}", self.if_open, self.if_close),
            ("{{#each}}", self.each_open, self.each_close),
            ("{{block}}", self.block_open, self.block_close),
        ]
        .into_iter()
        .filter(|(_, open, close)| open != close)
        .collect()
    }
}

/// Counts group tags regardless of nesting.
pub(crate) fn count_tags(source: &str) -> TagCounts {
    let mut counts = TagCounts::default();
    for token in tokenize(source) {
        match token.kind {
            TokenKind::If(_) => counts.if_open += 1,
            TokenKind::EndIf => counts.if_close += 1,
            TokenKind::Each(_) => counts.each_open += 1,
            TokenKind::EndEach => counts.each_close += 1,
            TokenKind::Block(_) => counts.block_open += 1,
            TokenKind::EndBlock => counts.block_close += 1,
            _ => {},
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_text_and_variables() {
        assert_eq!(
            kinds("Hello {{ name }}!"),
            vec![
                TokenKind::Text("Hello ".to_string()),
                TokenKind::Var("name".to_string()),
                TokenKind::Text("!".to_string()),
            ]
        );
    }

    #[test]
    fn test_control_tags() {
        assert_eq!(
            kinds("{{#if a > 1}}{{#elif b}}{{else}}{{#else}}{{/if}}"),
            vec![
                TokenKind::If("a > 1".to_string()),
                TokenKind::Elif("b".to_string()),
                TokenKind::Else,
                TokenKind::Else,
                TokenKind::EndIf,
            ]
        );
        assert_eq!(
            kinds("{{#each items}}{{@index}}{{/each}}"),
            vec![
                TokenKind::Each("items".to_string()),
                TokenKind::Var("@index".to_string()),
                TokenKind::EndEach,
            ]
        );
    }

    #[test]
    fn test_named_tags() {
        assert_eq!(
            kinds(r#"{{extends "base"}}{{block 'body'}}x{{/block}}{{include "footer"}}"#),
            vec![
                TokenKind::Extends("base".to_string()),
                TokenKind::Block("body".to_string()),
                TokenKind::Text("x".to_string()),
                TokenKind::EndBlock,
                TokenKind::Include("footer".to_string()),
            ]
        );
    }

    #[test]
    fn test_function_call() {
        assert_eq!(
            kinds(r#"{{truncate(content, 10)}}{{ date_format(d, "%Y") }}"#),
            vec![
                TokenKind::Call {
                    name: "truncate".to_string(),
                    args: "content, 10".to_string(),
                },
                TokenKind::Call {
                    name: "date_format".to_string(),
                    args: r#"d, "%Y""#.to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_unknown_tags() {
        assert_eq!(
            kinds("{{#unless x}}{{/unless}}{{!comment}}{{block name}}"),
            vec![
                TokenKind::Unknown("#unless x".to_string()),
                TokenKind::Unknown("/unless".to_string()),
                TokenKind::Unknown("!comment".to_string()),
                TokenKind::Unknown("block name".to_string()),
            ]
        );
    }

    #[test]
    fn test_unclosed_braces_are_text() {
        assert_eq!(
            kinds("a {{ b"),
            vec![TokenKind::Text("a {{ b".to_string())]
        );
        assert_eq!(
            kinds("{{ x {{y}}"),
            vec![
                TokenKind::Text("{{ x ".to_string()),
                TokenKind::Var("y".to_string()),
            ]
        );
    }

    #[test]
    fn test_line_numbers() {
        let tokens = tokenize("one\ntwo {{a}}\n\n{{#if\nb}}{{c}}");
        let lines: Vec<usize> = tokens
            .iter()
            .filter(|t| !matches!(t.kind, TokenKind::Text(_)))
            .map(|t| t.line)
            .collect();
        assert_eq!(lines, vec![2, 4, 5]);
    }

    #[test]
    fn test_count_tags() {
        let counts = count_tags("{{#if a}}{{#each x}}{{/each}}{{#if b}}{{/if}}{{/block}}");
        assert_eq!(counts.if_open, 2);
        assert_eq!(counts.if_close, 1);
        assert_eq!(
            counts.unbalanced(),
            vec![("{{#if}}", 2, 1), ("{{block}}", 0, 1)]
        );
    }

    #[test]
    fn test_quoted_name() {
        assert_eq!(quoted_name("\"base\""), Some("base".to_string()));
        assert_eq!(quoted_name("'base'"), Some("base".to_string()));
        assert_eq!(quoted_name("base"), None);
        assert_eq!(quoted_name("\"\""), None);
        assert_eq!(quoted_name("\"a'"), None);
    }
}
