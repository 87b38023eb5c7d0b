//! Source-line classification for the correctness pass.
//!
//! gcov-based instrumentation attributes counters to lines that never execute
//! on their own: closing braces, `else` keywords, comments, and everything in
//! test-only code. Each rule here marks such lines so the report can drop them.
//! All functions are pure; line numbers are 1-based like lcov's.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static CLOSING_DELIMITERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[}\])]+[;,]?$").unwrap());
static ELSE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\}?\s*else\s*\{$").unwrap());
static TEST_ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\[\s*(cfg\s*\(\s*test\s*\)|test)\s*\]").unwrap());

pub const IGNORE_LINE_MARKER: &str = "cov:ignore-line";
pub const IGNORE_START_MARKER: &str = "cov:ignore-start";
pub const IGNORE_END_MARKER: &str = "cov:ignore-end";

/// Which rule removed a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rule {
    Blank,
    Comment,
    ClosingDelimiter,
    Else,
    IgnoreMarker,
}

/// Lines that should carry no coverage counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NonExecutable {
    lines: BTreeSet<u32>,
}

impl NonExecutable {
    pub fn contains(&self, line: u32) -> bool {
        self.lines.contains(&line)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = u32> + '_ {
        self.lines.iter().copied()
    }
}

/// Classify a single trimmed line on its own, without surrounding context
pub fn classify_line(trimmed: &str) -> Option<Rule> {
    if trimmed.is_empty() {
        Some(Rule::Blank)
    } else if trimmed.contains(IGNORE_LINE_MARKER) {
        Some(Rule::IgnoreMarker)
    } else if trimmed.starts_with("//") {
        Some(Rule::Comment)
    } else if CLOSING_DELIMITERS.is_match(trimmed) {
        Some(Rule::ClosingDelimiter)
    } else if ELSE_LINE.is_match(trimmed) {
        Some(Rule::Else)
    } else {
        None
    }
}

/// Compute every non-executable line in `source`.
pub fn non_executable_lines(source: &str) -> NonExecutable {
    let lines: Vec<&str> = source.lines().collect();
    let mut marked = BTreeSet::new();

    let mut in_block_comment = false;
    let mut in_ignore_region = false;

    for (index, raw) in lines.iter().enumerate() {
        let number = line_number(index);
        let trimmed = raw.trim();

        if in_ignore_region {
            marked.insert(number);
            if trimmed.contains(IGNORE_END_MARKER) {
                in_ignore_region = false;
            }
            continue;
        }
        if trimmed.contains(IGNORE_START_MARKER) {
            in_ignore_region = true;
            marked.insert(number);
            continue;
        }

        if in_block_comment {
            match code_after_comment_close(trimmed) {
                None => {
                    marked.insert(number);
                }
                Some(rest) => {
                    in_block_comment = false;
                    if classify_line(rest).is_some() {
                        marked.insert(number);
                    }
                }
            }
            continue;
        }
        if let Some(comment) = trimmed.strip_prefix("/*") {
            match code_after_comment_close(comment) {
                None => {
                    in_block_comment = true;
                    marked.insert(number);
                }
                // judge whatever follows the comment on the same line
                Some(rest) => {
                    if classify_line(rest).is_some() {
                        marked.insert(number);
                    }
                }
            }
            continue;
        }

        if classify_line(trimmed).is_some() {
            marked.insert(number);
        }
    }

    for (start, end) in test_item_spans(&lines) {
        marked.extend(line_number(start)..=line_number(end));
    }

    NonExecutable { lines: marked }
}

/// Index ranges (inclusive, 0-based) covered by `#[test]` and `#[cfg(test)]` items
pub fn test_item_spans(lines: &[&str]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        if TEST_ATTRIBUTE.is_match(lines[index].trim()) {
            if let Some(end) = item_end(lines, index) {
                spans.push((index, end));
                index = end + 1;
                continue;
            }
        }
        index += 1;
    }

    spans
}

/// Find the last line of the item starting at `start`.
///
/// The item ends either at a `;` before any brace opens (`#[cfg(test)] use x;`)
/// or where its outermost brace closes. `None` when the source ends first.
fn item_end(lines: &[&str], start: usize) -> Option<usize> {
    let mut depth: usize = 0;
    let mut opened = false;

    for (index, line) in lines.iter().enumerate().skip(start) {
        let code = strip_literals_and_comments(line);
        // the attribute itself may share its line with the item
        let code = if index == start {
            after_attribute(&code)
        } else {
            code.as_str()
        };

        for c in code.chars() {
            match c {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => {
                    depth = depth.saturating_sub(1);
                    if opened && depth == 0 {
                        return Some(index);
                    }
                }
                ';' if !opened => return Some(index),
                _ => {}
            }
        }
    }

    None
}

/// Trimmed text after the first `*/`, or `None` when the comment stays open.
fn code_after_comment_close(text: &str) -> Option<&str> {
    text.find("*/").map(|i| text[i + 2..].trim())
}

fn after_attribute(code: &str) -> &str {
    code.find(']').map(|i| &code[i + 1..]).unwrap_or("")
}

/// Blank out string/char literal contents and trailing `//` comments so
/// brace counting only sees code.
fn strip_literals_and_comments(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => {
                    in_string = false;
                    out.push('"');
                }
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push('"');
            }
            '/' if chars.peek() == Some(&'/') => break,
            '\'' => {
                // char literal such as '{' or '\''; lifetimes pass through
                let rest: Vec<char> = chars.clone().take(10).collect();
                if rest.first() == Some(&'\\') {
                    if let Some(close) = rest.iter().skip(2).position(|&r| r == '\'') {
                        for _ in 0..close + 3 {
                            chars.next();
                        }
                    }
                } else if rest.get(1) == Some(&'\'') {
                    chars.next();
                    chars.next();
                } else {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

fn line_number(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}
