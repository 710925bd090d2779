//! Field separation strategies for PDF-extracted lines.
//!
//! Strategies are tried in [`SplitStrategy::CHAIN`] order; the first one that
//! yields at least [`MIN_FIELDS`] fields wins.

use regex::Regex;
use std::sync::LazyLock;

pub const MIN_FIELDS: usize = 4;

static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(?\d{2}\)?\s?\d{4,5}-?\d{4}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    Pipe,
    Tab,
    MultiSpace,
    /// Splits around a phone number: at least three fields before it and two
    /// after, each side separated by runs of whitespace.
    PhoneAnchored,
}

impl SplitStrategy {
    pub const CHAIN: [SplitStrategy; 4] = [
        SplitStrategy::Pipe,
        SplitStrategy::Tab,
        SplitStrategy::MultiSpace,
        SplitStrategy::PhoneAnchored,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SplitStrategy::Pipe => "pipe",
            SplitStrategy::Tab => "tab",
            SplitStrategy::MultiSpace => "multi-space",
            SplitStrategy::PhoneAnchored => "phone-anchored",
        }
    }

    /// Returns the fields when this strategy applies to `line`.
    pub fn split(&self, line: &str) -> Option<Vec<String>> {
        let fields = match self {
            SplitStrategy::Pipe => split_on_char(line, '|')?,
            SplitStrategy::Tab => split_on_char(line, '\t')?,
            SplitStrategy::MultiSpace => split_multi_space(line),
            SplitStrategy::PhoneAnchored => split_around_phone(line)?,
        };
        (fields.len() >= MIN_FIELDS).then_some(fields)
    }
}

/// Runs the strategy chain and reports which strategy matched.
pub fn split_fields(line: &str) -> Option<(SplitStrategy, Vec<String>)> {
    SplitStrategy::CHAIN
        .iter()
        .find_map(|strategy| strategy.split(line).map(|fields| (*strategy, fields)))
}

fn non_empty_trimmed<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<String> {
    parts
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn split_on_char(line: &str, separator: char) -> Option<Vec<String>> {
    if !line.contains(separator) {
        return None;
    }
    Some(non_empty_trimmed(line.split(separator)))
}

fn split_multi_space(line: &str) -> Vec<String> {
    non_empty_trimmed(MULTI_SPACE.split(line))
}

fn split_around_phone(line: &str) -> Option<Vec<String>> {
    let found = PHONE.find(line)?;
    let before = split_multi_space(line[..found.start()].trim());
    let after = split_multi_space(line[found.end()..].trim());
    if before.len() < 3 || after.len() < 2 {
        return None;
    }

    let mut fields = before;
    fields.push(found.as_str().to_string());
    fields.extend(after);
    Some(fields)
}
