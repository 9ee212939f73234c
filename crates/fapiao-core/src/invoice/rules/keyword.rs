//! Generic keyword scan, the last fallback of every field.

use crate::models::config::ExtractionConfig;

use super::find_ignore_ascii_case;

/// Keyword fallback: the text following the first keyword that yields a value.
#[derive(Debug, Clone, Copy)]
pub struct KeywordScan<'a> {
    keywords: &'a [&'a str],
}

impl<'a> KeywordScan<'a> {
    /// Create a scan over ordered keyword synonyms.
    pub const fn new(keywords: &'a [&'a str]) -> Self {
        Self { keywords }
    }

    /// Keywords in the order they are tried.
    pub fn keywords(&self) -> &[&'a str] {
        self.keywords
    }

    /// Run the scan. Keywords are tried in order; a keyword that is present
    /// but yields nothing moves on to the next one.
    pub fn scan(&self, text: &str, config: &ExtractionConfig) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }

        self.keywords.iter().find_map(|keyword| {
            let idx = find_ignore_ascii_case(text, keyword)?;
            value_after(&text[idx + keyword.len()..], keyword, config)
        })
    }
}

fn value_after(rest: &str, keyword: &str, config: &ExtractionConfig) -> Option<String> {
    let mut remaining = rest.trim();
    if let Some(stripped) = remaining.strip_prefix(|c| c == ':' || c == '：') {
        remaining = stripped.trim_start();
    }
    if remaining.is_empty() {
        return None;
    }

    let mut end = remaining.len();
    for (count, (i, c)) in remaining.char_indices().enumerate() {
        if count >= config.keyword_max_chars || matches!(c, '\r' | '\n' | '\t') {
            end = i;
            break;
        }
    }
    let mut value = &remaining[..end];

    // Numbers and dates often share a line with the next label
    if keyword.contains("号码") || keyword.contains("日期") {
        if let Some(token) = space_token(value, config.space_token_limit) {
            return Some(token.to_string());
        }
    }

    if let Some(cut) = config
        .stop_words
        .iter()
        .filter(|w| !w.is_empty())
        .filter_map(|w| value.find(w.as_str()))
        .min()
    {
        value = &value[..cut];
    }

    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn space_token(remaining: &str, limit: usize) -> Option<&str> {
    let space = remaining.find(' ')?;
    let token = &remaining[..space];
    let chars = token.chars().count();
    if chars == 0 || chars >= limit {
        return None;
    }
    let token = token.trim();
    (token.chars().count() > 5 && !token.contains("信息") && !token.contains("名称")).then_some(token)
}
