//! Fenced directive extraction.

use once_cell::sync::Lazy;
use regex::Regex;

/// Pattern for matching code fence openings.
static FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<indent>\s*)(?P<fence>`{3,}|~{3,})(?P<info>.*)$").unwrap());

/// Pattern for a MyST directive info string: `{name} argument`.
static DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{(?P<name>[A-Za-z][\w-]*)\}\s*(?P<argument>.*)$").unwrap());

/// A fenced block extracted from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedToken {
    /// The info string from the opening fence, trimmed.
    pub info: String,
    /// Lines between the fences, fence indentation removed.
    pub lines: Vec<String>,
    /// Line of the opening fence (1-indexed).
    pub line: usize,
}

impl DelimitedToken {
    /// Splits a `{name} argument` info string.
    pub fn directive(&self) -> Option<(&str, &str)> {
        let caps = DIRECTIVE.captures(&self.info)?;
        let name = caps.name("name")?.as_str();
        let argument = caps.name("argument").map_or("", |m| m.as_str().trim());
        Some((name, argument))
    }
}

/// Result of attempting to extract a fenced block.
#[derive(Debug)]
pub enum ExtractResult {
    Token(DelimitedToken),
    /// No opening fence, returns the line.
    NotDelimited(String),
    /// Opening fence without closing fence before the end of input.
    Unclosed { info: String, line: usize },
}

/// Extracts fenced blocks from lines.
pub struct DelimitedTokenGetter {
    /// Current line number (1-indexed).
    line_number: usize,
}

impl DelimitedTokenGetter {
    /// Creates a new getter.
    pub fn new() -> Self {
        Self { line_number: 1 }
    }

    /// Extracts the next token from the line iterator.
    pub fn extract<'a, I>(&mut self, lines: &mut I) -> Option<ExtractResult>
    where
        I: Iterator<Item = &'a str>,
    {
        let line = lines.next()?;
        let start_line = self.line_number;
        self.line_number += 1;

        let Some(caps) = FENCE_OPEN.captures(line) else {
            return Some(ExtractResult::NotDelimited(line.to_string()));
        };

        let indent = &caps["indent"];
        let fence = &caps["fence"];
        let info = caps["info"].trim().to_string();
        let Some(fence_char) = fence.chars().next() else {
            return Some(ExtractResult::NotDelimited(line.to_string()));
        };

        let mut content = Vec::new();
        for content_line in lines.by_ref() {
            self.line_number += 1;

            if closes_fence(content_line, fence_char, fence.len()) {
                return Some(ExtractResult::Token(DelimitedToken {
                    info,
                    lines: content,
                    line: start_line,
                }));
            }

            let stripped = content_line.strip_prefix(indent).unwrap_or(content_line);
            content.push(stripped.to_string());
        }

        Some(ExtractResult::Unclosed {
            info,
            line: start_line,
        })
    }
}

impl Default for DelimitedTokenGetter {
    fn default() -> Self {
        Self::new()
    }
}

/// A closing fence uses the opening character at least as many times.
fn closes_fence(line: &str, fence_char: char, fence_len: usize) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= fence_len && trimmed.chars().all(|c| c == fence_char)
}

/// Convenience function to extract all tokens from a string.
pub fn extract_all_tokens(input: &str) -> Vec<ExtractResult> {
    let mut getter = DelimitedTokenGetter::new();
    let mut lines = input.lines().peekable();
    let mut results = Vec::new();

    while lines.peek().is_some() {
        if let Some(result) = getter.extract(&mut lines) {
            results.push(result);
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_token(input: &str) -> DelimitedToken {
        extract_all_tokens(input)
            .into_iter()
            .find_map(|result| match result {
                ExtractResult::Token(token) => Some(token),
                _ => None,
            })
            .expect("a token")
    }

    #[test]
    fn test_directive_block() {
        let token = single_token("```{lit} C++, Main (APPEND)\nint x;\n```");
        assert_eq!(token.directive(), Some(("lit", "C++, Main (APPEND)")));
        assert_eq!(token.lines, vec!["int x;"]);
        assert_eq!(token.line, 1);
    }

    #[test]
    fn test_plain_code_block_is_not_a_directive() {
        let token = single_token("```python\nprint('hello')\n```");
        assert_eq!(token.directive(), None);
    }

    #[test]
    fn test_directive_without_argument() {
        let token = single_token("~~~{lit-setup}\n:tangle-root: step1\n~~~");
        assert_eq!(token.directive(), Some(("lit-setup", "")));
    }

    #[test]
    fn test_longer_fence_nests_shorter_ones() {
        let token = single_token("````{lit} Doc\n```\nnot closed\n```\n````");
        assert_eq!(token.lines, vec!["```", "not closed", "```"]);
    }

    #[test]
    fn test_indented_fence() {
        let token = single_token("  ```{lit} A\n    code\n  ```");
        assert_eq!(token.lines, vec!["  code"]);
    }

    #[test]
    fn test_line_numbers() {
        let input = "text\n\n```{lit} A\na\n```\nmore\n```{lit} B\nb\n```";
        let lines: Vec<usize> = extract_all_tokens(input)
            .into_iter()
            .filter_map(|result| match result {
                ExtractResult::Token(token) => Some(token.line),
                _ => None,
            })
            .collect();
        assert_eq!(lines, vec![3, 7]);
    }

    #[test]
    fn test_unclosed_fence() {
        let results = extract_all_tokens("```{lit} A\ncode");
        assert!(matches!(
            &results[0],
            ExtractResult::Unclosed { info, line: 1 } if info == "{lit} A"
        ));
    }

    #[test]
    fn test_empty_block() {
        let token = single_token("```{lit} Empty\n```");
        assert!(token.lines.is_empty());
    }
}
