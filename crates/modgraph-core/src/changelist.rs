//! Changelist descriptions with an optional leading author tag line.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::{Error, Result};

/// `first.last`: two tokens joined by a single dot.
static AUTHOR_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangelistDescription {
    pub author_tag: Option<String>,
    pub lines: Vec<String>,
}

impl ChangelistDescription {
    /// Split `text` into an author tag and body lines.
    ///
    /// The first line is taken as the author tag only when it is a
    /// `token.token` pair and is terminated by `line_ending`. Everything else
    /// is split on `line_ending`; empty text yields a single empty line.
    pub fn parse(text: &str, line_ending: &str) -> Result<Self> {
        if line_ending.is_empty() {
            return Err(Error::invalid_argument("line ending must not be empty")
                .with_operation("changelist::parse"));
        }

        let (author_tag, body) = match text.split_once(line_ending) {
            Some((first, rest)) if AUTHOR_TAG.is_match(first) => (Some(first.to_string()), rest),
            _ => (None, text),
        };

        Ok(Self {
            author_tag,
            lines: body.split(line_ending).map(str::to_string).collect(),
        })
    }

    /// Join the tag and lines back into description text.
    pub fn render(&self, line_ending: &str) -> String {
        let body = self.lines.join(line_ending);
        match &self.author_tag {
            Some(tag) => format!("{tag}{line_ending}{body}"),
            None => body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modgraph_error::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_author_tag_split() {
        let parsed = ChangelistDescription::parse("john.doe\nFixed the bug", "\n").unwrap();
        assert_eq!(parsed.author_tag.as_deref(), Some("john.doe"));
        assert_eq!(parsed.lines, vec!["Fixed the bug"]);
    }

    #[test]
    fn test_no_author_tag() {
        let parsed = ChangelistDescription::parse("Fixed the bug\nNo author here", "\n").unwrap();
        assert_eq!(parsed.author_tag, None);
        assert_eq!(parsed.lines, vec!["Fixed the bug", "No author here"]);
    }

    #[test]
    fn test_empty_input() {
        let parsed = ChangelistDescription::parse("", "\n").unwrap();
        assert_eq!(parsed.author_tag, None);
        assert_eq!(parsed.lines, vec![""]);
    }

    #[test]
    fn test_tag_without_line_ending_is_body() {
        let parsed = ChangelistDescription::parse("john.doe", "\n").unwrap();
        assert_eq!(parsed.author_tag, None);
        assert_eq!(parsed.lines, vec!["john.doe"]);

        let parsed = ChangelistDescription::parse("john.doe\n", "\n").unwrap();
        assert_eq!(parsed.author_tag.as_deref(), Some("john.doe"));
        assert_eq!(parsed.lines, vec![""]);
    }

    #[test]
    fn test_tag_shape() {
        for text in ["john\nbody", "a.b.c\nbody", "john .doe\nbody", ".doe\nbody"] {
            let parsed = ChangelistDescription::parse(text, "\n").unwrap();
            assert_eq!(parsed.author_tag, None, "{text:?}");
        }
    }

    #[test]
    fn test_crlf_line_ending() {
        let parsed =
            ChangelistDescription::parse("jane.roe\r\nFirst\r\nSecond", "\r\n").unwrap();
        assert_eq!(parsed.author_tag.as_deref(), Some("jane.roe"));
        assert_eq!(parsed.lines, vec!["First", "Second"]);
    }

    #[test]
    fn test_reparse_rendered_is_stable() {
        for text in [
            "john.doe\nFixed the bug\n\n#rb none",
            "Fixed the bug\nNo author here",
            "",
            "john.doe",
        ] {
            let parsed = ChangelistDescription::parse(text, "\n").unwrap();
            let rendered = parsed.render("\n");
            assert_eq!(rendered, text);
            assert_eq!(ChangelistDescription::parse(&rendered, "\n").unwrap(), parsed);
        }
    }

    #[test]
    fn test_empty_line_ending_rejected() {
        let err = ChangelistDescription::parse("a.b\nc", "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
