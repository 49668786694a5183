// ============================================================
// Layer 4: Line Tag Classifier
// ============================================================
// Every line of a Cranfield-style file either starts with a
// two-character tag or continues the most recent field.
//
//   .I 184        → Record("184")   start of a new record
//   .T            → Section(Title)
//   .A            → Section(Author)
//   .B            → Section(Bibliography)
//   .W            → Section(Content)
//   anything else → Text            continuation line
//
// Only the first two characters are inspected, so ".Tx" is a
// title tag. Unknown dotted prefixes (".X") are ordinary text.
//
// Lines shorter than the tag width cannot be classified and
// are rejected instead of being read past their end.

use crate::domain::error::{Error, Result};

/// Width of the tag prefix in characters.
pub const TAG_WIDTH: usize = 2;

/// A field section opened by a tag line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Title,
    Author,
    Bibliography,
    Content,
}

/// Result of classifying one physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// `.I <id>`; carries everything after the tag, trimmed
    Record(String),
    Section(Section),
    Text,
}

impl Tag {
    /// Classify `line`. `line_no` is 1-based and only used for errors.
    pub fn classify(line: &str, line_no: usize) -> Result<Tag> {
        if line.chars().count() < TAG_WIDTH {
            return Err(Error::MalformedLine {
                line_no,
                line:   line.to_string(),
                reason: "shorter than tag width",
            });
        }

        // Byte offset of the end of the tag prefix; safe for multi-byte text
        let split = line
            .char_indices()
            .nth(TAG_WIDTH)
            .map_or(line.len(), |(i, _)| i);
        let (prefix, rest) = line.split_at(split);

        let tag = match prefix {
            ".I" => {
                let id = rest.trim();
                if id.is_empty() {
                    return Err(Error::MalformedLine {
                        line_no,
                        line:   line.to_string(),
                        reason: "record tag without identifier",
                    });
                }
                Tag::Record(id.to_string())
            }
            ".T" => Tag::Section(Section::Title),
            ".A" => Tag::Section(Section::Author),
            ".B" => Tag::Section(Section::Bibliography),
            ".W" => Tag::Section(Section::Content),
            _    => Tag::Text,
        };
        Ok(tag)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tag_carries_id() {
        assert_eq!(Tag::classify(".I 184", 1).unwrap(), Tag::Record("184".into()));
        assert_eq!(Tag::classify(".I   7  ", 1).unwrap(), Tag::Record("7".into()));
    }

    #[test]
    fn test_section_tags() {
        assert_eq!(Tag::classify(".T", 1).unwrap(), Tag::Section(Section::Title));
        assert_eq!(Tag::classify(".A", 1).unwrap(), Tag::Section(Section::Author));
        assert_eq!(Tag::classify(".B", 1).unwrap(), Tag::Section(Section::Bibliography));
        assert_eq!(Tag::classify(".W", 1).unwrap(), Tag::Section(Section::Content));
    }

    #[test]
    fn test_exact_tag_width_is_valid() {
        // ".T" has exactly TAG_WIDTH chars and must not be rejected
        assert!(Tag::classify(".T", 3).is_ok());
        assert_eq!(Tag::classify("ab", 3).unwrap(), Tag::Text);
    }

    #[test]
    fn test_short_line_is_malformed() {
        let err = Tag::classify("x", 12).unwrap_err();
        match err {
            Error::MalformedLine { line_no, .. } => assert_eq!(line_no, 12),
            other => panic!("unexpected error: {other}"),
        }
        assert!(Tag::classify("", 1).is_err());
    }

    #[test]
    fn test_record_without_id_is_malformed() {
        assert!(matches!(
            Tag::classify(".I", 4),
            Err(Error::MalformedLine { line_no: 4, .. })
        ));
        assert!(Tag::classify(".I   ", 4).is_err());
    }

    #[test]
    fn test_unknown_tag_is_text() {
        assert_eq!(Tag::classify(".X something", 1).unwrap(), Tag::Text);
        assert_eq!(Tag::classify("experimental results", 1).unwrap(), Tag::Text);
    }

    #[test]
    fn test_only_prefix_decides() {
        assert_eq!(Tag::classify(".Tx", 1).unwrap(), Tag::Section(Section::Title));
    }

    #[test]
    fn test_multibyte_prefix_does_not_panic() {
        assert_eq!(Tag::classify("éé long", 1).unwrap(), Tag::Text);
        assert!(Tag::classify("é", 1).is_err());
    }
}
