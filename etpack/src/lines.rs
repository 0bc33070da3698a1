//! Line cleaning shared by every text parser.
//!
//! All of the formats this crate reads (map source, shader definitions and
//! the flat script formats) are line oriented. [`clean_lines`] normalizes the
//! raw text into `(trimmed_line, original_line_number)` pairs; the two comment
//! conventions are applied on top of it, chosen per parser:
//!
//! - [`skip_comment_lines`] drops whole lines that start with `//`. Used for
//!   the shader, shaderlist, mapscript and soundscript formats.
//! - [`strip_comments`] cuts everything from the first `//` onward and keeps
//!   the remainder when non-empty. Used for the speakerscript format, where
//!   trailing comments follow real content.
//!
//! The map parser uses neither: its `// entity` and `// brush` markers are
//! structural tokens.

/// Comment marker shared by all supported formats.
pub const COMMENT: &str = "//";

/// Yield every non-blank line, trimmed, with its 1-based line number.
///
/// Line numbers refer to the original source so diagnostics can point at the
/// real location, not at an index into the filtered sequence.
pub fn clean_lines(source: &str) -> impl Iterator<Item = (&str, usize)> {
    source.lines().enumerate().filter_map(|(index, raw)| {
        let line = raw.trim();
        if line.is_empty() {
            None
        } else {
            Some((line, index + 1))
        }
    })
}

/// Drop lines that start with the comment marker.
pub fn skip_comment_lines<'a, I>(lines: I) -> impl Iterator<Item = (&'a str, usize)>
where
    I: Iterator<Item = (&'a str, usize)>,
{
    lines.filter(|(line, _)| !line.starts_with(COMMENT))
}

/// Strip an in-line comment and keep the remainder when non-empty.
pub fn strip_comments<'a, I>(lines: I) -> impl Iterator<Item = (&'a str, usize)>
where
    I: Iterator<Item = (&'a str, usize)>,
{
    lines.filter_map(|(line, number)| match line.find(COMMENT) {
        None => Some((line, number)),
        Some(index) => {
            let rest = line[..index].trim_end();
            if rest.is_empty() {
                None
            } else {
                Some((rest, number))
            }
        }
    })
}

/// Return the nth whitespace-separated token of a line, if present.
pub fn nth_token(line: &str, index: usize) -> Option<&str> {
    line.split_whitespace().nth(index)
}

/// Strip one leading and one trailing double quote, independently.
pub fn trim_quotes(token: &str) -> &str {
    let token = token.strip_prefix('"').unwrap_or(token);
    token.strip_suffix('"').unwrap_or(token)
}

/// Case-insensitive keyword-prefix test used by the flat script formats.
///
/// Matches only when the keyword is followed by whitespace, so `sound` does
/// not match `soundfade`.
pub fn matches_keyword(line: &str, keyword: &str) -> bool {
    match line.get(..keyword.len()) {
        Some(prefix) => {
            prefix.eq_ignore_ascii_case(keyword)
                && line[keyword.len()..].starts_with(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_lines_keeps_original_numbers() {
        let source = "first\n\n  second  \n\t\nthird";
        let cleaned: Vec<_> = clean_lines(source).collect();
        assert_eq!(cleaned, vec![("first", 1), ("second", 3), ("third", 5)]);
    }

    #[test]
    fn skip_comment_lines_drops_whole_lines() {
        let source = "// a comment\nvalue // trailing stays\n";
        let cleaned: Vec<_> = skip_comment_lines(clean_lines(source)).collect();
        assert_eq!(cleaned, vec![("value // trailing stays", 2)]);
    }

    #[test]
    fn strip_comments_keeps_leading_content() {
        let source = "noise sound/a.wav // looping\n// gone\nplain";
        let cleaned: Vec<_> = strip_comments(clean_lines(source)).collect();
        assert_eq!(cleaned, vec![("noise sound/a.wav", 1), ("plain", 3)]);
    }

    #[test]
    fn nth_token_collapses_runs_of_whitespace() {
        assert_eq!(nth_token("a   b\t c", 2), Some("c"));
        assert_eq!(nth_token("a b", 5), None);
    }

    #[test]
    fn trim_quotes_handles_unbalanced_quotes() {
        assert_eq!(trim_quotes("\"both\""), "both");
        assert_eq!(trim_quotes("\"start"), "start");
        assert_eq!(trim_quotes("end\""), "end");
        assert_eq!(trim_quotes("none"), "none");
    }

    #[test]
    fn matches_keyword_is_case_insensitive_and_word_bounded() {
        assert!(matches_keyword("PlaySound sound/x.wav", "playsound"));
        assert!(matches_keyword("sound\tsound/x.wav", "sound"));
        assert!(!matches_keyword("soundfade 1", "sound"));
        assert!(!matches_keyword("sound", "sound"));
    }
}
