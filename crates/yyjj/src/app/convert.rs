//! Converters translating buffer text between JSONC and YAML.

use crate::domain::errors::ParseError;
use crate::domain::model::Pane;

/// Pure, deterministic translation between the two buffer formats.
///
/// Implementations must report malformed input (including the empty string) through `Err` and
/// never panic. Error positions are zero-based.
pub trait Converter {
    /// JSONC to YAML.
    fn forward(&self, input: &str) -> Result<String, ParseError>;

    /// YAML to JSONC.
    fn reverse(&self, input: &str) -> Result<String, ParseError>;

    /// Convert text edited in `from` into the format of its peer pane.
    fn convert(&self, from: Pane, input: &str) -> Result<String, ParseError> {
        match from {
            Pane::Jsonc => self.forward(input),
            Pane::Yaml => self.reverse(input),
        }
    }
}

/// Converter backed by `serde_json` and `serde_yaml`.
///
/// Comments and trailing commas are accepted on the JSONC side but not carried over to YAML.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeConverter;

impl SerdeConverter {
    pub fn new() -> Self {
        Self
    }
}

impl Converter for SerdeConverter {
    fn forward(&self, input: &str) -> Result<String, ParseError> {
        let cleaned = strip_trailing_commas(&strip_comments(input)?);
        let value: serde_json::Value =
            serde_json::from_str(&cleaned).map_err(|err| json_error(&err, &cleaned))?;
        serde_yaml::to_string(&value).map_err(|err| yaml_error(&err))
    }

    fn reverse(&self, input: &str) -> Result<String, ParseError> {
        if input.trim().is_empty() {
            return Ok("null".to_owned());
        }
        let value: serde_json::Value = serde_yaml::from_str(input).map_err(|err| yaml_error(&err))?;
        serde_json::to_string_pretty(&value).map_err(|err| json_error(&err, ""))
    }
}

/// Blank out `//` and `/* */` comments outside string literals.
///
/// Every removed byte becomes a space and line breaks are kept, so positions reported against
/// the cleaned text match the original.
fn strip_comments(input: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();
    let mut in_string = false;

    while let Some((idx, ch)) = chars.next() {
        if in_string {
            out.push(ch);
            match ch {
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (ch, chars.peek().map(|&(_, next)| next)) {
            ('"', _) => {
                in_string = true;
                out.push(ch);
            }
            ('/', Some('/')) => {
                blank(&mut out, ch);
                while let Some(&(_, next)) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    blank(&mut out, next);
                    chars.next();
                }
            }
            ('/', Some('*')) => {
                blank(&mut out, ch);
                if let Some((_, star)) = chars.next() {
                    blank(&mut out, star);
                }
                let mut closed = false;
                let mut prev_star = false;
                for (_, next) in chars.by_ref() {
                    blank(&mut out, next);
                    if prev_star && next == '/' {
                        closed = true;
                        break;
                    }
                    prev_star = next == '*';
                }
                if !closed {
                    let (line, column) = position_of(input, idx);
                    return Err(ParseError::at("unterminated block comment", line, column));
                }
            }
            _ => out.push(ch),
        }
    }

    Ok(out)
}

fn blank(out: &mut String, ch: char) {
    if ch == '\n' || ch == '\r' {
        out.push(ch);
    } else {
        out.extend(std::iter::repeat_n(' ', ch.len_utf8()));
    }
}

/// Replace commas that follow a value and directly precede `}` or `]` with spaces.
///
/// A comma with no value before it (`{,}`, `[1,,]`) is left for the parser to reject.
fn strip_trailing_commas(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut trailing = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut previous: Option<u8> = None;

    for (idx, &byte) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
                previous = Some(byte);
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b',' => {
                let next = bytes[idx + 1..]
                    .iter()
                    .find(|candidate| !candidate.is_ascii_whitespace());
                let follows_value = !matches!(previous, None | Some(b'{' | b'[' | b','));
                if follows_value && matches!(next, Some(b'}') | Some(b']')) {
                    trailing.push(idx);
                }
            }
            _ => {}
        }
        if !byte.is_ascii_whitespace() {
            previous = Some(byte);
        }
    }

    input
        .char_indices()
        .map(|(idx, ch)| {
            if trailing.binary_search(&idx).is_ok() {
                ' '
            } else {
                ch
            }
        })
        .collect()
}

/// Zero-based line and byte column of `offset` within `input`.
fn position_of(input: &str, offset: usize) -> (usize, usize) {
    let before = &input[..offset];
    let line = before.matches('\n').count();
    let column = before.rfind('\n').map_or(offset, |newline| offset - newline - 1);
    (line, column)
}

/// serde_json reports a one-based line and the zero-based column just past the offending byte.
///
/// Column 0 means the error surfaced after a line break, so it is moved back to the end of the
/// previous line of `input`.
fn json_error(err: &serde_json::Error, input: &str) -> ParseError {
    let message = strip_position_suffix(&err.to_string());
    let line = err.line().saturating_sub(1);
    let column = err.column();
    if column == 0 && line > 0 {
        let previous = line - 1;
        let end = input
            .split('\n')
            .nth(previous)
            .map_or(0, |text| text.trim_end_matches('\r').len());
        return ParseError::at(message, previous, end);
    }
    ParseError::at(message, line, column)
}

fn yaml_error(err: &serde_yaml::Error) -> ParseError {
    let message = strip_position_suffix(&err.to_string());
    match err.location() {
        Some(location) => ParseError::at(
            message,
            location.line().saturating_sub(1),
            location.column().saturating_sub(1),
        ),
        None => ParseError::at(message, 0, 0),
    }
}

/// serde renders positions into its messages; the span carries them instead.
fn strip_position_suffix(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(idx) => message[..idx].to_owned(),
        None => message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> SerdeConverter {
        SerdeConverter::new()
    }

    #[test]
    fn forward_converts_simple_object() {
        assert_eq!(converter().forward(r#"{"a": 1}"#).unwrap(), "a: 1\n");
    }

    #[test]
    fn forward_accepts_comments_and_trailing_commas() {
        let input = "{\n  // host\n  \"host\": \"db\", /* inline */\n  \"ports\": [1, 2,],\n}";
        let yaml = converter().forward(input).unwrap();
        assert_eq!(yaml, "host: db\nports:\n- 1\n- 2\n");
    }

    #[test]
    fn comment_markers_inside_strings_are_kept() {
        let yaml = converter()
            .forward(r#"{"url": "http://example.com/*x*/", "q": "a\"//b"}"#)
            .unwrap();
        let back: serde_json::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back["url"], "http://example.com/*x*/");
        assert_eq!(back["q"], "a\"//b");
    }

    #[test]
    fn forward_reports_truncated_object_position() {
        let err = converter().forward(r#"{"a": 1"#).unwrap_err();
        assert_eq!(err.span.start.line, 0);
        assert_eq!(err.span.start.column, 7);
        assert!(!err.message.contains(" at line "));
    }

    #[test]
    fn forward_error_positions_ignore_removed_comments() {
        let err = converter()
            .forward("{\n  /* note */ \"a\": tru\n}")
            .unwrap_err();
        assert_eq!((err.span.start.line, err.span.start.column), (1, 21));
    }

    #[test]
    fn forward_rejects_commas_without_a_value() {
        for input in ["{,}", "[,]", "[1,,]", "{\"a\": 1,,}"] {
            assert!(converter().forward(input).is_err(), "{input} should be rejected");
        }
        assert_eq!(converter().forward("[\"x\" , ]").unwrap(), "- x\n");
    }

    #[test]
    fn forward_rejects_empty_input() {
        let err = converter().forward("").unwrap_err();
        assert_eq!(err.span.start.line, 0);
        assert_eq!(err.span.start.column, 0);
    }

    #[test]
    fn forward_rejects_invalid_escape() {
        assert!(converter().forward(r#"{"a": "\q"}"#).is_err());
    }

    #[test]
    fn unterminated_block_comment_points_at_opening() {
        let err = converter().forward("{\n  \"a\": 1 /* open").unwrap_err();
        assert_eq!(err.message, "unterminated block comment");
        assert_eq!((err.span.start.line, err.span.start.column), (1, 9));
    }

    #[test]
    fn reverse_converts_mapping_to_pretty_json() {
        assert_eq!(converter().reverse("x: 1\n").unwrap(), "{\n  \"x\": 1\n}");
    }

    #[test]
    fn reverse_stringifies_non_string_keys() {
        assert_eq!(
            converter().reverse("1: a\n2: b\n").unwrap(),
            "{\n  \"1\": \"a\",\n  \"2\": \"b\"\n}"
        );
    }

    #[test]
    fn reverse_treats_blank_input_as_null() {
        assert_eq!(converter().reverse("  \n").unwrap(), "null");
    }

    #[test]
    fn reverse_reports_yaml_errors() {
        let err = converter().reverse("a: [1, 2\nb: 3\n").unwrap_err();
        assert!(!err.message.is_empty());
    }

    #[test]
    fn round_trip_stabilizes() {
        let converter = converter();
        let source = "{\n  // comment\n  \"server\": \"localhost\",\n  \"port\": 8080,\n  \"db\": {\"name\": \"app\", \"tags\": [\"a\", \"b\"]}\n}";
        let yaml = converter.forward(source).unwrap();
        let json = converter.reverse(&yaml).unwrap();
        let yaml_again = converter.forward(&json).unwrap();
        assert_eq!(yaml, yaml_again);
        assert_eq!(converter.reverse(&yaml_again).unwrap(), json);
    }

    #[test]
    fn convert_dispatches_on_source_pane() {
        let converter = converter();
        assert_eq!(converter.convert(Pane::Jsonc, "[1]").unwrap(), "- 1\n");
        assert_eq!(converter.convert(Pane::Yaml, "- 1\n").unwrap(), "[\n  1\n]");
    }

    #[test]
    fn position_of_counts_bytes_after_last_newline() {
        assert_eq!(position_of("ab\ncd", 4), (1, 1));
        assert_eq!(position_of("abc", 2), (0, 2));
    }
}
