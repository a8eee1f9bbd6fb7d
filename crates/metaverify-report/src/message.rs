//! Service message formatting and parsing.
//!
//! A service message is a single line of the form
//! `##teamcity[<event> key1='value1' key2='value2']`. Property values are
//! escaped so that quotes, brackets and line breaks inside them can never be
//! mistaken for delimiters by the consuming build server.

use std::fmt;

/// Marker token that prefixes every service message.
pub const MARKER: &str = "teamcity";

/// Events understood by the test-results viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    TestSuiteStarted,
    TestSuiteFinished,
    TestStarted,
    TestFinished,
    TestFailed,
    TestIgnored,
}

impl Event {
    /// Wire name of the event.
    pub fn as_str(self) -> &'static str {
        match self {
            Event::TestSuiteStarted => "testSuiteStarted",
            Event::TestSuiteFinished => "testSuiteFinished",
            Event::TestStarted => "testStarted",
            Event::TestFinished => "testFinished",
            Event::TestFailed => "testFailed",
            Event::TestIgnored => "testIgnored",
        }
    }

    /// Looks up an event by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        let event = match name {
            "testSuiteStarted" => Event::TestSuiteStarted,
            "testSuiteFinished" => Event::TestSuiteFinished,
            "testStarted" => Event::TestStarted,
            "testFinished" => Event::TestFinished,
            "testFailed" => Event::TestFailed,
            "testIgnored" => Event::TestIgnored,
            _ => return None,
        };
        Some(event)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while reading a service message back from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The line does not carry the `##teamcity[...]` envelope.
    #[error("not a service message")]
    NotAServiceMessage,

    /// The event name is not one of [`Event`].
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// A property is not of the form `key='value'`.
    #[error("malformed property: {0}")]
    MalformedProperty(String),

    /// A property value has no closing quote.
    #[error("unterminated value for property '{0}'")]
    UnterminatedValue(String),

    /// `|` followed by a character that has no escape meaning.
    #[error("invalid escape sequence: |{0}")]
    InvalidEscape(char),

    /// A value ends with a lone `|`.
    #[error("value ends with an incomplete escape sequence")]
    TrailingEscape,
}

/// One event with its ordered properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceMessage {
    event: Event,
    properties: Vec<(String, String)>,
}

impl ServiceMessage {
    /// Creates a message with no properties.
    pub fn new(event: Event) -> Self {
        Self {
            event,
            properties: Vec::new(),
        }
    }

    /// Appends a property. Properties are rendered in insertion order.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    pub fn event(&self) -> Event {
        self.event
    }

    /// Returns the first value stored under `key`.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    /// Parses a rendered line back into a message.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let body = line
            .strip_prefix("##")
            .and_then(|rest| rest.strip_prefix(MARKER))
            .and_then(|rest| rest.strip_prefix('['))
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or(ParseError::NotAServiceMessage)?;

        let (name, mut rest) = body.split_once(' ').unwrap_or((body, ""));
        let event =
            Event::from_name(name).ok_or_else(|| ParseError::UnknownEvent(name.to_string()))?;

        let mut properties = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }

            let (key, tail) = rest
                .split_once("='")
                .ok_or_else(|| ParseError::MalformedProperty(rest.to_string()))?;
            if key.is_empty() || key.contains(' ') {
                return Err(ParseError::MalformedProperty(rest.to_string()));
            }

            let end = closing_quote(tail)
                .ok_or_else(|| ParseError::UnterminatedValue(key.to_string()))?;
            properties.push((key.to_string(), unescape_value(&tail[..end])?));
            rest = &tail[end + 1..];
        }

        Ok(Self { event, properties })
    }
}

impl fmt::Display for ServiceMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "##{}[{}", MARKER, self.event)?;
        for (key, value) in &self.properties {
            write!(f, " {}='{}'", key, escape_value(value))?;
        }
        f.write_str("]")
    }
}

/// Byte offset of the first unescaped `'` in `value`.
fn closing_quote(value: &str) -> Option<usize> {
    let mut chars = value.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '|' => {
                chars.next();
            }
            '\'' => return Some(i),
            _ => {}
        }
    }
    None
}

/// Escapes a property value for the service-message syntax.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '|' => out.push_str("||"),
            '\'' => out.push_str("|'"),
            '\n' => out.push_str("|n"),
            '\r' => out.push_str("|r"),
            '[' => out.push_str("|["),
            ']' => out.push_str("|]"),
            '\u{0085}' => out.push_str("|x"),
            '\u{2028}' => out.push_str("|l"),
            '\u{2029}' => out.push_str("|p"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_value`].
pub fn unescape_value(value: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '|' {
            out.push(c);
            continue;
        }
        let unescaped = match chars.next() {
            Some('|') => '|',
            Some('\'') => '\'',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('[') => '[',
            Some(']') => ']',
            Some('x') => '\u{0085}',
            Some('l') => '\u{2028}',
            Some('p') => '\u{2029}',
            Some(other) => return Err(ParseError::InvalidEscape(other)),
            None => return Err(ParseError::TrailingEscape),
        };
        out.push(unescaped);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_without_properties() {
        let msg = ServiceMessage::new(Event::TestSuiteFinished);
        assert_eq!(msg.to_string(), "##teamcity[testSuiteFinished]");
    }

    #[test]
    fn test_render_keeps_property_order() {
        let msg = ServiceMessage::new(Event::TestStarted)
            .with_property("name", "a.txt")
            .with_property("captureStandardOutput", "false");
        assert_eq!(
            msg.to_string(),
            "##teamcity[testStarted name='a.txt' captureStandardOutput='false']"
        );
    }

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape_value("it's"), "it|'s");
        assert_eq!(escape_value("[x]"), "|[x|]");
        assert_eq!(escape_value("a|b"), "a||b");
        assert_eq!(escape_value("l1\nl2\r"), "l1|nl2|r");
        assert_eq!(escape_value("\u{0085}\u{2028}\u{2029}"), "|x|l|p");
        assert_eq!(escape_value("plain/path.txt"), "plain/path.txt");
    }

    #[test]
    fn test_escaped_value_has_no_bare_delimiters() {
        let escaped = escape_value("a'b[c]d|e\nf");
        let mut chars = escaped.chars();
        while let Some(c) = chars.next() {
            assert!(!matches!(c, '\'' | '[' | ']' | '\n'), "bare {c:?} in {escaped}");
            if c == '|' {
                chars.next();
            }
        }
    }

    #[test]
    fn test_unescape_inverts_escape() {
        let raw = "weird 'name' [1] | \r\n \u{0085}\u{2028}\u{2029} end";
        assert_eq!(unescape_value(&escape_value(raw)).unwrap(), raw);
    }

    #[test]
    fn test_unescape_rejects_unknown_sequence() {
        assert_eq!(unescape_value("|q"), Err(ParseError::InvalidEscape('q')));
        assert_eq!(unescape_value("abc|"), Err(ParseError::TrailingEscape));
    }

    #[test]
    fn test_parse_rendered_message() {
        let msg = ServiceMessage::new(Event::TestFailed)
            .with_property("name", "dir/it's [odd].txt")
            .with_property("message", "No .metafile")
            .with_property("details", "Metafile dir/it's [odd].txt.meta not found.");

        let parsed = ServiceMessage::parse(&msg.to_string()).unwrap();
        assert_eq!(parsed, msg);
        assert_eq!(parsed.property("message"), Some("No .metafile"));
        assert_eq!(parsed.property("missing"), None);
    }

    #[test]
    fn test_parse_trailing_newline() {
        let parsed = ServiceMessage::parse("##teamcity[testSuiteStarted name='x']\n").unwrap();
        assert_eq!(parsed.event(), Event::TestSuiteStarted);
        assert_eq!(parsed.property("name"), Some("x"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            ServiceMessage::parse("hello world"),
            Err(ParseError::NotAServiceMessage)
        );
        assert_eq!(
            ServiceMessage::parse("##teamcity[buildStatus text='x']"),
            Err(ParseError::UnknownEvent("buildStatus".to_string()))
        );
        assert_eq!(
            ServiceMessage::parse("##teamcity[testStarted name='x]"),
            Err(ParseError::UnterminatedValue("name".to_string()))
        );
        assert!(matches!(
            ServiceMessage::parse("##teamcity[testStarted name]"),
            Err(ParseError::MalformedProperty(_))
        ));
    }

    #[test]
    fn test_event_names_round_trip() {
        for event in [
            Event::TestSuiteStarted,
            Event::TestSuiteFinished,
            Event::TestStarted,
            Event::TestFinished,
            Event::TestFailed,
            Event::TestIgnored,
        ] {
            assert_eq!(Event::from_name(event.as_str()), Some(event));
        }
        assert_eq!(Event::from_name("testStdOut"), None);
    }
}
