//! Value types a flag can hold and how each is parsed from file content.

use std::fmt::Debug;
use std::time::Duration;

use crate::error::ParseError;
use crate::flag::duration::parse_duration;

/// A type that can back a [`Flag`](crate::flag::Flag).
pub trait FlagValue: Clone + Debug + Send + Sync + 'static {
    /// Short type name used in log lines.
    const KIND: &'static str;

    /// Parse the raw content of a backing file.
    fn parse(raw: &[u8]) -> Result<Self, ParseError>;

    /// Human-readable form for reports.
    fn render(&self) -> String;
}

/// Strings are taken verbatim, whitespace included. Empty is a valid value.
impl FlagValue for String {
    const KIND: &'static str = "string";

    fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        Ok(String::from_utf8_lossy(raw).into_owned())
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl FlagValue for bool {
    const KIND: &'static str = "bool";

    fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        let text = trimmed(raw);
        match text.to_ascii_lowercase().as_str() {
            "1" | "t" | "true" => Ok(true),
            "0" | "f" | "false" => Ok(false),
            _ => Err(ParseError::Bool(text)),
        }
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl FlagValue for i64 {
    const KIND: &'static str = "int";

    fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        let text = trimmed(raw);
        text.parse().map_err(|_| ParseError::Int(text))
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

/// Durations may have no default at all, so the flag holds an `Option`.
impl FlagValue for Option<Duration> {
    const KIND: &'static str = "duration";

    fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        let text = trimmed(raw);
        match parse_duration(&text) {
            Some(d) => Ok(Some(d)),
            None => Err(ParseError::Duration(text)),
        }
    }

    fn render(&self) -> String {
        match self {
            Some(d) => format!("{d:?}"),
            None => "none".to_string(),
        }
    }
}

fn trimmed(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_verbatim() {
        assert_eq!(String::parse(b"joe").unwrap(), "joe");
        assert_eq!(String::parse(b" joe\n").unwrap(), " joe\n");
        assert_eq!(String::parse(b"").unwrap(), "");
    }

    #[test]
    fn test_bool_literals() {
        for t in ["true", "TRUE", "True", "t", "T", "1", "true\n"] {
            assert_eq!(bool::parse(t.as_bytes()), Ok(true), "{t:?}");
        }
        for f in ["false", "FALSE", "f", "0", " false "] {
            assert_eq!(bool::parse(f.as_bytes()), Ok(false), "{f:?}");
        }
    }

    #[test]
    fn test_bool_empty_is_invalid() {
        assert_eq!(bool::parse(b""), Err(ParseError::Bool(String::new())));
        assert!(bool::parse(b"yes").is_err());
    }

    #[test]
    fn test_int() {
        assert_eq!(i64::parse(b"1"), Ok(1));
        assert_eq!(i64::parse(b"-42\n"), Ok(-42));
        assert_eq!(i64::parse(b"wrong"), Err(ParseError::Int("wrong".into())));
        assert!(i64::parse(b"").is_err());
        assert!(i64::parse(b"1.5").is_err());
    }

    #[test]
    fn test_render() {
        assert_eq!(String::from("joe").render(), "joe");
        assert_eq!(true.render(), "true");
        assert_eq!((-3i64).render(), "-3");
        assert_eq!(Some(Duration::from_millis(1500)).render(), "1.5s");
        assert_eq!(None::<Duration>.render(), "none");
    }

    #[test]
    fn test_duration() {
        assert_eq!(
            <Option<Duration>>::parse(b"5m\n"),
            Ok(Some(Duration::from_secs(300)))
        );
        assert!(<Option<Duration>>::parse(b"").is_err());
        assert!(<Option<Duration>>::parse(b"soon").is_err());
    }
}
