//! Ordered HTTP header collection shared by the raw client and the diagnostic server.
//!
//! Headers are kept exactly as they were added: insertion order is preserved,
//! duplicate names keep every value, and name casing is left untouched unless
//! the collection was created with `normalize` set, in which case names are
//! rewritten to their canonical MIME form (`content-type` becomes `Content-Type`).
//!
//! While lines are ingested, a few control values are extracted on the fly
//! (see [`HttpHeaders::add`]). These side fields follow last-write-wins and
//! never hold a value that failed to parse: a bad value is logged and the
//! previous one is kept.

use std::time::Duration;

use indexmap::IndexMap;
use thiserror::Error;

use crate::http::{CONTENT_LENGTH_HEADER, ECHO_HEADER, HOST_HEADER, SLEEP_DURATION_HEADER};
use crate::units::parse_duration;

#[derive(Debug, Error, PartialEq)]
pub enum HeaderError {
    #[error("invalid header line: {0}")]
    MalformedHeaderLine(String),
}

#[derive(Debug, Clone, Default)]
pub struct HttpHeaders {
    normalize: bool,
    entries: Vec<(String, String)>,
    echo: IndexMap<String, Vec<String>>,
    host: Option<String>,
    content_length: Option<usize>,
    sleep_duration: Option<Duration>,
}

impl HttpHeaders {
    pub fn new(normalize: bool) -> Self {
        Self {
            normalize,
            ..Self::default()
        }
    }

    /// Appends a header and updates the control side fields.
    ///
    /// Reserved names are matched case-insensitively whether or not the
    /// collection normalizes names:
    /// - `Host`: non-empty values set [`host`](Self::host)
    /// - `Content-Length`: unsigned integers set [`content_length`](Self::content_length)
    /// - `Rawh-Sleep-Duration`: duration strings set [`sleep_duration`](Self::sleep_duration)
    /// - `Rawh-Echo`: each space separated name `N` is added to the echo set as `N: N`
    pub fn add(&mut self, name: &str, value: &str) {
        let name = name.trim();
        let value = value.trim();
        let name = if self.normalize {
            canonical_header_name(name)
        } else {
            name.to_string()
        };

        if name.eq_ignore_ascii_case(HOST_HEADER) {
            if !value.is_empty() {
                self.host = Some(value.to_string());
            }
        } else if name.eq_ignore_ascii_case(CONTENT_LENGTH_HEADER) {
            match parse_content_length(value) {
                Some(length) => self.content_length = Some(length),
                None => tracing::warn!(
                    header = CONTENT_LENGTH_HEADER,
                    value,
                    "Ignoring invalid header value"
                ),
            }
        } else if name.eq_ignore_ascii_case(SLEEP_DURATION_HEADER) {
            match parse_duration(value) {
                Ok(duration) => self.sleep_duration = Some(duration),
                Err(err) => tracing::warn!(
                    header = SLEEP_DURATION_HEADER,
                    value,
                    error = %err,
                    "Ignoring invalid header value"
                ),
            }
        } else if name.eq_ignore_ascii_case(ECHO_HEADER) {
            for echoed in value.split(' ').filter(|n| !n.is_empty()) {
                self.echo
                    .entry(echoed.to_string())
                    .or_default()
                    .push(echoed.to_string());
            }
        }

        self.entries.push((name, value.to_string()));
    }

    /// Splits `line` on its first colon and adds the result.
    pub fn add_line(&mut self, line: &str) -> Result<(), HeaderError> {
        let (name, value) = split_header_line(line)?;
        self.add(name, value);
        Ok(())
    }

    /// Adds every line, stopping at the first malformed one.
    pub fn add_lines<I, S>(&mut self, lines: I) -> Result<(), HeaderError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.add_line(line.as_ref())?;
        }
        Ok(())
    }

    /// All values stored under `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        let wanted = if self.normalize {
            canonical_header_name(name.trim())
        } else {
            name.to_string()
        };
        self.entries
            .iter()
            .filter(|(n, _)| *n == wanted)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).into_iter().next()
    }

    /// Every `(name, value)` pair in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Headers to mirror back, grouped by name in first-seen order.
    pub fn echo(&self) -> impl Iterator<Item = (&str, &str)> {
        self.echo
            .iter()
            .flat_map(|(n, values)| values.iter().map(move |v| (n.as_str(), v.as_str())))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn content_length(&self) -> Option<usize> {
        self.content_length
    }

    pub fn sleep_duration(&self) -> Option<Duration> {
        self.sleep_duration
    }
}

/// Splits a raw `name: value` line on its first colon.
pub fn split_header_line(line: &str) -> Result<(&str, &str), HeaderError> {
    line.split_once(':')
        .ok_or_else(|| HeaderError::MalformedHeaderLine(line.to_string()))
}

/// Canonical MIME form of a header name: the first letter and every letter
/// following a hyphen are upper-cased, the rest lower-cased.
///
/// Names containing a space or a non-token byte are returned unchanged.
pub fn canonical_header_name(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let mapped = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            mapped
        })
        .collect()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

fn parse_content_length(value: &str) -> Option<usize> {
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_line_trims_and_keeps_duplicates_in_order() {
        let mut headers = HttpHeaders::new(false);
        headers.add_line("X-Token:  first ").unwrap();
        headers.add_line("Accept: */*").unwrap();
        headers.add_line("X-Token: second").unwrap();

        assert_eq!(headers.get_all("X-Token"), vec!["first", "second"]);
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                ("X-Token", "first"),
                ("Accept", "*/*"),
                ("X-Token", "second")
            ]
        );
    }

    #[test]
    fn value_keeps_everything_after_first_colon() {
        let mut headers = HttpHeaders::new(false);
        headers.add_line("Referer: http://example.com:8080/").unwrap();
        assert_eq!(headers.get("Referer"), Some("http://example.com:8080/"));
    }

    #[test]
    fn raw_names_are_case_sensitive() {
        let mut headers = HttpHeaders::new(false);
        headers.add_line("x-lower: 1").unwrap();
        assert_eq!(headers.get("x-lower"), Some("1"));
        assert_eq!(headers.get("X-Lower"), None);
    }

    #[test]
    fn normalized_names_are_canonical() {
        let mut headers = HttpHeaders::new(true);
        headers.add_line("x-lower: 1").unwrap();
        headers.add_line("X-LOWER: 2").unwrap();
        assert_eq!(headers.get_all("x-LoWeR"), vec!["1", "2"]);
        assert_eq!(headers.iter().next(), Some(("X-Lower", "1")));
    }

    #[test]
    fn canonical_name_rules() {
        assert_eq!(canonical_header_name("content-type"), "Content-Type");
        assert_eq!(canonical_header_name("WWW-AUTHENTICATE"), "Www-Authenticate");
        assert_eq!(canonical_header_name("bad name"), "bad name");
    }

    #[test]
    fn malformed_line_is_rejected() {
        let mut headers = HttpHeaders::new(false);
        assert_eq!(
            headers.add_line("no-colon-here"),
            Err(HeaderError::MalformedHeaderLine("no-colon-here".to_string()))
        );
        assert!(headers.is_empty());
    }

    #[test]
    fn add_lines_stops_at_first_failure() {
        let mut headers = HttpHeaders::new(false);
        let result = headers.add_lines(["A: 1", "broken", "B: 2"]);
        assert!(result.is_err());
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("B"), None);
    }

    #[test]
    fn side_fields_match_any_case() {
        let mut headers = HttpHeaders::new(false);
        headers.add_line("HOST: example.com").unwrap();
        headers.add_line("content-length: 42").unwrap();
        headers.add_line("rawh-sleep-duration: 10ms").unwrap();

        assert_eq!(headers.host(), Some("example.com"));
        assert_eq!(headers.content_length(), Some(42));
        assert_eq!(headers.sleep_duration(), Some(Duration::from_millis(10)));
    }

    #[test]
    fn bad_control_values_keep_previous() {
        let mut headers = HttpHeaders::new(false);
        headers.add_line("Content-Length: 7").unwrap();
        headers.add_line("Content-Length: seven").unwrap();
        headers.add_line("Content-Length: -1").unwrap();
        headers.add_line("Rawh-Sleep-Duration: 1s").unwrap();
        headers.add_line("Rawh-Sleep-Duration: soon").unwrap();
        headers.add_line("Host:").unwrap();

        assert_eq!(headers.content_length(), Some(7));
        assert_eq!(headers.sleep_duration(), Some(Duration::from_secs(1)));
        assert_eq!(headers.host(), None);
        // the raw values are still recorded
        assert_eq!(headers.get_all("Content-Length"), vec!["7", "seven", "-1"]);
    }

    #[test]
    fn last_valid_control_value_wins() {
        let mut headers = HttpHeaders::new(false);
        headers.add_line("Host: a").unwrap();
        headers.add_line("Host: b").unwrap();
        headers.add_line("Content-Length: 1").unwrap();
        headers.add_line("Content-Length: +2").unwrap();
        assert_eq!(headers.host(), Some("b"));
        assert_eq!(headers.content_length(), Some(2));
    }

    #[test]
    fn content_length_allows_a_single_sign_only() {
        let mut headers = HttpHeaders::new(false);
        headers.add_line("Content-Length: 3").unwrap();
        headers.add_line("Content-Length: ++2").unwrap();
        assert_eq!(headers.content_length(), Some(3));
    }

    #[test]
    fn echo_header_lists_names() {
        let mut headers = HttpHeaders::new(false);
        headers.add_line("Rawh-Echo: X-One  X-Two").unwrap();
        headers.add_line("rawh-echo: X-One").unwrap();

        assert_eq!(
            headers.echo().collect::<Vec<_>>(),
            vec![("X-One", "X-One"), ("X-One", "X-One"), ("X-Two", "X-Two")]
        );
    }
}
