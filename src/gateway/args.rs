//! Argument aggregation.
//!
//! Builds the per-request argument map the executor binds SQL parameters
//! from. Sources are merged in a fixed order: cookies, then the URL query
//! string, then an urlencoded body. Later insertions overwrite earlier ones
//! for the same key; the router inserts path captures after all of these, so
//! path parameters take highest precedence.

use crate::error::GatewayError;
use crate::http::request::Request;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Insertion-ordered key/value map with unique keys.
///
/// Overwriting a key replaces its value in place and keeps its original
/// position. Built once per request and discarded at request end.
#[derive(Debug, Default)]
pub struct ArgumentMap {
    entries: Vec<(String, String)>,
}

impl ArgumentMap {
    pub fn new() -> Self {
        ArgumentMap::default()
    }

    /// Insert a value; the last writer for a key wins.
    pub fn insert(&mut self, name: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Build the argument map for a request from cookies, query string, and
/// body. Never touches the database.
pub fn aggregate(request: &Request) -> Result<ArgumentMap, GatewayError> {
    let mut args = ArgumentMap::new();

    parse_cookies(request, &mut args)?;

    if let Some(query) = request.query_string() {
        parse_form(query, &mut args)?;
    }

    if !request.body.is_empty() {
        let content_type = request.header("Content-Type");
        match content_type {
            Some(ct) if is_form_content_type(ct) => {
                let body = std::str::from_utf8(&request.body).map_err(|_| {
                    GatewayError::BadRequest("request body is not valid UTF-8".to_string())
                })?;
                parse_form(body, &mut args)?;
            }
            other => {
                return Err(GatewayError::UnsupportedMediaType(
                    other.unwrap_or("(none)").to_string(),
                ));
            }
        }
    }

    Ok(args)
}

/// The media type may carry parameters ("; charset=..."); only the type
/// itself decides.
fn is_form_content_type(value: &str) -> bool {
    let media_type = value.split(';').next().unwrap_or("").trim();
    media_type.eq_ignore_ascii_case(FORM_CONTENT_TYPE)
}

/// Extract cookie pairs into the argument map.
///
/// Only the header literally named `Cookie` is accepted. Any header that
/// matches case-insensitively but is spelled differently fails the whole
/// aggregation as a bad request.
fn parse_cookies(request: &Request, args: &mut ArgumentMap) -> Result<(), GatewayError> {
    for (name, value) in &request.headers {
        if !name.eq_ignore_ascii_case("Cookie") {
            continue;
        }
        if name != "Cookie" {
            return Err(GatewayError::BadRequest(format!(
                "expected Cookie header, found '{name}'"
            )));
        }

        for pair in value.split(';') {
            if pair.trim().is_empty() {
                continue;
            }
            let (k, v) = pair.split_once('=').ok_or_else(|| {
                GatewayError::BadRequest(format!("cookie without '=': '{}'", pair.trim()))
            })?;
            args.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
    Ok(())
}

/// Parse an urlencoded phrase list (query string or body).
///
/// Phrases are separated by `&` or `;`; each phrase splits on its first `=`.
/// Names and values are percent-decoded, then trimmed of surrounding
/// whitespace before insertion.
fn parse_form(input: &str, args: &mut ArgumentMap) -> Result<(), GatewayError> {
    for phrase in input.split(['&', ';']) {
        if phrase.is_empty() {
            continue;
        }
        let (name, value) = phrase.split_once('=').ok_or_else(|| {
            GatewayError::BadRequest(format!("phrase without '=': '{phrase}'"))
        })?;
        let name = percent_decode(name)?;
        let value = percent_decode(value)?;
        args.insert(name.trim().to_string(), value.trim().to_string());
    }
    Ok(())
}

/// Decode `%XX` escapes to bytes and `+` to space.
///
/// A truncated or non-hex escape, or a decode that is not valid UTF-8, is a
/// bad request.
pub fn percent_decode(input: &str) -> Result<String, GatewayError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let decoded = bytes
                    .get(i + 1..i + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| {
                        GatewayError::BadRequest(format!("invalid percent escape in '{input}'"))
                    })?;
                out.push(decoded);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out)
        .map_err(|_| GatewayError::BadRequest(format!("'{input}' does not decode to UTF-8")))
}

/// Inverse of [`percent_decode`] for the ASCII-safe subset: space becomes
/// `+`, unreserved characters pass through, everything else is `%XX`.
pub fn percent_encode(input: &str) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        match b {
            b' ' => out.push('+'),
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => {
                let _ = write!(out, "%{b:02X}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_basic_escapes() {
        assert_eq!(percent_decode("a%2Cb").unwrap(), "a,b");
        assert_eq!(percent_decode("a+b").unwrap(), "a b");
        assert_eq!(percent_decode("plain").unwrap(), "plain");
    }

    #[test]
    fn decode_rejects_truncated_escape() {
        assert!(percent_decode("abc%4").is_err());
        assert!(percent_decode("abc%zz").is_err());
    }

    #[test]
    fn encode_decode_round_trip() {
        for original in ["a+b%2Cc", "x%3D1", "no_escapes-here.~", "two+words"] {
            let decoded = percent_decode(original).unwrap();
            assert_eq!(percent_encode(&decoded), original);
        }
    }

    #[test]
    fn insert_overwrites_in_place() {
        let mut args = ArgumentMap::new();
        args.insert("a".to_string(), "1".to_string());
        args.insert("b".to_string(), "2".to_string());
        args.insert("a".to_string(), "3".to_string());

        assert_eq!(args.get("a"), Some("3"));
        assert_eq!(args.len(), 2);
        let keys: Vec<&str> = args.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
