//! The comma-separated `key=value` encoding spoken by Daikin units.
//!
//! Both UDP discovery replies and HTTP response bodies use the same format:
//!
//! ```text
//! ret=OK,type=aircon,mac=A0B1C2D3E4F5,name=%4c%69%76%69%6e%67
//! ```
//!
//! Values are percent-encoded; keys are sent as-is.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

/// Decoded wire fields, keyed by field name.
///
/// A key may carry more than one value; lookups through [`WireFields::get`]
/// only ever see the first one.
///
/// # Examples
///
/// ```
/// use daikin_rs::WireFields;
///
/// let fields = WireFields::parse("abc=123,foo=bar,name=%42%65%64%72%6f%6f%6d");
/// assert_eq!(fields.get("abc"), "123");
/// assert_eq!(fields.get("name"), "Bedroom");
/// assert_eq!(fields.get("missing"), "");
/// ```
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFields {
    values: BTreeMap<String, Vec<String>>,
}

impl WireFields {
    /// Create an empty set of fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a wire string such as `abc=123,foo=bar`.
    ///
    /// Each token is split on its first `=`; a token without one yields the
    /// key with an empty value. Values that fail to percent-decode are kept
    /// verbatim.
    pub fn parse(s: &str) -> Self {
        let mut out = WireFields::new();
        for token in s.trim_end_matches(['\r', '\n']).split(',') {
            if token.is_empty() {
                continue;
            }
            let (key, value) = match token.split_once('=') {
                Some((key, raw)) => (key, decode_value(raw)),
                None => (token, String::new()),
            };
            out.add(key, value);
        }
        out
    }

    /// Get the first value for `key`, or `""` if it is absent.
    pub fn get(&self, key: &str) -> &str {
        self.values
            .get(key)
            .and_then(|v| v.first())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Get every value recorded for `key`.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Append a value, keeping any existing values for the key.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Replace all values for the key with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), vec![value.into()]);
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.values.remove(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over every `(key, value)` pair, including duplicates.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Serialize as an `application/x-www-form-urlencoded` string.
    ///
    /// # Examples
    ///
    /// ```
    /// use daikin_rs::WireFields;
    ///
    /// let mut fields = WireFields::new();
    /// fields.set("pow", "1");
    /// fields.set("name", "Living Room");
    /// assert_eq!(fields.to_form_string(), "name=Living%20Room&pow=1");
    /// ```
    pub fn to_form_string(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Display for WireFields {
    /// Formats the fields back into the comma-separated wire form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", k, urlencoding::encode(v))?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for WireFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = WireFields::new();
        for (k, v) in iter {
            out.add(k, v);
        }
        out
    }
}

fn decode_value(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            debug!("keeping undecodable wire value {raw:?}: {e}");
            raw.to_string()
        }
    }
}
