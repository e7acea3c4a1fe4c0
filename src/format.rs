//! Helpers for encoding/decoding the plain cookie payload format.
//!
//! A payload is a list of `key=value` entries joined by `&`, with keys and
//! values percent-encoded, e.g. `hello=session%21&user=alice`. Entries are
//! written in key order. The same format is used for session and flash
//! cookies.
//!
//! This is primarily useful for testing and debugging.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

const ENTRY_SEPARATOR: char = '&';
const KEY_VALUE_SEPARATOR: char = '=';

/// Everything but ASCII alphanumerics and `-_.~` is escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Encode a map into the cookie payload. An empty map encodes to `""`.
pub fn encode_map(entries: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in entries {
        if !out.is_empty() {
            out.push(ENTRY_SEPARATOR);
        }
        out.extend(utf8_percent_encode(key, COMPONENT));
        out.push(KEY_VALUE_SEPARATOR);
        out.extend(utf8_percent_encode(value, COMPONENT));
    }
    out
}

/// Decode a cookie payload into a map.
///
/// Malformed entries are skipped; a payload with no usable entry yields an
/// empty map.
pub fn decode_map(payload: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();

    for segment in payload.split(ENTRY_SEPARATOR) {
        if segment.is_empty() {
            continue;
        }
        let Some((key, value)) = segment.split_once(KEY_VALUE_SEPARATOR) else {
            tracing::trace!("skipping cookie payload entry without separator");
            continue;
        };
        let (Ok(key), Ok(value)) = (
            percent_decode_str(key).decode_utf8(),
            percent_decode_str(value).decode_utf8(),
        ) else {
            tracing::trace!("skipping cookie payload entry with invalid utf-8");
            continue;
        };
        entries.insert(key.into_owned(), value.into_owned());
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn empty_map_is_empty_string() {
        assert_eq!(encode_map(&BTreeMap::new()), "");
        assert!(decode_map("").is_empty());
    }

    #[test]
    fn entries_are_ordered_and_escaped() {
        let entries = map(&[("user", "alice"), ("hello", "session!")]);
        assert_eq!(encode_map(&entries), "hello=session%21&user=alice");
    }

    #[test]
    fn separators_inside_values_survive() {
        let entries = map(&[
            ("a&b", "c=d"),
            ("percent", "100%"),
            ("unicode", "grüße ✓"),
            ("", "empty key"),
            ("empty value", ""),
            ("dash-ok", "-_.~"),
        ]);

        assert_eq!(decode_map(&encode_map(&entries)), entries);
    }

    #[test]
    fn malformed_segments_are_skipped() {
        let decoded = decode_map("good=1&&noseparator&bad=%FF&also=good%202");
        assert_eq!(decoded, map(&[("good", "1"), ("also", "good 2")]));
    }

    #[test]
    fn value_may_contain_raw_equals() {
        assert_eq!(decode_map("k=a=b"), map(&[("k", "a=b")]));
    }

    #[test]
    fn garbage_decodes_to_empty() {
        assert!(decode_map("%%%").is_empty());
        assert!(decode_map("&&&").is_empty());
    }
}
