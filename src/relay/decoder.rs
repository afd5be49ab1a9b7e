//! Submission decoder
//!
//! Turns a form-encoded datagram payload (`name=Jane&message=Hi+there`)
//! into an ordered field map.

use indexmap::IndexMap;
use percent_encoding::percent_decode;
use serde::Serialize;

use crate::error::{RelayError, Result};

/// Decoded contact form submission, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubmissionRecord(IndexMap<String, String>);

impl SubmissionRecord {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SubmissionRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Decode a raw form body.
///
/// The whole body is percent-decoded first (`+` is a space), then split on
/// `&` and each segment split once on its first `=`. Values are trimmed.
/// A body that decodes to nothing yields an empty record; any segment
/// without `=` rejects the whole payload.
pub fn decode(payload: &[u8]) -> Result<SubmissionRecord> {
    let plus_as_space: Vec<u8> = payload
        .iter()
        .map(|&b| if b == b'+' { b' ' } else { b })
        .collect();
    let body = percent_decode(&plus_as_space)
        .decode_utf8()
        .map_err(|e| RelayError::malformed(format!("payload is not valid UTF-8: {e}")))?;

    if body.trim().is_empty() {
        return Ok(SubmissionRecord::default());
    }

    let mut fields = IndexMap::new();
    for segment in body.split('&') {
        let Some((key, value)) = segment.split_once('=') else {
            return Err(RelayError::malformed(format!(
                "segment '{segment}' has no '=' separator"
            )));
        };
        fields.insert(key.to_string(), value.trim().to_string());
    }

    Ok(SubmissionRecord(fields))
}
