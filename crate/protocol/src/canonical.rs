//! Canonical signing string.
//!
//! `key=value` pairs sorted by key (byte order), joined by `&`. The `sign` field and empty
//! values are left out, values are inserted verbatim without any URL escaping. Signer and
//! verifier must produce byte-identical output.

use crate::{FieldMapping, SIGN};

#[must_use]
pub fn encode(fields: &FieldMapping) -> String {
    let mut pairs: Vec<(&str, String)> = fields
        .iter()
        .filter(|(k, v)| *k != SIGN && !v.is_empty())
        .map(|(k, v)| (k, v.to_string()))
        .collect();
    // keys are unique, an unstable sort is enough
    pairs.sort_unstable_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));

    let mut out = String::new();
    for (i, (k, v)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(k);
        out.push('=');
        out.push_str(v);
    }
    out
}
