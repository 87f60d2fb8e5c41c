//! Query-string normalization.
//!
//! Inbound transports deliver query values in inconsistent states of
//! decoding (raw percent-escapes, embedded `&`/`=`). The normalizer
//! re-serializes the mapping and re-parses it with a standard
//! `application/x-www-form-urlencoded` parser, so business logic always sees
//! consistently decoded values. An already-decoded mapping is a fixpoint.

use std::collections::BTreeMap;
use url::form_urlencoded;

/// Flat query mapping with deterministic iteration order.
pub type QueryParams = BTreeMap<String, String>;

/// Transport-level split of a raw query string into key/value pairs.
///
/// No percent-decoding happens here; pairs are split on `&` and the first
/// `=` only. Decoding is the normalizer's job.
pub fn raw_params(query: &str) -> QueryParams {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Canonicalize a query mapping.
///
/// Reconstructs a query string from the existing pairs and re-splits it with
/// `form_urlencoded`, overwriting each key with the freshly parsed value.
/// Values that decode into new `&`-separated pairs show up as extra keys,
/// matching how a standard parser would have read the original wire form.
pub fn normalize(params: &QueryParams) -> QueryParams {
    let raw = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut out = params.clone();
    for (k, v) in form_urlencoded::parse(raw.as_bytes()) {
        out.insert(k.into_owned(), v.into_owned());
    }
    out
}
