//! URL context codec.
//!
//! All state the relay threads across a playlist's lifetime travels as query
//! parameters on the URLs handed back to the player:
//!
//! - `url`         absolute multi-variant manifest URL (initial request only)
//! - `originPath`  directory-level base URL for resolving relative URIs,
//!   propagated WITHOUT a trailing slash
//! - `seg`         literal segment URI, set under the redirect strategy
//! - `forceVersion` optional protocol version override
//!
//! This module owns both directions: reading the parameters off an inbound
//! request, and producing the parameter sets appended to rewritten URIs.

use crate::error::{RelayError, Result};
use crate::server::query::QueryParams;
use url::Url;

pub const PARAM_URL: &str = "url";
pub const PARAM_ORIGIN_PATH: &str = "originPath";
pub const PARAM_SEGMENT: &str = "seg";
pub const PARAM_FORCE_VERSION: &str = "forceVersion";

/// Per-request view over the normalized query mapping.
#[derive(Debug, Clone)]
pub struct ProxyContext {
    params: QueryParams,
}

impl ProxyContext {
    pub fn new(params: QueryParams) -> Self {
        Self { params }
    }

    pub fn url(&self) -> Option<&str> {
        self.params.get(PARAM_URL).map(String::as_str)
    }

    pub fn origin_path(&self) -> Option<&str> {
        self.params.get(PARAM_ORIGIN_PATH).map(String::as_str)
    }

    pub fn seg(&self) -> Option<&str> {
        self.params.get(PARAM_SEGMENT).map(String::as_str)
    }

    /// Requested manifest version, if present and numeric.
    ///
    /// Unparseable values are treated as absent rather than propagating
    /// garbage into the version tag.
    pub fn force_version(&self) -> Option<u32> {
        self.params
            .get(PARAM_FORCE_VERSION)
            .and_then(|v| v.parse().ok())
    }

    pub fn require_url(&self) -> Result<&str> {
        self.url().ok_or(RelayError::MissingParameter(PARAM_URL))
    }

    pub fn require_origin_path(&self) -> Result<&str> {
        self.origin_path()
            .ok_or(RelayError::MissingParameter(PARAM_ORIGIN_PATH))
    }

    pub fn require_seg(&self) -> Result<&str> {
        self.seg().ok_or(RelayError::MissingParameter(PARAM_SEGMENT))
    }

    /// Parameter set for rewritten variant URIs in a multi-variant playlist:
    /// the current request parameters with `originPath` set, so each child
    /// request carries enough context to resolve against the origin.
    pub fn variant_params(&self, origin_path: &str) -> QueryParams {
        let mut params = self.params.clone();
        params.insert(
            PARAM_ORIGIN_PATH.to_string(),
            origin_path.trim_end_matches('/').to_string(),
        );
        params
    }

    /// Parameter set for rewritten segment URIs under the redirect strategy:
    /// the current request parameters with `seg` set to the literal URI.
    pub fn segment_params(&self, seg_uri: &str) -> QueryParams {
        let mut params = self.params.clone();
        params.insert(PARAM_SEGMENT.to_string(), seg_uri.to_string());
        params
    }
}

/// Parameter set for the direct-origin strategy: segment URIs bypass the
/// relay entirely, so nothing is appended.
pub fn direct_params(_uri: &str) -> QueryParams {
    QueryParams::new()
}

/// Everything before the final `/` segment of a manifest URL.
///
/// This is the authoritative derivation of `originPath`, done exactly once
/// at the multi-variant stage. Returns `None` for URLs with no path
/// component (nothing after the host to strip).
pub fn parent_path(url: &str) -> Option<&str> {
    let (base, _) = url.rsplit_once('/')?;
    if base.is_empty() || base.ends_with('/') || base.ends_with(':') {
        return None;
    }
    Some(base)
}

/// Absolute media playlist URL: `originPath` + request path.
///
/// `originPath` never carries a trailing slash and the request path always
/// starts with one, so plain concatenation cannot double a slash.
pub fn media_playlist_url(origin_path: &str, request_path: &str) -> String {
    format!("{}{}", origin_path.trim_end_matches('/'), request_path)
}

/// Segment redirect target: `originPath` + `/` + literal segment URI.
pub fn segment_url(origin_path: &str, seg: &str) -> String {
    format!("{}/{}", origin_path.trim_end_matches('/'), seg)
}

/// Base URL for resolving relative URIs found in a media playlist.
///
/// `Url::join` treats the last path segment as a file unless the base ends
/// with `/`, so the directory form is restored here.
pub fn resolution_base(origin_path: &str) -> Result<Url> {
    let dir = format!("{}/", origin_path.trim_end_matches('/'));
    Url::parse(&dir)
        .map_err(|_| RelayError::InvalidOrigin(format!("Not an absolute URL: {origin_path}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> ProxyContext {
        ProxyContext::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn parent_path_strips_final_segment() {
        assert_eq!(
            parent_path("https://origin.example/live/ch1/master.m3u8"),
            Some("https://origin.example/live/ch1")
        );
    }

    #[test]
    fn parent_path_of_host_root_manifest() {
        assert_eq!(
            parent_path("https://origin.example/master.m3u8"),
            Some("https://origin.example")
        );
    }

    #[test]
    fn parent_path_rejects_hostless_urls() {
        assert_eq!(parent_path("https://origin.example"), None);
        assert_eq!(parent_path("master.m3u8"), None);
        assert_eq!(parent_path("https://origin.example//"), None);
    }

    #[test]
    fn parent_path_keeps_query_intact() {
        // Derivation is string-level; a query on the final segment stays
        // with the segment, not the parent.
        assert_eq!(
            parent_path("https://origin.example/live/master.m3u8?token=abc"),
            Some("https://origin.example/live")
        );
    }

    #[test]
    fn variant_params_set_origin_path_and_keep_the_rest() {
        let c = ctx(&[
            ("url", "https://origin.example/live/master.m3u8"),
            ("forceVersion", "4"),
        ]);
        let p = c.variant_params("https://origin.example/live");
        assert_eq!(p["originPath"], "https://origin.example/live");
        assert_eq!(p["forceVersion"], "4");
        assert_eq!(p["url"], "https://origin.example/live/master.m3u8");
    }

    #[test]
    fn variant_params_never_carry_trailing_slash() {
        let c = ctx(&[]);
        let p = c.variant_params("https://origin.example/live/");
        assert_eq!(p["originPath"], "https://origin.example/live");
    }

    #[test]
    fn segment_params_set_literal_uri() {
        let c = ctx(&[("originPath", "https://origin.example/live")]);
        let p = c.segment_params("seg-00042.ts");
        assert_eq!(p["seg"], "seg-00042.ts");
        assert_eq!(p["originPath"], "https://origin.example/live");
    }

    #[test]
    fn direct_params_are_empty() {
        assert!(direct_params("seg-00042.ts").is_empty());
    }

    #[test]
    fn media_url_concatenation_has_no_double_slash() {
        assert_eq!(
            media_playlist_url("https://origin.example/live", "/v0/media.m3u8"),
            "https://origin.example/live/v0/media.m3u8"
        );
        assert_eq!(
            media_playlist_url("https://origin.example/live/", "/v0/media.m3u8"),
            "https://origin.example/live/v0/media.m3u8"
        );
    }

    #[test]
    fn segment_url_concatenation() {
        assert_eq!(
            segment_url("https://origin.example/abc", "seg1.ts"),
            "https://origin.example/abc/seg1.ts"
        );
    }

    #[test]
    fn resolution_base_restores_directory_form() {
        let base = resolution_base("https://origin.example/live").unwrap();
        assert_eq!(
            base.join("seg1.ts").unwrap().as_str(),
            "https://origin.example/live/seg1.ts"
        );
    }

    #[test]
    fn force_version_ignores_garbage() {
        assert_eq!(ctx(&[("forceVersion", "4")]).force_version(), Some(4));
        assert_eq!(ctx(&[("forceVersion", "latest")]).force_version(), None);
        assert_eq!(ctx(&[]).force_version(), None);
    }

    #[test]
    fn require_reports_missing_parameter() {
        let err = ctx(&[]).require_origin_path().unwrap_err();
        assert!(err.to_string().contains("originPath"));
    }
}
