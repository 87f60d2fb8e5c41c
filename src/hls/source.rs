//! Fetched manifest sources with per-URI query rewriting.
//!
//! A source is fetched once (one awaited network round-trip) and can then be
//! serialized any number of times. Serialization walks every URI in the
//! playlist, hands it to a rewrite callback, and appends the returned query
//! parameters to the rewritten URI. Callbacks are pure and invoked once per
//! URI, so repeated serialization yields identical output.

use crate::error::{RelayError, Result};
use crate::server::query::QueryParams;
use m3u8_rs::{MasterPlaylist, MediaPlaylist, Playlist};
use reqwest::Client;
use tracing::info;
use url::{Url, form_urlencoded};

/// Append rewrite parameters to a URI as a query string.
fn rewrite_uri(uri: &str, params: &QueryParams) -> String {
    if params.is_empty() {
        return uri.to_string();
    }

    let query: String = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{uri}{separator}{query}")
}

/// GET a manifest URL, surfacing failures with the offending URL attached.
async fn fetch_text(client: &Client, url: &Url) -> Result<String> {
    let wrap = |source: reqwest::Error| RelayError::UpstreamFetch {
        url: url.to_string(),
        source,
    };

    let response = client
        .get(url.clone())
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(wrap)?;

    response.text().await.map_err(wrap)
}

/// Serialize a playlist into manifest text.
fn write_playlist<W: FnOnce(&mut Vec<u8>) -> std::io::Result<()>>(write: W) -> Result<String> {
    let mut output = Vec::new();
    write(&mut output)?;
    String::from_utf8(output)
        .map_err(|e| RelayError::Internal(format!("Manifest is not valid UTF-8: {e}")))
}

/// A fetched multi-variant (master) playlist.
#[derive(Debug)]
pub struct MultiVariantSource {
    url: Url,
    playlist: MasterPlaylist,
}

impl MultiVariantSource {
    /// Parse a multi-variant playlist from manifest text.
    pub fn from_text(url: Url, content: &str) -> Result<Self> {
        match m3u8_rs::parse_playlist_res(content.as_bytes()) {
            Ok(Playlist::MasterPlaylist(playlist)) => Ok(Self { url, playlist }),
            Ok(Playlist::MediaPlaylist(_)) => Err(RelayError::PlaylistParse {
                url: url.to_string(),
                message: "expected a multi-variant playlist, got a media playlist".to_string(),
            }),
            Err(e) => Err(RelayError::PlaylistParse {
                url: url.to_string(),
                message: format!("{e:?}"),
            }),
        }
    }

    /// Fetch and parse the multi-variant playlist at `url`.
    pub async fn fetch(client: &Client, url: Url) -> Result<Self> {
        info!("Fetching multi-variant playlist from {}", url);
        let content = fetch_text(client, &url).await?;
        Self::from_text(url, &content)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Serialize with `rewrite` applied to every variant URI and every
    /// alternative rendition that carries a URI.
    pub fn to_text(&self, rewrite: impl Fn(&str) -> QueryParams) -> Result<String> {
        let mut playlist = self.playlist.clone();

        for variant in &mut playlist.variants {
            variant.uri = rewrite_uri(&variant.uri, &rewrite(&variant.uri));
        }
        for alternative in &mut playlist.alternatives {
            if let Some(uri) = alternative.uri.take() {
                alternative.uri = Some(rewrite_uri(&uri, &rewrite(&uri)));
            }
        }

        write_playlist(|out| playlist.write_to(out))
    }
}

/// A fetched media playlist.
///
/// When a resolution base is present, segment URIs are absolutized against
/// it before the rewrite parameters are appended; without one, the literal
/// URIs are preserved.
pub struct MediaPlaylistSource {
    url: Url,
    base: Option<Url>,
    playlist: MediaPlaylist,
}

impl MediaPlaylistSource {
    /// Parse a media playlist from manifest text.
    pub fn from_text(url: Url, base: Option<Url>, content: &str) -> Result<Self> {
        match m3u8_rs::parse_playlist_res(content.as_bytes()) {
            Ok(Playlist::MediaPlaylist(playlist)) => Ok(Self {
                url,
                base,
                playlist,
            }),
            Ok(Playlist::MasterPlaylist(_)) => Err(RelayError::PlaylistParse {
                url: url.to_string(),
                message: "expected a media playlist, got a multi-variant playlist".to_string(),
            }),
            Err(e) => Err(RelayError::PlaylistParse {
                url: url.to_string(),
                message: format!("{e:?}"),
            }),
        }
    }

    /// Fetch and parse the media playlist at `url`.
    pub async fn fetch(client: &Client, url: Url, base: Option<Url>) -> Result<Self> {
        info!("Fetching media playlist from {}", url);
        let content = fetch_text(client, &url).await?;
        Self::from_text(url, base, &content)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn resolve(&self, uri: &str) -> String {
        match &self.base {
            Some(base) => base
                .join(uri)
                .map(Into::into)
                .unwrap_or_else(|_| uri.to_string()),
            None => uri.to_string(),
        }
    }

    /// Serialize with `rewrite` applied to every segment URI and every
    /// `EXT-X-MAP` URI. The callback always receives the literal URI as it
    /// appeared in the fetched manifest.
    pub fn to_text(&self, rewrite: impl Fn(&str) -> QueryParams) -> Result<String> {
        let mut playlist = self.playlist.clone();

        for segment in &mut playlist.segments {
            segment.uri = rewrite_uri(&self.resolve(&segment.uri), &rewrite(&segment.uri));
            if let Some(map) = &mut segment.map {
                map.uri = rewrite_uri(&self.resolve(&map.uri), &rewrite(&map.uri));
            }
        }

        write_playlist(|out| playlist.write_to(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U\n\
        #EXT-X-VERSION:6\n\
        #EXT-X-INDEPENDENT-SEGMENTS\n\
        #EXT-X-STREAM-INF:BANDWIDTH=1000000,RESOLUTION=640x360\n\
        v0/media.m3u8\n\
        #EXT-X-STREAM-INF:BANDWIDTH=3000000,RESOLUTION=1280x720\n\
        v1/media.m3u8\n";

    const MEDIA: &str = "#EXTM3U\n\
        #EXT-X-VERSION:6\n\
        #EXT-X-TARGETDURATION:4\n\
        #EXT-X-MEDIA-SEQUENCE:0\n\
        #EXTINF:4.0,\n\
        seg-0.ts\n\
        #EXTINF:4.0,\n\
        seg-1.ts\n\
        #EXT-X-ENDLIST\n";

    fn origin_url(path: &str) -> Url {
        Url::parse(&format!("https://origin.example{path}")).unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn rewrite_uri_appends_encoded_query() {
        let rewritten = rewrite_uri(
            "v0/media.m3u8",
            &params(&[("originPath", "https://origin.example/live")]),
        );
        assert_eq!(
            rewritten,
            "v0/media.m3u8?originPath=https%3A%2F%2Forigin.example%2Flive"
        );
    }

    #[test]
    fn rewrite_uri_extends_existing_query() {
        let rewritten = rewrite_uri("v0/media.m3u8?token=abc", &params(&[("seg", "x.ts")]));
        assert_eq!(rewritten, "v0/media.m3u8?token=abc&seg=x.ts");
    }

    #[test]
    fn rewrite_uri_with_no_params_is_identity() {
        assert_eq!(
            rewrite_uri("v0/media.m3u8", &QueryParams::new()),
            "v0/media.m3u8"
        );
    }

    #[test]
    fn master_rewrites_every_variant() {
        let source =
            MultiVariantSource::from_text(origin_url("/live/master.m3u8"), MASTER).unwrap();
        let out = source
            .to_text(|_uri| params(&[("originPath", "https://origin.example/live")]))
            .unwrap();

        assert!(out.contains("v0/media.m3u8?originPath=https%3A%2F%2Forigin.example%2Flive"));
        assert!(out.contains("v1/media.m3u8?originPath=https%3A%2F%2Forigin.example%2Flive"));
        assert!(out.contains("#EXT-X-STREAM-INF"));
    }

    #[test]
    fn master_serialization_is_repeatable() {
        let source =
            MultiVariantSource::from_text(origin_url("/live/master.m3u8"), MASTER).unwrap();
        let rewrite = |_uri: &str| params(&[("originPath", "https://origin.example/live")]);
        assert_eq!(
            source.to_text(rewrite).unwrap(),
            source.to_text(rewrite).unwrap()
        );
    }

    #[test]
    fn master_rejects_media_playlist_content() {
        let err = MultiVariantSource::from_text(origin_url("/live/master.m3u8"), MEDIA)
            .unwrap_err();
        // Parse failures carry the offending URL for the error envelope
        assert!(err.to_string().contains("/live/master.m3u8"));
    }

    #[test]
    fn media_absolutizes_against_base() {
        let base = Url::parse("https://origin.example/live/").unwrap();
        let source =
            MediaPlaylistSource::from_text(origin_url("/live/v0.m3u8"), Some(base), MEDIA).unwrap();
        let out = source.to_text(crate::server::context::direct_params).unwrap();

        assert!(out.contains("https://origin.example/live/seg-0.ts"));
        assert!(out.contains("https://origin.example/live/seg-1.ts"));
        assert!(!out.contains('?'), "direct strategy appends no query");
    }

    #[test]
    fn media_keeps_absolute_uris_as_is() {
        let media = "#EXTM3U\n#EXT-X-VERSION:6\n#EXT-X-TARGETDURATION:4\n\
            #EXTINF:4.0,\nhttps://cdn.example/abs/seg-0.ts\n#EXT-X-ENDLIST\n";
        let base = Url::parse("https://origin.example/live/").unwrap();
        let source =
            MediaPlaylistSource::from_text(origin_url("/live/v0.m3u8"), Some(base), media).unwrap();
        let out = source.to_text(crate::server::context::direct_params).unwrap();

        assert!(out.contains("https://cdn.example/abs/seg-0.ts"));
    }

    #[test]
    fn media_without_base_keeps_literal_uris_and_appends_params() {
        let source = MediaPlaylistSource::from_text(origin_url("/live/v0.m3u8"), None, MEDIA)
            .unwrap();
        let out = source
            .to_text(|uri| params(&[("seg", uri), ("originPath", "https://origin.example/live")]))
            .unwrap();

        assert!(out.contains("seg-0.ts?originPath=https%3A%2F%2Forigin.example%2Flive&seg=seg-0.ts"));
        assert!(out.contains("seg-1.ts?originPath=https%3A%2F%2Forigin.example%2Flive&seg=seg-1.ts"));
    }

    #[test]
    fn media_rejects_master_content() {
        assert!(MediaPlaylistSource::from_text(origin_url("/live/v0.m3u8"), None, MASTER).is_err());
    }
}
