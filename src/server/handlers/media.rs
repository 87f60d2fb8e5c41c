use crate::{
    config::SegmentStrategy,
    error::Result,
    hls::{source::MediaPlaylistSource, version},
    server::{
        context::{self, ProxyContext},
        response::ProxyResponse,
        state::AppState,
        url_validation::validate_manifest_url,
    },
};
use tracing::info;
use url::Url;

/// Serve a media playlist resolved against the origin directory carried in
/// `originPath`.
///
/// Under the direct strategy, segment URIs are absolutized so the player
/// fetches media bytes straight from the origin and the response goes out
/// plain. Under the redirect strategy, segment URIs keep pointing at the
/// relay with `seg` set to the literal URI, and the response is
/// gzip-compressed.
pub async fn handle(state: &AppState, path: &str, ctx: &ProxyContext) -> Result<ProxyResponse> {
    let origin_path = ctx.require_origin_path()?;
    validate_manifest_url(origin_path, !state.config.allow_private_origins)?;

    let media_url = context::media_playlist_url(origin_path, path);
    let parsed = Url::parse(&media_url).map_err(|_| {
        crate::error::RelayError::InvalidOrigin(format!("Invalid media playlist URL: {media_url}"))
    })?;

    info!("Serving media playlist for {}", media_url);

    match state.config.segment_strategy {
        SegmentStrategy::Direct => {
            let base = context::resolution_base(origin_path)?;
            let source = MediaPlaylistSource::fetch(&state.http_client, parsed, Some(base)).await?;
            let mut content = source.to_text(context::direct_params)?;

            if let Some(target) = ctx.force_version() {
                content = version::force_version(&content, target);
            }

            Ok(ProxyResponse::manifest(content))
        }
        SegmentStrategy::Redirect => {
            let source = MediaPlaylistSource::fetch(&state.http_client, parsed, None).await?;
            let mut content = source.to_text(|uri| ctx.segment_params(uri))?;

            if let Some(target) = ctx.force_version() {
                content = version::force_version(&content, target);
            }

            ProxyResponse::compressed_manifest(&content)
        }
    }
}
