use crate::{
    error::Result,
    hls::{source::MultiVariantSource, version},
    server::{
        context::{self, ProxyContext},
        response::ProxyResponse,
        state::AppState,
        url_validation::validate_manifest_url,
    },
};
use tracing::info;

/// Serve a multi-variant playlist with every variant URI routed back
/// through the relay.
///
/// `originPath` is derived here, exactly once, from the directory component
/// of the requested manifest URL; every rewritten URI carries it forward so
/// the media-playlist stage can resolve against the origin without any
/// server-side state.
pub async fn handle(state: &AppState, ctx: &ProxyContext) -> Result<ProxyResponse> {
    let url = ctx.require_url()?;
    let manifest_url = validate_manifest_url(url, !state.config.allow_private_origins)?;

    let origin_path = context::parent_path(url).ok_or_else(|| {
        crate::error::RelayError::InvalidOrigin(format!("No path component in URL: {url}"))
    })?;

    info!("Serving multi-variant playlist for {}", url);

    let source = MultiVariantSource::fetch(&state.http_client, manifest_url).await?;
    let mut content = source.to_text(|_uri| ctx.variant_params(origin_path))?;

    if let Some(target) = ctx.force_version() {
        content = version::force_version(&content, target);
    }

    Ok(ProxyResponse::manifest(content))
}
