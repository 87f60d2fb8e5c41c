use crate::{
    error::Result,
    server::{
        context::{self, ProxyContext},
        response::ProxyResponse,
        state::AppState,
        url_validation::validate_manifest_url,
    },
};
use tracing::info;

/// Redirect a segment request to the true origin.
///
/// The relay never carries media bytes: the literal segment URI from `seg`
/// is joined onto `originPath` and handed back as a 301, letting the player
/// fetch the bytes directly.
pub fn handle(state: &AppState, ctx: &ProxyContext) -> Result<ProxyResponse> {
    let origin_path = ctx.require_origin_path()?;
    let seg = ctx.require_seg()?;
    validate_manifest_url(origin_path, !state.config.allow_private_origins)?;

    let segment_url = context::segment_url(origin_path, seg);

    info!("Redirecting segment to {}", segment_url);

    ProxyResponse::redirect(&segment_url)
}
