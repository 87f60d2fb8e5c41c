//! Response envelope and encoding policies.
//!
//! Handlers produce a transport-agnostic [`ProxyResponse`]; the
//! `IntoResponse` impl at the bottom is the hosting adapter that turns it
//! into wire bytes, base64-decoding compressed bodies first. Three encoding
//! policies exist: plain manifest text, gzip+base64 manifest text, and a
//! bodyless redirect.

use crate::error::{RelayError, Result};
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::{Compression, write::GzEncoder};
use std::io::Write;
use tracing::error;

const CONTENT_TYPE_HLS: &str = "application/x-mpegURL";
const ALLOW_ORIGIN_ANY: &str = "*";
const ALLOW_HEADERS: &str = "Content-Type, Origin";
const ALLOW_METHODS: &str = "POST, GET, OPTIONS";
const MAX_AGE_DAY: &str = "86400";

/// Outbound response envelope, produced once per request.
#[derive(Debug)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub body: Option<String>,
    /// When set, `body` is base64 text the transport must decode before
    /// writing bytes on the wire.
    pub is_body_base64: bool,
}

impl ProxyResponse {
    /// Plain manifest response: verbatim text, HLS content type, permissive
    /// CORS.
    pub fn manifest(content: String) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![
                (
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(CONTENT_TYPE_HLS),
                ),
                (
                    header::ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static(ALLOW_ORIGIN_ANY),
                ),
                (
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static(ALLOW_HEADERS),
                ),
            ],
            body: Some(content),
            is_body_base64: false,
        }
    }

    /// Compressed manifest response: gzip then base64, with
    /// `Content-Encoding: gzip` declared for the decoded bytes.
    pub fn compressed_manifest(content: &str) -> Result<Self> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content.as_bytes())?;
        let compressed = encoder.finish()?;

        let mut response = Self::manifest(BASE64.encode(compressed));
        response.headers.push((
            header::CONTENT_ENCODING,
            HeaderValue::from_static("gzip"),
        ));
        response.is_body_base64 = true;
        Ok(response)
    }

    /// Permanent redirect to `location`, no body.
    pub fn redirect(location: &str) -> Result<Self> {
        let location = HeaderValue::from_str(location).map_err(|_| {
            RelayError::InvalidOrigin(format!("Invalid redirect target: {location}"))
        })?;

        Ok(Self {
            status: StatusCode::MOVED_PERMANENTLY,
            headers: vec![
                (header::LOCATION, location),
                (
                    header::ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static(ALLOW_ORIGIN_ANY),
                ),
                (
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static(ALLOW_HEADERS),
                ),
            ],
            body: None,
            is_body_base64: false,
        })
    }

    /// CORS preflight: 204 with the fixed permissive header set.
    pub fn preflight() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            headers: vec![
                (
                    header::ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static(ALLOW_ORIGIN_ANY),
                ),
                (
                    header::ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static(ALLOW_METHODS),
                ),
                (
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static(ALLOW_HEADERS),
                ),
                (
                    header::ACCESS_CONTROL_MAX_AGE,
                    HeaderValue::from_static(MAX_AGE_DAY),
                ),
            ],
            body: None,
            is_body_base64: false,
        }
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = match (self.body, self.is_body_base64) {
            (Some(body), true) => match BASE64.decode(&body) {
                Ok(bytes) => (self.status, Body::from(bytes)).into_response(),
                Err(e) => {
                    error!("Invalid base64 response body: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            },
            (Some(body), false) => (self.status, body).into_response(),
            (None, _) => self.status.into_response(),
        };

        for (name, value) in self.headers {
            response.headers_mut().insert(name, value);
        }
        response
    }
}
