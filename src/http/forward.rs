//! Forwarding of matched requests to the upstream.

use axum::{
    body::Body,
    http::{
        header,
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri, Version,
    },
    response::{IntoResponse, Response},
};
use hyper_util::client::legacy::{connect::HttpConnector, Client};

use crate::http::X_REQUEST_ID;
use crate::observability::metrics;

/// HTTP client used for upstream requests.
pub type UpstreamClient = Client<HttpConnector, Body>;

/// Send `request` to `upstream`, streaming both bodies.
///
/// The original `Host` header is preserved; upstream failures become `502`.
pub async fn forward(client: &UpstreamClient, upstream: &Authority, request: Request<Body>) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Could not build upstream URI");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };
    parts.version = Version::HTTP_11;
    parts.headers.remove(header::CONNECTION);

    tracing::debug!(request_id = %request_id, uri = %parts.uri, "Forwarding request");

    match client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, upstream = %upstream, error = %e, "Upstream error");
            metrics::record_upstream_error();
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
