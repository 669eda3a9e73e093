//! Gate middleware.
//! Evaluates the active matcher and rejects requests that do not match.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::server::GateState;
use crate::http::X_REQUEST_ID;
use crate::matcher::MatchRequest;
use crate::observability::metrics;
use crate::replacer::VarsReplacer;

pub async fn gate_middleware(
    State(state): State<GateState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let outcome = {
        let active = state.matcher.load();
        let repl = VarsReplacer::from_request(&request);
        let outcome = active.matcher.evaluate(&request, &repl);

        tracing::debug!(
            request_id = request
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown"),
            module = %active.module,
            host = %MatchRequest::host(&request),
            outcome = outcome.as_str(),
            "Gate decision"
        );
        outcome
    };

    metrics::record_decision(outcome);

    if !outcome.is_match() {
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }

    next.run(request).await
}
