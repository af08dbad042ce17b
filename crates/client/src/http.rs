//! Shared HTTP plumbing for both authority clients.

use korp_core::{ApiError, Classifier, ErrorKind};
use reqwest::Response;
use serde::de::DeserializeOwned;

/// A send error means no response reached the service.
pub(crate) fn transport_error(err: reqwest::Error) -> ApiError {
    tracing::debug!(%err, "transport failure");
    ApiError::connection_unavailable()
}

/// Decode a 2xx body, or classify anything else.
pub(crate) async fn decode<T: DeserializeOwned>(
    resp: Response,
    classifier: &Classifier,
) -> Result<T, ApiError> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>().await.map_err(|err| {
            ApiError::new(ErrorKind::Unknown, format!("malformed response body: {err}"))
        })
    } else {
        let body = resp.text().await.ok();
        Err(classifier.classify(status.as_u16(), body.as_deref()))
    }
}
