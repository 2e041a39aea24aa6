use std::sync::Arc;
use std::time::Duration;

use hyper::body::{Bytes, to_bytes};
use hyper::client::HttpConnector;
use hyper::{Body, Client, Request, StatusCode};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use tokio::time::timeout;
use webpki_roots::TLS_SERVER_ROOTS;

use crate::traits::{AdapterError, AdapterResult};

pub(crate) type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

#[allow(clippy::unnecessary_wraps)]
pub(crate) fn build_https_client() -> AdapterResult<HyperClient> {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    // Plain HTTP stays enabled for the instance metadata endpoint.
    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let connector = HttpsConnector::from((http, Arc::new(config)));

    Ok(Client::builder().build::<_, Body>(connector))
}

/// Sends `request` and buffers the body, mapping non-success statuses to
/// [`AdapterError::Status`].
pub(crate) async fn send(
    client: &HyperClient,
    request: Request<Body>,
    limit: Duration,
    service: &'static str,
) -> AdapterResult<Bytes> {
    let response = timeout(limit, client.request(request))
        .await
        .map_err(|_| AdapterError::transport(format!("{service} request timed out")))?
        .map_err(|err| AdapterError::transport(format!("{service} request failed: {err}")))?;

    let status = response.status();
    let bytes = to_bytes(response.into_body()).await.map_err(|err| {
        AdapterError::transport(format!("failed to read {service} response: {err}"))
    })?;

    ensure_success(service, status, &bytes)?;
    Ok(bytes)
}

pub(crate) fn ensure_success(
    service: &'static str,
    status: StatusCode,
    body: &[u8],
) -> AdapterResult<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(AdapterError::Status {
        service,
        status: status.as_u16(),
        body: String::from_utf8_lossy(body).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_pass() {
        assert!(ensure_success("test", StatusCode::OK, b"").is_ok());
    }

    #[test]
    fn failure_statuses_keep_body() {
        let err = ensure_success("test", StatusCode::NOT_FOUND, b"SecretNotFound").unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.response_body(), Some("SecretNotFound"));
    }
}
