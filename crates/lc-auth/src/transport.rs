use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Proxy, Response};
use rustls::crypto::{CryptoProvider, ring};
use tracing::debug;

use crate::config::RsoConfig;
use crate::errors::{Endpoint, Result, RsoError};

/// Build the HTTP client every component talks through
///
/// `cookies` is attached only for authorization sessions; all other clients
/// are stateless apart from connection pooling.
pub fn build_client(config: &RsoConfig, cookies: Option<Arc<Jar>>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));

    let mut builder = Client::builder()
        .connect_timeout(config.http_timeouts.connect)
        .timeout(config.http_timeouts.request)
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .https_only(config.https_only);

    if config.pinned_tls {
        builder = builder.use_preconfigured_tls(pinned_tls_config()?);
    }

    if let Some(proxy) = &config.proxy {
        let mut p = Proxy::all(proxy.url())?;
        if let (Some(user), Some(pass)) = (&proxy.username, &proxy.password) {
            p = p.basic_auth(user, pass);
        }
        debug!("Routing requests through proxy {}:{}", proxy.host, proxy.port);
        builder = builder.proxy(p);
    }

    if let Some(jar) = cookies {
        builder = builder.cookie_provider(jar);
    }

    Ok(builder.build()?)
}

/// TLS 1.2+ restricted to the ECDHE AEAD suites and the P-256 curve
fn pinned_tls_config() -> Result<rustls::ClientConfig> {
    let base = ring::default_provider();
    let provider = CryptoProvider {
        cipher_suites: vec![
            ring::cipher_suite::TLS13_AES_128_GCM_SHA256,
            ring::cipher_suite::TLS13_AES_256_GCM_SHA384,
            ring::cipher_suite::TLS13_CHACHA20_POLY1305_SHA256,
            ring::cipher_suite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
            ring::cipher_suite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            ring::cipher_suite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
            ring::cipher_suite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
            ring::cipher_suite::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
            ring::cipher_suite::TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
        ],
        kx_groups: vec![ring::kx_group::SECP256R1],
        ..base
    };

    let roots = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = rustls::ClientConfig::builder_with_provider(Arc::new(provider))
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(config)
}

/// Pass successful responses through, turn the rest into a tagged upstream error
pub async fn ensure_success(endpoint: Endpoint, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!("{} failed with HTTP {}", endpoint, status);
    Err(RsoError::upstream(endpoint, status, &body))
}

/// Read a body and decode it, reporting decode failures as parse errors
pub async fn read_json<T: serde::de::DeserializeOwned>(
    endpoint: Endpoint,
    response: Response,
) -> Result<T> {
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| lc_core::ParseError::new(format!("{endpoint} response"), e).into())
}
