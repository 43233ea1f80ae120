use thiserror::Error;

use crate::config::ProxyConfig;

/// Challenge issued by the login-initiation endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaChallenge {
    pub site_key: String,
    pub payload: String,
}

/// Captcha service account used to solve challenges
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaptchaService {
    /// Service identifier understood by the gateway
    pub service_id: String,
    /// API key for that service
    pub service_key: String,
}

/// Everything a gateway needs to solve one challenge
#[derive(Debug, Clone)]
pub struct CaptchaRequest<'a> {
    pub service_id: &'a str,
    pub service_key: &'a str,
    pub site_key: &'a str,
    pub site_url: &'a str,
    pub user_agent: &'a str,
    pub challenge_payload: &'a str,
    pub proxy: Option<&'a ProxyConfig>,
}

/// Classified captcha failures; every variant aborts the handshake
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptchaError {
    #[error("Captcha service rejected the API key")]
    BadKey,

    #[error("Captcha service balance is zero")]
    ZeroBalance,

    #[error("Captcha solving failed: {0}")]
    Failed(String),
}

/// Opaque captcha solver
#[async_trait::async_trait]
pub trait CaptchaGateway: Send + Sync {
    /// Solve the challenge and return the proof token
    async fn solve(&self, request: &CaptchaRequest<'_>) -> Result<String, CaptchaError>;
}

/// Gateway returning a fixed proof, for stubs and testing
#[derive(Debug, Clone)]
pub struct StaticCaptchaSolver {
    proof: String,
}

impl StaticCaptchaSolver {
    pub fn new(proof: impl Into<String>) -> Self {
        Self {
            proof: proof.into(),
        }
    }
}

#[async_trait::async_trait]
impl CaptchaGateway for StaticCaptchaSolver {
    async fn solve(&self, _request: &CaptchaRequest<'_>) -> Result<String, CaptchaError> {
        Ok(self.proof.clone())
    }
}
