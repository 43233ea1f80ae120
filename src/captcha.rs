use std::process::Stdio;

use lc_auth::{CaptchaError, CaptchaGateway, CaptchaRequest};
use tokio::process::Command;
use tracing::{debug, instrument};

/// Exit status a solver uses for a rejected API key
const EXIT_BAD_KEY: i32 = 2;
/// Exit status a solver uses for an empty balance
const EXIT_ZERO_BALANCE: i32 = 3;

/// Solves captchas by running an external program
///
/// The challenge is passed through `CAPTCHA_*` environment variables and the
/// proof is read from the program's standard output. A configured proxy is
/// passed as `CAPTCHA_PROXY`, with its credentials in `CAPTCHA_PROXY_USERNAME`
/// and `CAPTCHA_PROXY_PASSWORD`.
#[derive(Debug, Clone)]
pub struct CommandCaptchaGateway {
    program: String,
    args: Vec<String>,
}

impl CommandCaptchaGateway {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait::async_trait]
impl CaptchaGateway for CommandCaptchaGateway {
    #[instrument(skip_all, fields(program = %self.program))]
    async fn solve(&self, request: &CaptchaRequest<'_>) -> Result<String, CaptchaError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env("CAPTCHA_SERVICE_ID", request.service_id)
            .env("CAPTCHA_SERVICE_KEY", request.service_key)
            .env("CAPTCHA_SITE_KEY", request.site_key)
            .env("CAPTCHA_SITE_URL", request.site_url)
            .env("CAPTCHA_USER_AGENT", request.user_agent)
            .env("CAPTCHA_PAYLOAD", request.challenge_payload)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(proxy) = request.proxy {
            command.env("CAPTCHA_PROXY", proxy.url());
            if let Some(username) = &proxy.username {
                command.env("CAPTCHA_PROXY_USERNAME", username);
            }
            if let Some(password) = &proxy.password {
                command.env("CAPTCHA_PROXY_PASSWORD", password);
            }
        }

        debug!("Running captcha solver");
        let output = command
            .output()
            .await
            .map_err(|e| CaptchaError::Failed(format!("failed to run {}: {e}", self.program)))?;

        match output.status.code() {
            Some(0) => {}
            Some(EXIT_BAD_KEY) => return Err(CaptchaError::BadKey),
            Some(EXIT_ZERO_BALANCE) => return Err(CaptchaError::ZeroBalance),
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(CaptchaError::Failed(stderr.trim().chars().take(200).collect()));
            }
        }

        let proof = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if proof.is_empty() {
            return Err(CaptchaError::Failed("solver printed no proof".into()));
        }
        Ok(proof)
    }
}
