use std::time::Duration;

/// Polling intervals and timeouts of the desktop login flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginTimings {
    /// Delay between product-context phase polls
    pub poll_interval: Duration,
    /// Overall bound on the phase loop
    pub login_timeout: Duration,
    pub patch_interval: Duration,
    /// Bound on a single patch wait, independent of `login_timeout`
    pub patch_timeout: Duration,
    pub session_interval: Duration,
    pub session_timeout: Duration,
    /// Bound on a session stuck in `IN_PROGRESS`
    pub in_progress_timeout: Duration,
    pub username_interval: Duration,
    pub username_timeout: Duration,
}

impl Default for LoginTimings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            login_timeout: Duration::from_secs(180),
            patch_interval: Duration::from_secs(10),
            patch_timeout: Duration::from_secs(7200),
            session_interval: Duration::from_secs(1),
            session_timeout: Duration::from_secs(60),
            in_progress_timeout: Duration::from_secs(180),
            username_interval: Duration::from_secs(1),
            username_timeout: Duration::from_secs(20),
        }
    }
}

/// Options of the local credential authorizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizerOptions {
    /// Ask the client to remember the login
    pub persist_login: bool,
    /// User agent forwarded to the captcha service
    pub user_agent: String,
    pub site_url: String,
}

impl Default for AuthorizerOptions {
    fn default() -> Self {
        Self {
            persist_login: false,
            user_agent: lc_auth::config::USER_AGENT.to_string(),
            site_url: lc_auth::config::CAPTCHA_SITE_URL.to_string(),
        }
    }
}
