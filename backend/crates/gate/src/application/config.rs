//! Application Configuration
//!
//! [`GateSettings`] is the raw, serde-friendly surface; [`GateConfig`] is
//! the compiled form shared read-only by every handler.

use crate::domain::header::HeaderMatcher;
use crate::domain::network::NetworkMatcher;
use crate::domain::services::ExemptionConfig;
use crate::error::{GateError, GateResult, InvalidIpLiteral};
use chrono::TimeDelta;
use kernel::error::kind::ErrorKind;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Re-export SameSite from platform
pub use platform::cookie::{SameSite, SessionCookie};

const ENV_PREFIX: &str = "GATE_";

/// Raw gate settings with documented defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    /// HMAC signing key for challenges and session cookies (required)
    pub hmac_key: Option<String>,
    /// Upper bound of the puzzle number
    pub max_number: u64,
    pub challenge_expire_minutes: u64,
    pub auth_expire_minutes: u64,
    /// Session key holding the authorization expiry
    pub session_key: String,
    /// Session key prefix for stashed referrers
    pub referer_prefix: String,
    pub session_cookie_name: String,
    pub cookie_secure: bool,
    pub challenge_path: String,
    pub submit_path: String,
    pub exempt_paths: Vec<String>,
    pub exempt_ips: Vec<String>,
    /// Header name -> case-insensitive pattern
    pub exempt_headers: BTreeMap<String, String>,
    /// Extra parameters embedded in each challenge salt
    pub salt_params: BTreeMap<String, String>,
    pub message: String,
    pub help_message: String,
    pub fail_message: String,
    /// 400 or 429
    pub failure_status: u16,
    pub js_url: String,
    pub css_url: String,
    pub site_icon_url: String,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            hmac_key: None,
            max_number: 1_000_000,
            challenge_expire_minutes: 2,
            auth_expire_minutes: 480,
            session_key: "gate_verified".to_string(),
            referer_prefix: "gate_referer:".to_string(),
            session_cookie_name: "gate_session".to_string(),
            cookie_secure: true,
            challenge_path: "/challenge".to_string(),
            submit_path: "/submit".to_string(),
            exempt_paths: Vec::new(),
            exempt_ips: Vec::new(),
            exempt_headers: BTreeMap::new(),
            salt_params: BTreeMap::new(),
            message: "Gauging your humanity...This may take some seconds.".to_string(),
            help_message: String::new(),
            fail_message: "Challenge failed or no longer valid.".to_string(),
            failure_status: 400,
            js_url: "/static/altcha/altcha.min.js".to_string(),
            css_url: "/static/gate/gate.css".to_string(),
            site_icon_url: String::new(),
        }
    }
}

impl GateSettings {
    /// Read `GATE_*` environment variables over the defaults
    pub fn from_env() -> GateResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source
    ///
    /// Lists are comma separated; `EXEMPT_HEADERS` and `SALT_PARAMS`
    /// are JSON objects.
    pub fn from_lookup<F>(lookup: F) -> GateResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut settings = Self::default();

        if let Some(key) = var("HMAC_KEY") {
            settings.hmac_key = Some(key);
        }
        if let Some(v) = var("MAX_NUMBER") {
            settings.max_number = parse_number("MAX_NUMBER", &v)?;
        }
        if let Some(v) = var("CHALLENGE_EXPIRE_MINUTES") {
            settings.challenge_expire_minutes = parse_number("CHALLENGE_EXPIRE_MINUTES", &v)?;
        }
        if let Some(v) = var("AUTH_EXPIRE_MINUTES") {
            settings.auth_expire_minutes = parse_number("AUTH_EXPIRE_MINUTES", &v)?;
        }
        if let Some(v) = var("FAILURE_STATUS") {
            settings.failure_status = parse_number("FAILURE_STATUS", &v)?;
        }
        if let Some(v) = var("COOKIE_SECURE") {
            settings.cookie_secure = !matches!(v.trim(), "0" | "false" | "no" | "off");
        }
        if let Some(v) = var("EXEMPT_PATHS") {
            settings.exempt_paths = split_list(&v);
        }
        if let Some(v) = var("EXEMPT_IPS") {
            settings.exempt_ips = split_list(&v);
        }
        if let Some(v) = var("EXEMPT_HEADERS") {
            settings.exempt_headers = parse_map("EXEMPT_HEADERS", &v)?;
        }
        if let Some(v) = var("SALT_PARAMS") {
            settings.salt_params = parse_map("SALT_PARAMS", &v)?;
        }

        let strings = [
            ("SESSION_KEY", &mut settings.session_key),
            ("REFERER_PREFIX", &mut settings.referer_prefix),
            ("SESSION_COOKIE_NAME", &mut settings.session_cookie_name),
            ("CHALLENGE_PATH", &mut settings.challenge_path),
            ("SUBMIT_PATH", &mut settings.submit_path),
            ("MESSAGE", &mut settings.message),
            ("HELP_MESSAGE", &mut settings.help_message),
            ("FAIL_MESSAGE", &mut settings.fail_message),
            ("JS_URL", &mut settings.js_url),
            ("CSS_URL", &mut settings.css_url),
            ("SITE_ICON_URL", &mut settings.site_icon_url),
        ];
        for (name, slot) in strings {
            if let Some(v) = var(name) {
                *slot = v;
            }
        }

        Ok(settings)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> GateResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| GateError::Configuration(format!("{ENV_PREFIX}{name} must be a number")))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

fn parse_map(name: &str, value: &str) -> GateResult<BTreeMap<String, String>> {
    serde_json::from_str(value).map_err(|e| {
        GateError::Configuration(format!(
            "{ENV_PREFIX}{name} must be a JSON object of strings: {e}"
        ))
    })
}

/// User-facing text on the challenge page
#[derive(Debug, Clone)]
pub struct GateMessages {
    pub message: String,
    pub help_message: String,
    pub fail_message: String,
}

/// Asset URLs for the challenge UI
#[derive(Debug, Clone)]
pub struct ChallengeAssets {
    pub js_url: String,
    pub css_url: String,
    pub site_icon_url: String,
}

/// Compiled gate configuration
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub hmac_key: String,
    pub max_number: u64,
    /// Challenge validity; also the replay-record TTL
    pub challenge_ttl: Duration,
    /// Length of the pass granted by a successful solve
    pub auth_ttl: Duration,
    pub session_key: String,
    pub referer_prefix: String,
    pub cookie: SessionCookie,
    pub challenge_path: String,
    pub submit_path: String,
    pub salt_params: BTreeMap<String, String>,
    pub messages: GateMessages,
    pub assets: ChallengeAssets,
    /// Status used for every rejected submission
    pub failure_kind: ErrorKind,
    pub exemptions: ExemptionConfig,
    /// Exempt-IP entries skipped at build time
    pub rejected_ips: Vec<InvalidIpLiteral>,
    cookie_key: [u8; 32],
}

impl GateConfig {
    /// Validate and compile settings; called once at startup
    pub fn from_settings(settings: GateSettings) -> GateResult<Self> {
        let hmac_key = settings
            .hmac_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GateError::Configuration("HMAC key must be set".to_string()))?;

        if settings.max_number == 0 {
            return Err(GateError::Configuration(
                "max number must be positive".to_string(),
            ));
        }
        if settings.challenge_expire_minutes == 0 || settings.auth_expire_minutes == 0 {
            return Err(GateError::Configuration(
                "challenge and authorization lifetimes must be positive".to_string(),
            ));
        }
        for path in [&settings.challenge_path, &settings.submit_path] {
            if !path.starts_with('/') {
                return Err(GateError::Configuration(format!(
                    "gate path {path:?} must start with '/'"
                )));
            }
        }
        if settings.session_cookie_name.trim().is_empty() || settings.session_key.is_empty() {
            return Err(GateError::Configuration(
                "session cookie name and session key must be set".to_string(),
            ));
        }
        let challenge_ttl = lifetime("challenge", settings.challenge_expire_minutes)?;
        let auth_ttl = lifetime("authorization", settings.auth_expire_minutes)?;
        let failure_kind = ErrorKind::from_status_code(settings.failure_status)
            .filter(|kind| {
                matches!(kind, ErrorKind::BadRequest | ErrorKind::TooManyRequests)
            })
            .ok_or_else(|| {
                GateError::Configuration(format!(
                    "failure status {} must be 400 or 429",
                    settings.failure_status
                ))
            })?;

        let (networks, rejected_ips) = NetworkMatcher::build(&settings.exempt_ips);
        let headers = HeaderMatcher::build(&settings.exempt_headers)?;

        let mut paths: std::collections::HashSet<String> =
            settings.exempt_paths.into_iter().collect();
        paths.insert(settings.challenge_path.clone());
        paths.insert(settings.submit_path.clone());

        let cookie_key = platform::crypto::hmac_sha256(hmac_key.as_bytes(), b"gate-session-cookie");

        tracing::info!(
            exempt_paths = paths.len(),
            exempt_networks = networks.ranges().len(),
            exempt_headers = headers.rules().len(),
            skipped_ips = rejected_ips.len(),
            "Gate configuration loaded"
        );

        Ok(Self {
            hmac_key,
            max_number: settings.max_number,
            challenge_ttl,
            auth_ttl,
            session_key: settings.session_key,
            referer_prefix: settings.referer_prefix,
            cookie: SessionCookie {
                name: settings.session_cookie_name,
                secure: settings.cookie_secure,
                same_site: SameSite::Lax,
                path: "/".to_string(),
                max_age: None,
            },
            challenge_path: settings.challenge_path,
            submit_path: settings.submit_path,
            salt_params: settings.salt_params,
            messages: GateMessages {
                message: settings.message,
                help_message: settings.help_message,
                fail_message: settings.fail_message,
            },
            assets: ChallengeAssets {
                js_url: settings.js_url,
                css_url: settings.css_url,
                site_icon_url: settings.site_icon_url,
            },
            failure_kind,
            exemptions: ExemptionConfig {
                paths,
                networks,
                headers,
            },
            rejected_ips,
            cookie_key,
        })
    }

    /// Key for signing session cookies, derived from the HMAC key
    pub fn cookie_key(&self) -> &[u8] {
        &self.cookie_key
    }

    pub fn challenge_ttl_secs(&self) -> i64 {
        i64::try_from(self.challenge_ttl.as_secs()).unwrap_or(i64::MAX)
    }

    pub fn auth_ttl_secs(&self) -> i64 {
        i64::try_from(self.auth_ttl.as_secs()).unwrap_or(i64::MAX)
    }

    /// Session key of the referrer stashed for `destination`
    pub fn referer_key(&self, destination: &str) -> String {
        format!("{}{}", self.referer_prefix, destination)
    }
}

/// Lifetime in minutes as a duration that chrono can add to a timestamp
fn lifetime(name: &str, minutes: u64) -> GateResult<Duration> {
    minutes
        .checked_mul(60)
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| delta.to_std().ok())
        .ok_or_else(|| {
            GateError::Configuration(format!("{name} lifetime of {minutes} minutes is out of range"))
        })
}
