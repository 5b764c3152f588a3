//! Cookie Management Infrastructure

use axum::http::{HeaderMap, HeaderValue, header};
use std::time::Duration;

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes of the cookie that carries the session token
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    /// `None` makes it a browser-session cookie
    pub max_age: Option<Duration>,
}

impl Default for SessionCookie {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age: None,
        }
    }
}

impl SessionCookie {
    /// Render the `Set-Cookie` value for `token`
    pub fn render(&self, token: &str) -> String {
        let mut cookie = format!("{}={}; HttpOnly", self.name, token);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=");
        cookie.push_str(self.same_site.as_str());
        cookie.push_str("; Path=");
        cookie.push_str(&self.path);
        if let Some(max_age) = self.max_age {
            cookie.push_str(&format!("; Max-Age={}", max_age.as_secs()));
        }
        cookie
    }

    /// `Set-Cookie` header value, or `None` if the token is not header-safe
    pub fn header_value(&self, token: &str) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.render(token)).ok()
    }

    /// Read this cookie from every `Cookie` header of a request
    pub fn read(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .find_map(|pair| {
                let (key, value) = pair.trim().split_once('=')?;
                (key == self.name).then(|| value.to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_session_cookie() {
        let cookie = SessionCookie {
            name: "gate_session".to_string(),
            secure: true,
            same_site: SameSite::Strict,
            path: "/".to_string(),
            max_age: Some(Duration::from_secs(3600)),
        };

        let rendered = cookie.render("abc");
        assert!(rendered.starts_with("gate_session=abc; HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=Strict"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=3600"));
    }

    #[test]
    fn test_insecure_cookie_omits_secure() {
        let cookie = SessionCookie {
            secure: false,
            ..SessionCookie::default()
        };
        assert!(!cookie.render("x").contains("Secure"));
        assert!(!cookie.render("x").contains("Max-Age"));
    }

    #[test]
    fn test_read_across_cookie_headers() {
        let cookie = SessionCookie {
            name: "gate_session".to_string(),
            ..SessionCookie::default()
        };
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("foo=bar"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("other=1; gate_session=tok=en"),
        );

        assert_eq!(cookie.read(&headers), Some("tok=en".to_string()));
        assert_eq!(cookie.read(&HeaderMap::new()), None);
    }
}
