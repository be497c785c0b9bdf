//! `Set-Cookie` values for the refresh id and the form-client access token, and
//! lenient reading of inbound cookies.

use warp::http::HeaderMap;

pub const REFRESH_COOKIE: &str = "refreshToken";
pub const ACCESS_COOKIE: &str = "access_token";

/// Attributes shared by every cookie the API sets.
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    pub secure: bool,
}

impl CookiePolicy {
    pub fn refresh(&self, refresh_id: &str, max_age_secs: i64) -> String {
        self.build(REFRESH_COOKIE, refresh_id, max_age_secs.max(0))
    }

    pub fn clear_refresh(&self) -> String {
        self.build(REFRESH_COOKIE, "", 0)
    }

    pub fn access(&self, access_token: &str, max_age_secs: i64) -> String {
        self.build(ACCESS_COOKIE, access_token, max_age_secs.max(0))
    }

    pub fn clear_access(&self) -> String {
        self.build(ACCESS_COOKIE, "", 0)
    }

    fn build(&self, name: &str, value: &str, max_age_secs: i64) -> String {
        let mut cookie =
            format!("{name}={value}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age_secs}");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Value of cookie `name` across every `Cookie` header. Headers that are not
/// visible ASCII are skipped, so a garbled cookie reads as absent.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use warp::http::HeaderValue;

    #[test]
    fn refresh_cookie_carries_ttl_and_flags() {
        let cookie = CookiePolicy { secure: false }.refresh("abc", 604_800);
        assert_eq!(
            cookie,
            "refreshToken=abc; HttpOnly; SameSite=Strict; Path=/; Max-Age=604800"
        );
    }

    #[test]
    fn secure_flag_follows_policy() {
        let cookie = CookiePolicy { secure: true }.clear_refresh();
        assert!(cookie.starts_with("refreshToken=; "));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn access_cookie_lives_as_long_as_the_token() {
        let policy = CookiePolicy { secure: false };
        assert_eq!(
            policy.access("jwt", 900),
            "access_token=jwt; HttpOnly; SameSite=Strict; Path=/; Max-Age=900"
        );
        assert!(policy.clear_access().starts_with("access_token=; "));
    }

    #[test]
    fn cookie_value_scans_every_header() {
        let mut headers = HeaderMap::new();
        headers.append("cookie", HeaderValue::from_static("theme=dark; refreshToken=abc"));
        headers.append("cookie", HeaderValue::from_static("access_token=jwt"));

        assert_eq!(cookie_value(&headers, REFRESH_COOKIE).as_deref(), Some("abc"));
        assert_eq!(cookie_value(&headers, ACCESS_COOKIE).as_deref(), Some("jwt"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn unreadable_cookie_header_is_absent() {
        let mut headers = HeaderMap::new();
        headers.append(
            "cookie",
            HeaderValue::from_bytes(b"refreshToken=\xff\xfe").unwrap(),
        );
        assert_eq!(cookie_value(&headers, REFRESH_COOKIE), None);
    }
}
