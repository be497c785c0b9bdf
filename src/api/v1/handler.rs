use super::cookie::CookiePolicy;
use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use warp::http::{HeaderValue, StatusCode, Uri};
use warp::{self, Reply, reject};

const TOKEN_TYPE: &str = "Bearer";
const SET_COOKIE: &str = "set-cookie";
const HOME_PATH: &str = "/";
const LOGIN_FAILED_PATH: &str = "/login?error";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Body of a successful login or refresh.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: AccessToken,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl From<AccessGrant> for TokenResponse {
    fn from(grant: AccessGrant) -> Self {
        TokenResponse {
            access_token: grant.access_token,
            token_type: TOKEN_TYPE,
            expires_in: grant.expires_in_secs,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: UserId,
    pub email: String,
    pub nickname: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<Identity> for MemberResponse {
    fn from(identity: Identity) -> Self {
        MemberResponse {
            id: identity.user.id,
            email: identity.user.email,
            nickname: identity.user.nickname,
            role: identity.role,
            created_at: identity.user.created_at,
        }
    }
}

async fn authenticate(
    body: LoginRequest,
    auth_service: &dyn AuthService,
) -> Result<LoginResult, ApiErrorCode> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiErrorCode::ValidationError);
    }

    let login_input = LoginInput {
        email: body.email,
        password: body.password,
    };
    auth_service
        .login(login_input)
        .await
        .map_err(ApiErrorCode::from)
}

/// Appends one `Set-Cookie` header per cookie.
fn with_cookies(
    reply: impl Reply,
    cookies: &[String],
) -> Result<warp::reply::Response, warp::Rejection> {
    let mut response = reply.into_response();
    for cookie in cookies {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| reject::custom(ApiErrorCode::internal(e)))?;
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
    cookies: CookiePolicy,
) -> Result<impl warp::Reply, warp::Rejection> {
    let login_result = authenticate(body, auth_service.as_ref())
        .await
        .map_err(reject::custom)?;

    let cookie = cookies.refresh(
        login_result.refresh_id.as_str(),
        login_result.refresh_ttl_secs,
    );
    let reply = warp::reply::json(&TokenResponse::from(login_result.grant));
    with_cookies(reply, &[cookie])
}

/// Login for HTML form clients: sets the access-token and refresh cookies and
/// redirects home. Bad input or credentials redirect back to the login page.
pub async fn form_login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
    cookies: CookiePolicy,
) -> Result<impl warp::Reply, warp::Rejection> {
    let login_result = match authenticate(body, auth_service.as_ref()).await {
        Ok(login_result) => login_result,
        Err(ApiErrorCode::ValidationError | ApiErrorCode::InvalidCredentials) => {
            let reply = warp::redirect::see_other(Uri::from_static(LOGIN_FAILED_PATH));
            return Ok(reply.into_response());
        }
        Err(code) => return Err(reject::custom(code)),
    };

    let access = cookies.access(
        login_result.grant.access_token.as_str(),
        login_result.grant.expires_in_secs,
    );
    let refresh = cookies.refresh(
        login_result.refresh_id.as_str(),
        login_result.refresh_ttl_secs,
    );
    with_cookies(
        warp::redirect::see_other(Uri::from_static(HOME_PATH)),
        &[access, refresh],
    )
}

pub async fn refresh(
    refresh_cookie: Option<String>,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let grant = auth_service
        .refresh(refresh_cookie.as_deref().unwrap_or_default())
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&TokenResponse::from(grant)))
}

pub async fn logout(
    credentials: RequestCredentials,
    refresh_cookie: Option<String>,
    auth_service: Arc<dyn AuthService>,
    cookies: CookiePolicy,
) -> Result<impl warp::Reply, warp::Rejection> {
    auth_service
        .logout(credentials.bearer(), refresh_cookie.as_deref())
        .await;

    let reply = warp::reply::with_status(warp::reply(), StatusCode::OK);
    with_cookies(reply, &[cookies.clear_refresh(), cookies.clear_access()])
}

pub async fn me(
    scope: RequestScope,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let identity = auth_service
        .current_identity(&scope)
        .ok_or_else(|| reject::custom(ApiErrorCode::Unauthorized))?;

    Ok(warp::reply::json(&MemberResponse::from(identity)))
}
