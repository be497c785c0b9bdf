use super::cookie::*;
use super::handler;
use crate::application_port::*;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;
use warp::http::HeaderMap;

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let cookies = CookiePolicy {
        secure: server.cookie_secure,
    };

    let login = warp::path("auth")
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and(warp::any().map(move || cookies))
        .and_then(handler::login);

    let form_login = warp::path("auth")
        .and(warp::path("login"))
        .and(warp::path("form"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::form())
        .and(with(server.auth_service.clone()))
        .and(warp::any().map(move || cookies))
        .and_then(handler::form_login);

    let refresh = warp::path("auth")
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_cookie(REFRESH_COOKIE))
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    let logout = warp::path("auth")
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_credentials())
        .and(with_cookie(REFRESH_COOKIE))
        .and(with(server.auth_service.clone()))
        .and(warp::any().map(move || cookies))
        .and_then(handler::logout);

    let me = warp::path("auth")
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_identity(server.identity_resolver.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::me);

    login.or(form_login).or(refresh).or(logout).or(me)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// Reads headers leniently: a value that is not visible ASCII counts as absent.
fn with_credentials() -> impl Filter<Extract = (RequestCredentials,), Error = Infallible> + Clone {
    warp::header::headers_cloned().map(|headers: HeaderMap| RequestCredentials {
        authorization: headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        access_cookie: cookie_value(&headers, ACCESS_COOKIE),
    })
}

fn with_cookie(
    name: &'static str,
) -> impl Filter<Extract = (Option<String>,), Error = Infallible> + Clone {
    warp::header::headers_cloned().map(move |headers: HeaderMap| cookie_value(&headers, name))
}

/// Resolves the caller into a [`RequestScope`]. Never rejects: bad credentials are anonymous.
fn with_identity(
    resolver: Arc<dyn IdentityResolver>,
) -> impl Filter<Extract = (RequestScope,), Error = Infallible> + Clone {
    with_credentials().then(move |credentials: RequestCredentials| {
        let resolver = resolver.clone();
        async move { resolver.resolve(&credentials).await }
    })
}
