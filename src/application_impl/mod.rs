mod auth_service_impl;
mod credential_hasher_argon2;
mod identity_resolver_impl;
mod token_codec_jwt;

pub use auth_service_impl::*;
pub use credential_hasher_argon2::*;
pub use identity_resolver_impl::*;
pub use token_codec_jwt::*;
