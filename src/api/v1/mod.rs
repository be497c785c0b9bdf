mod cookie;
mod error;
mod handler;
mod router;

pub use cookie::{ACCESS_COOKIE, CookiePolicy, REFRESH_COOKIE};
pub use error::{ApiError, ApiErrorCode, recover_error};
pub use handler::{MemberResponse, TokenResponse};
pub use router::routes;
