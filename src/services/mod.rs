//! Business logic between the HTTP layer and the repository.
//!
//! Services never read request context on their own: the caller identity arrives
//! as an explicit [`AuthUser`](crate::auth::AuthUser) argument.

pub mod articles;
pub mod auth;

pub use articles::ArticleService;
pub use auth::AuthService;
