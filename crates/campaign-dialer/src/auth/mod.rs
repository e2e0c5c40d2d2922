//! Registration, login and bearer-token authentication.

mod extract;
pub mod password;
mod router;
mod service;
pub mod token;

pub use extract::AuthenticatedUser;
pub use router::auth_router;
pub use service::{AuthService, LoginRequest, TokenResponse};
pub use token::{Claims, TokenError, TokenSigner};
