//! Dashboard user accounts.

mod domain;
mod router;
mod service;
mod store;

pub use domain::{UserRecord, UserRegistration, UserStatistics, UserUpdate, UserView};
pub use router::user_router;
pub use service::UserService;
