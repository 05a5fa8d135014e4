mod auth;
mod bearer;
mod config;
mod credentials;
mod error;
mod protected;
mod routes;
mod token;
mod types;

pub use auth::*;
pub use config::*;
pub use credentials::*;
pub use error::*;
pub use protected::*;
pub use routes::*;
pub use token::*;
pub use types::*;
