//! Client credentials and access-token models.

pub mod credentials;
pub mod token;

pub use credentials::*;
pub use token::*;
