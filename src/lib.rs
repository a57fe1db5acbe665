pub mod backend;
pub mod config;
pub mod client;
pub mod error;
pub mod identity;
pub mod sdk;

pub use crate::client::IdentityCore;
pub use crate::error::{IdentityError, IdentityResult};
