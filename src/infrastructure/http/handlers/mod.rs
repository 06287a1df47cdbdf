//! HTTP Handlers

mod auth;
mod projects;
mod root;
mod voices;

pub use auth::*;
pub use projects::*;
pub use root::*;
pub use voices::*;
