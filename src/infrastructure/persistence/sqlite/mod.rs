//! SQLite Persistence - SQLite 数据库持久化实现

mod database;
mod project_repo;
mod user_repo;
mod voice_repo;

pub use database::*;
pub use project_repo::*;
pub use user_repo::*;
pub use voice_repo::*;
