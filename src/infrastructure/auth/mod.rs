//! Auth Infrastructure - 凭证原语
//!
//! 密码哈希（Argon2）与会话令牌（HS256）

pub mod password;
mod token;

pub use token::TokenService;
