//! Token Service - HS256 会话令牌签发与校验
//!
//! 令牌绑定用户 ID（sub 声明），带签发时间与过期时间。
//! 校验失败（格式错误、签名伪造、已过期）一律返回 None，
//! 不向调用方区分失败原因

use chrono::{DateTime, Duration, Utc};
use jwt_compact::alg::{Hs256, Hs256Key};
use jwt_compact::{AlgorithmExt, Claims, CreationError, Header, TimeOptions, Token, UntrustedToken};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 会话令牌自定义声明
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// 用户 ID
    #[serde(rename = "sub")]
    subject: String,
}

/// 会话令牌服务
#[derive(Clone)]
pub struct TokenService {
    key: Hs256Key,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            key: Hs256Key::new(secret.as_bytes()),
            ttl,
        }
    }

    /// 为指定用户签发令牌，过期时间 = 签发时间 + TTL
    pub fn issue(&self, subject: Uuid) -> Result<String, CreationError> {
        let time_options = default_time_options();
        let claims = Claims::new(SessionClaims {
            subject: subject.to_string(),
        })
        .set_duration_and_issuance(&time_options, self.ttl);
        Hs256.token(&Header::empty(), &claims, &self.key)
    }

    /// 校验令牌，返回绑定的用户 ID；任何失败返回 None
    pub fn verify(&self, raw: &str) -> Option<Uuid> {
        self.verify_at(raw, &default_time_options())
    }

    /// 以指定时钟校验令牌（过期边界测试用）
    fn verify_at<F>(&self, raw: &str, time_options: &TimeOptions<F>) -> Option<Uuid>
    where
        F: Fn() -> DateTime<Utc>,
    {
        let untrusted = UntrustedToken::new(raw).ok()?;
        let token: Token<SessionClaims> = Hs256.validator(&self.key).validate(&untrusted).ok()?;
        token.claims().validate_expiration(time_options).ok()?;
        Uuid::parse_str(&token.claims().custom.subject).ok()
    }
}

/// 过期校验不留余量，时钟即系统时钟
fn default_time_options() -> TimeOptions {
    TimeOptions::new(Duration::zero(), Utc::now)
}
