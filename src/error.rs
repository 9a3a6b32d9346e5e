use std::error::Error as StdError;
use std::fmt;

/// 机器人错误类型
#[derive(Debug, Clone)]
pub enum BotError {
    /// VK API 返回的业务错误（错误码 + 描述）
    Api { code: i64, msg: String },
    /// VK API 限流（错误码 6，允许一次重试）
    RateLimit(String),
    /// 令牌无效 / 权限不足（错误码 5，启动阶段致命）
    Auth(String),
    /// 网络 / 传输错误
    Network(String),
    /// Long Poll 会话错误（需要刷新 ts 或重新获取服务器）
    LongPoll(String),
    /// 数据库错误
    Database(String),
    /// 序列化错误
    Serialization(String),
    /// 配置错误
    Configuration(String),
    /// 入站 payload 格式错误
    InvalidPayload(String),
    /// 内部错误
    Internal(String),
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotError::Api { code, msg } => write!(f, "VK API error {}: {}", code, msg),
            BotError::RateLimit(msg) => write!(f, "Rate limit error: {}", msg),
            BotError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            BotError::Network(msg) => write!(f, "Network error: {}", msg),
            BotError::LongPoll(msg) => write!(f, "Long poll error: {}", msg),
            BotError::Database(msg) => write!(f, "Database error: {}", msg),
            BotError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            BotError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            BotError::InvalidPayload(msg) => write!(f, "Invalid payload: {}", msg),
            BotError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for BotError {}

impl BotError {
    /// 根据 VK 错误码归类错误
    ///
    /// 5 = 授权失败，6 = 请求过于频繁，其余按原始错误码透传
    pub fn from_api_code(code: i64, msg: String) -> Self {
        match code {
            5 => BotError::Auth(msg),
            6 => BotError::RateLimit(msg),
            _ => BotError::Api { code, msg },
        }
    }

    /// 是否为限流错误（触发单次重试）
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, BotError::RateLimit(_))
    }
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        BotError::Network(err.to_string())
    }
}

impl From<sqlx::Error> for BotError {
    fn from(err: sqlx::Error) -> Self {
        BotError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::Serialization(err.to_string())
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, BotError>;

/// 数据库错误类型别名
pub type DatabaseError = BotError;
