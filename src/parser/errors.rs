use thiserror::Error;

/// 解析器自身的错误，和“没有返回描述”区分开
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("无效的媒体ID: {0}")]
    InvalidMediaId(String),
    #[error("解析器不可用: {0}")]
    Unavailable(String),
    #[error("解析失败: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },
    #[error("响应解析失败: {0}")]
    InvalidResponse(String),
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ResolveError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}
