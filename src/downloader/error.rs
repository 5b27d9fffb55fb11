use thiserror::Error;

use crate::parser::errors::ResolveError;
use crate::post_process::error::EncodeError;

/// 数据流错误，包括拉取失败和下载过程中断开
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("HTTP错误: {0}")]
    Http(#[from] reqwest::Error),
    #[error("无效的请求参数: {0}")]
    InvalidRequest(String),
    #[error("请求被拒绝: {0}")]
    RateLimited(String),
    #[error("HTTP 请求失败，状态码: {status}，URL: {url}")]
    Status { status: u16, url: String },
    #[error("数据流中断: {0}")]
    Interrupted(String),
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 一次下载运行的终止错误，只会上报一次
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("解析失败: {0}")]
    Resolution(#[from] ResolveError),
    #[error("未解析到可用的媒体信息: {0}")]
    DescriptorMissing(String),
    #[error("没有符合条件的格式 (quality={quality}, allow_webm={allow_webm})")]
    NoMatchingFormat { quality: String, allow_webm: bool },
    #[error("流错误: {0}")]
    Stream(#[from] StreamError),
    #[error("转码错误: {0}")]
    Encoding(EncodeError),
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("下载任务异常退出: {0}")]
    Aborted(String),
}

impl From<EncodeError> for DownloadError {
    fn from(error: EncodeError) -> Self {
        match error {
            // 编码器读输入时遇到的错误属于数据流错误
            EncodeError::Input(e) => DownloadError::Stream(e),
            other => DownloadError::Encoding(other),
        }
    }
}
