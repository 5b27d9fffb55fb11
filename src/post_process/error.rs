use std::path::PathBuf;
use thiserror::Error;

use crate::downloader::error::StreamError;

#[derive(Debug, Error)]
pub enum EncodeError {
    /// 编码器读取输入时数据流出错
    #[error("输入流错误: {0}")]
    Input(StreamError),
    #[error("未找到 FFmpeg: {path}")]
    FfmpegNotFound { path: PathBuf },
    #[error("转码失败: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl EncodeError {
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }
}
