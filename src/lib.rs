//! 音频下载转码：解析媒体ID，拉取音频流并统计进度，转码为带 ID3 标签的 MP3。

pub mod common;
pub mod downloader;
pub mod parser;
pub mod post_process;

pub use downloader::error::{DownloadError, StreamError};
pub use downloader::events::{DownloadHandle, PipelineEvent};
pub use downloader::models::{DownloadResult, ProgressSample, ResultStats};
pub use downloader::options::{OptionOverrides, PipelineOptions, RequestOptions};
pub use downloader::{Backends, Pipeline};
