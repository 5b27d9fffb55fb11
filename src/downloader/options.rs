use std::path::PathBuf;
use std::time::Duration;

use crate::downloader::core::FetchOptions;
use crate::parser::models::Quality;
use crate::parser::stream_selector::StreamCriteria;

pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_READ_AHEAD: usize = 4;

/// 透传给拉流层的请求参数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    /// 整个请求（包括读取响应体）的超时
    pub timeout: Option<Duration>,
}

/// 一次下载运行的配置，运行期间只读
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub output_dir: PathBuf,
    /// 指定输出文件名，不指定时由标题生成
    pub file_name: Option<String>,
    pub quality: Quality,
    /// 预读的数据块数量，只交给拉流层使用
    pub read_ahead: usize,
    pub progress_interval: Duration,
    pub allow_webm: bool,
    /// 追加在元数据参数之后的编码器参数，ffmpeg 中后出现的参数覆盖前面的
    pub output_options: Vec<String>,
    pub request: RequestOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_name: None,
            quality: Quality::HighestAudio,
            read_ahead: DEFAULT_READ_AHEAD,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            allow_webm: false,
            output_options: Vec::new(),
            request: RequestOptions::default(),
        }
    }
}

impl PipelineOptions {
    pub fn criteria(&self) -> StreamCriteria {
        StreamCriteria {
            quality: self.quality.clone(),
            allow_webm: self.allow_webm,
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            request: self.request.clone(),
            read_ahead: self.read_ahead.max(1),
        }
    }
}

/// 调用方提供的部分配置，未设置的字段使用默认值
#[derive(Debug, Clone, Default)]
pub struct OptionOverrides {
    pub output_dir: Option<PathBuf>,
    pub file_name: Option<String>,
    pub quality: Option<Quality>,
    pub read_ahead: Option<usize>,
    pub progress_interval: Option<Duration>,
    pub allow_webm: Option<bool>,
    pub output_options: Option<Vec<String>>,
    pub request: Option<RequestOptions>,
}

impl OptionOverrides {
    /// 覆盖到默认配置上，得到最终配置
    pub fn resolve(self) -> PipelineOptions {
        let defaults = PipelineOptions::default();
        PipelineOptions {
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            file_name: self.file_name.or(defaults.file_name),
            quality: self.quality.unwrap_or(defaults.quality),
            read_ahead: self.read_ahead.unwrap_or(defaults.read_ahead),
            progress_interval: self.progress_interval.unwrap_or(defaults.progress_interval),
            allow_webm: self.allow_webm.unwrap_or(defaults.allow_webm),
            output_options: self.output_options.unwrap_or(defaults.output_options),
            request: self.request.unwrap_or(defaults.request),
        }
    }
}
