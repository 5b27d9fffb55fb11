use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::common::{DEFAULT_AUDIO_BITRATE, parse_source_url, source_url};
use crate::parser::errors::ResolveError;
use crate::parser::metadata::extract_metadata;
use crate::parser::resolver::{SourceResolver, YtDlpResolver};
use crate::parser::sanitize::output_file_name;
use crate::parser::stream_selector::StreamSelector;
use crate::post_process::{EncodeJob, Encoder, FfmpegEncoder};

use self::core::{HttpFetcher, StreamFetcher};
use error::{DownloadError, StreamError};
use events::{DownloadHandle, EventSender};
use models::{DownloadResult, ProgressSample, ResultStats};
use options::PipelineOptions;
use progress::ProgressTap;

pub mod core;
pub mod error;
pub mod events;
pub mod models;
pub mod options;
pub mod progress;

/// 下载流程依赖的外部组件
#[derive(Clone)]
pub struct Backends {
    pub resolver: Arc<dyn SourceResolver>,
    pub fetcher: Arc<dyn StreamFetcher>,
    pub encoder: Arc<dyn Encoder>,
}

impl Backends {
    /// yt-dlp 解析 + HTTP 拉流 + 系统 FFmpeg 转码
    pub fn system() -> Result<Self, StreamError> {
        Ok(Self {
            resolver: Arc::new(YtDlpResolver::from_env()),
            fetcher: Arc::new(HttpFetcher::new()?),
            encoder: Arc::new(FfmpegEncoder::from_env()),
        })
    }
}

/// 运行阶段，只用于日志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Idle,
    Resolving,
    Streaming,
    Encoding,
    Completed,
    Failed,
}

/// 单个媒体ID的一次 解析→拉流→转码 运行，运行后即被消费，不可复用
pub struct Pipeline {
    media_id: String,
    options: Arc<PipelineOptions>,
    backends: Backends,
    state: PipelineState,
    run_id: Uuid,
}

impl Pipeline {
    pub fn new(
        media_id: impl Into<String>,
        options: Arc<PipelineOptions>,
        backends: Backends,
    ) -> Self {
        Self {
            media_id: media_id.into(),
            options,
            backends,
            state: PipelineState::Idle,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn media_id(&self) -> &str {
        &self.media_id
    }

    /// 在后台任务中运行，通过句柄获取事件
    pub fn spawn(self) -> DownloadHandle {
        let media_id = self.media_id.clone();
        let (events, rx) = EventSender::channel(media_id.clone());
        let task = tokio::spawn(self.run(events));
        DownloadHandle::new(media_id, rx, task)
    }

    /// 运行到结束，最后发出恰好一个终止事件
    pub async fn run(mut self, events: EventSender) {
        let span = info_span!("download", media_id = %self.media_id, run = %self.run_id);
        let outcome = self.execute(&events).instrument(span).await;
        match &outcome {
            Ok(_) => self.transition(PipelineState::Completed),
            Err(e) => {
                warn!("❌ 下载失败: {}, 错误: {}", self.media_id, e);
                self.transition(PipelineState::Failed);
            }
        }
        events.finish(outcome);
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("[{}] 状态变化: {:?} -> {:?}", self.media_id, self.state, next);
        self.state = next;
    }

    async fn execute(&mut self, events: &EventSender) -> Result<DownloadResult, DownloadError> {
        // 解析
        self.transition(PipelineState::Resolving);
        if self.media_id.trim().is_empty() {
            return Err(ResolveError::InvalidMediaId("媒体ID为空".to_string()).into());
        }
        // 只做校验，上报的地址保持原样拼接
        parse_source_url(&self.media_id)
            .map_err(|e| ResolveError::InvalidMediaId(format!("{}: {}", self.media_id, e)))?;
        let source_url = source_url(&self.media_id);
        info!("开始解析: {}", source_url);

        let descriptor = self
            .backends
            .resolver
            .resolve(&source_url)
            .await?
            .ok_or_else(|| DownloadError::DescriptorMissing(self.media_id.clone()))?;
        info!("标题: << {} >>", descriptor.title);

        // 选流、打开数据流
        self.transition(PipelineState::Streaming);
        let metadata = extract_metadata(&descriptor.title);
        let file_name = self
            .options
            .file_name
            .clone()
            .unwrap_or_else(|| output_file_name(&metadata.cleaned, &descriptor.id));
        let output_path = self.options.output_dir.join(file_name);

        let criteria = self.options.criteria();
        let format = StreamSelector::select(&descriptor, &criteria).ok_or_else(|| {
            DownloadError::NoMatchingFormat {
                quality: criteria.quality.to_string(),
                allow_webm: criteria.allow_webm,
            }
        })?;

        // 目录已存在不算错误，并发运行时也一样
        tokio::fs::create_dir_all(&self.options.output_dir).await?;

        let source = self
            .backends
            .fetcher
            .open(format, &self.options.fetch_options())
            .await?;

        // 转码
        self.transition(PipelineState::Encoding);
        let audio_bitrate = descriptor
            .first_audio_bitrate()
            .unwrap_or(DEFAULT_AUDIO_BITRATE);
        let job = EncodeJob::mp3(
            output_path.clone(),
            audio_bitrate,
            &metadata,
            &self.options.output_options,
        );
        debug!(
            "编码器: {}, 码率: {}k, 输出: {:?}",
            self.backends.encoder.name(),
            audio_bitrate,
            output_path
        );

        let (sample_tx, mut sample_rx) = mpsc::unbounded_channel();
        let tapped = ProgressTap::new(
            source.body,
            source.content_length,
            self.options.progress_interval,
            sample_tx,
        );

        let encoder = Arc::clone(&self.backends.encoder);
        let encoding = encoder.encode(Box::pin(tapped), job);
        tokio::pin!(encoding);

        let mut stats = None;
        let outcome = loop {
            tokio::select! {
                biased;
                Some(sample) = sample_rx.recv() => record_sample(sample, &mut stats, events),
                outcome = &mut encoding => break outcome,
            }
        };
        // 编码结束时数据流已被丢弃，剩余采样全部在通道里
        while let Ok(sample) = sample_rx.try_recv() {
            record_sample(sample, &mut stats, events);
        }
        outcome?;

        if stats.is_none() {
            warn!(
                "⚠️ {} 传输结束但进度未达到 100%，统计数据缺失",
                self.media_id
            );
        }

        info!("✅ 下载完成: {:?}", output_path);
        Ok(DownloadResult {
            media_id: self.media_id.clone(),
            stats,
            file: output_path,
            source_url,
            raw_title: descriptor.title.clone(),
            artist: metadata.artist,
            title: metadata.title,
            thumbnail: descriptor.thumbnail.clone(),
        })
    }
}

fn record_sample(sample: ProgressSample, stats: &mut Option<ResultStats>, events: &EventSender) {
    if let Some(captured) = ResultStats::from_sample(&sample) {
        *stats = Some(captured);
    }
    events.progress(sample);
}
