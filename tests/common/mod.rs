//! 测试用的模拟解析器、拉流器和编码器
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream;

use mp3dl::downloader::core::{ByteStream, FetchOptions, SourceStream, StreamFetcher};
use mp3dl::parser::errors::ResolveError;
use mp3dl::parser::models::{Container, FormatVariant, SourceDescriptor};
use mp3dl::parser::resolver::SourceResolver;
use mp3dl::post_process::error::EncodeError;
use mp3dl::post_process::{EncodeJob, Encoder};
use mp3dl::{Backends, OptionOverrides, PipelineEvent, PipelineOptions, StreamError};

// ---------------------------------------------------------------------------

pub enum ResolveOutcome {
    Found(SourceDescriptor),
    Missing,
    Fail(String),
}

pub struct MockResolver {
    outcome: ResolveOutcome,
    pub calls: Mutex<Vec<String>>,
}

impl MockResolver {
    pub fn new(outcome: ResolveOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SourceResolver for MockResolver {
    async fn resolve(&self, source_url: &str) -> Result<Option<SourceDescriptor>, ResolveError> {
        self.calls.lock().unwrap().push(source_url.to_string());
        match &self.outcome {
            ResolveOutcome::Found(descriptor) => Ok(Some(descriptor.clone())),
            ResolveOutcome::Missing => Ok(None),
            ResolveOutcome::Fail(reason) => Err(ResolveError::Failed {
                reason: reason.clone(),
                stderr: None,
            }),
        }
    }
}

// ---------------------------------------------------------------------------

/// 模拟数据流的一步
#[derive(Debug, Clone)]
pub enum Chunk {
    Data(usize),
    Fail(&'static str),
    /// 两个数据块之间的停顿
    Pause(Duration),
}

pub struct MockFetcher {
    script: Vec<Chunk>,
    content_length: Option<u64>,
    pub opened: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new(script: Vec<Chunk>, content_length: Option<u64>) -> Self {
        Self {
            script,
            content_length,
            opened: Mutex::new(Vec::new()),
        }
    }

    /// 声明长度与实际数据一致的数据流
    pub fn even(chunk_size: usize, chunks: usize) -> Self {
        Self::new(
            vec![Chunk::Data(chunk_size); chunks],
            Some((chunk_size * chunks) as u64),
        )
    }

    pub fn opened_formats(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamFetcher for MockFetcher {
    async fn open(
        &self,
        format: &FormatVariant,
        _options: &FetchOptions,
    ) -> Result<SourceStream, StreamError> {
        self.opened.lock().unwrap().push(format.format_id.clone());

        let body = stream::iter(self.script.clone())
            .then(|step| async move {
                match step {
                    Chunk::Data(n) => Some(Ok(Bytes::from(vec![0u8; n]))),
                    Chunk::Fail(reason) => Some(Err(StreamError::Interrupted(reason.to_string()))),
                    Chunk::Pause(d) => {
                        tokio::time::sleep(d).await;
                        None
                    }
                }
            })
            .filter_map(|item| async move { item })
            .boxed();

        Ok(SourceStream {
            content_length: self.content_length,
            body,
        })
    }
}

// ---------------------------------------------------------------------------

/// 读完整个输入流，把字节写到目标文件
pub struct MockEncoder {
    fail_with: Option<String>,
    pub jobs: Mutex<Vec<EncodeJob>>,
    pub received: Mutex<u64>,
}

impl MockEncoder {
    pub fn new() -> Self {
        Self {
            fail_with: None,
            jobs: Mutex::new(Vec::new()),
            received: Mutex::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            ..Self::new()
        }
    }

    pub fn last_job(&self) -> Option<EncodeJob> {
        self.jobs.lock().unwrap().last().cloned()
    }

    pub fn received_bytes(&self) -> u64 {
        *self.received.lock().unwrap()
    }
}

#[async_trait]
impl Encoder for MockEncoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn encode(&self, mut input: ByteStream, job: EncodeJob) -> Result<(), EncodeError> {
        self.jobs.lock().unwrap().push(job.clone());

        let mut data = Vec::new();
        while let Some(chunk) = input.next().await {
            match chunk {
                Ok(chunk) => data.extend_from_slice(&chunk),
                Err(e) => {
                    // 已经写出的部分保留
                    tokio::fs::write(&job.output_path, &data).await?;
                    return Err(EncodeError::Input(e));
                }
            }
        }
        *self.received.lock().unwrap() = data.len() as u64;
        tokio::fs::write(&job.output_path, &data).await?;

        match &self.fail_with {
            Some(reason) => Err(EncodeError::failed(reason.clone(), Some("mock stderr".into()))),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------

pub fn audio(format_id: &str, container: Container, kbps: Option<u32>) -> FormatVariant {
    FormatVariant {
        format_id: format_id.to_string(),
        container,
        audio_bitrate: kbps,
        has_audio: true,
        has_video: false,
        url: format!("https://media.example/{}", format_id),
        content_length: None,
    }
}

pub fn descriptor(id: &str, title: &str, formats: Vec<FormatVariant>) -> SourceDescriptor {
    SourceDescriptor {
        id: id.to_string(),
        title: title.to_string(),
        thumbnail: Some(format!("https://img.example/{}.jpg", id)),
        formats,
    }
}

pub struct Fixture {
    pub resolver: Arc<MockResolver>,
    pub fetcher: Arc<MockFetcher>,
    pub encoder: Arc<MockEncoder>,
    pub dir: tempfile::TempDir,
}

impl Fixture {
    pub fn new(resolver: MockResolver, fetcher: MockFetcher, encoder: MockEncoder) -> Self {
        Self {
            resolver: Arc::new(resolver),
            fetcher: Arc::new(fetcher),
            encoder: Arc::new(encoder),
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// 用给定描述和数据流搭一套默认组件
    pub fn with(descriptor: SourceDescriptor, fetcher: MockFetcher) -> Self {
        Self::new(
            MockResolver::new(ResolveOutcome::Found(descriptor)),
            fetcher,
            MockEncoder::new(),
        )
    }

    pub fn backends(&self) -> Backends {
        Backends {
            resolver: self.resolver.clone(),
            fetcher: self.fetcher.clone(),
            encoder: self.encoder.clone(),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// 每个数据块都采样，方便断言
    pub fn options(&self) -> Arc<PipelineOptions> {
        self.options_with(OptionOverrides::default())
    }

    pub fn options_with(&self, overrides: OptionOverrides) -> Arc<PipelineOptions> {
        let overrides = OptionOverrides {
            output_dir: overrides.output_dir.or_else(|| Some(self.output_dir())),
            progress_interval: overrides.progress_interval.or(Some(Duration::ZERO)),
            ..overrides
        };
        Arc::new(overrides.resolve())
    }
}

/// 收集一次运行的全部事件
pub async fn collect_events(mut handle: mp3dl::DownloadHandle) -> Vec<PipelineEvent> {
    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        events.push(event);
    }
    events
}
