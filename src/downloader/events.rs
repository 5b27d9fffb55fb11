use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

use super::error::DownloadError;
use super::models::{DownloadResult, ProgressSample};

/// 下载运行对外发出的事件
///
/// 每次运行先发出零到多个 `Progress`，最后恰好一个 `Finished` 或 `Failed`。
#[derive(Debug)]
pub enum PipelineEvent {
    Progress {
        media_id: String,
        progress: ProgressSample,
    },
    Finished(DownloadResult),
    Failed {
        media_id: String,
        error: DownloadError,
    },
}

impl PipelineEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// 事件发送端，发送不会阻塞，订阅方不在时事件直接丢弃
#[derive(Debug)]
pub struct EventSender {
    media_id: String,
    tx: UnboundedSender<PipelineEvent>,
}

impl EventSender {
    pub fn channel(media_id: impl Into<String>) -> (Self, UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                media_id: media_id.into(),
                tx,
            },
            rx,
        )
    }

    pub fn progress(&self, progress: ProgressSample) {
        self.send(PipelineEvent::Progress {
            media_id: self.media_id.clone(),
            progress,
        });
    }

    /// 终止事件，消费发送端保证只发一次
    pub fn finish(self, outcome: Result<DownloadResult, DownloadError>) {
        let event = match outcome {
            Ok(result) => PipelineEvent::Finished(result),
            Err(error) => PipelineEvent::Failed {
                media_id: self.media_id.clone(),
                error,
            },
        };
        self.send(event);
    }

    fn send(&self, event: PipelineEvent) {
        if self.tx.send(event).is_err() {
            debug!("事件订阅方已关闭: {}", self.media_id);
        }
    }
}

/// 一次下载运行的句柄
pub struct DownloadHandle {
    media_id: String,
    events: UnboundedReceiver<PipelineEvent>,
    task: JoinHandle<()>,
}

impl DownloadHandle {
    pub(crate) fn new(
        media_id: String,
        events: UnboundedReceiver<PipelineEvent>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            media_id,
            events,
            task,
        }
    }

    pub fn media_id(&self) -> &str {
        &self.media_id
    }

    /// 按发出顺序获取下一个事件，终止事件之后返回 None
    pub async fn next_event(&mut self) -> Option<PipelineEvent> {
        self.events.recv().await
    }

    /// 等待运行结束，忽略进度事件
    pub async fn wait(self) -> Result<DownloadResult, DownloadError> {
        self.wait_with_progress(|_| {}).await
    }

    /// 等待运行结束，每个进度事件都会回调一次
    pub async fn wait_with_progress<F>(
        mut self,
        mut on_progress: F,
    ) -> Result<DownloadResult, DownloadError>
    where
        F: FnMut(&ProgressSample),
    {
        while let Some(event) = self.events.recv().await {
            match event {
                PipelineEvent::Progress { progress, .. } => on_progress(&progress),
                PipelineEvent::Finished(result) => return Ok(result),
                PipelineEvent::Failed { error, .. } => return Err(error),
            }
        }

        // 通道关闭却没有终止事件，说明任务异常退出
        match self.task.await {
            Err(e) => Err(DownloadError::Aborted(e.to_string())),
            Ok(()) => Err(DownloadError::Aborted(format!(
                "{} 未发出终止事件",
                self.media_id
            ))),
        }
    }
}
