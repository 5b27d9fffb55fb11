use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt, ready};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::error::StreamError;
use super::models::ProgressSample;

/// 进度测量：原样转发数据块，同时按时间间隔采样
///
/// 采样通过无界通道旁路发出，发送不会阻塞数据转发。
/// 数据流结束时无条件再发一次采样，已知总长度时百分比为 100。
/// 中途采样如果已经达到 100% 会推迟到结束采样，保证只有一个 100% 采样。
pub struct ProgressTap<S> {
    inner: S,
    length: Option<u64>,
    interval: Duration,
    started: Instant,
    last_emit: Instant,
    transferred: u64,
    last_transferred: u64,
    samples: UnboundedSender<ProgressSample>,
    finished: bool,
}

impl<S> ProgressTap<S> {
    pub fn new(
        inner: S,
        length: Option<u64>,
        interval: Duration,
        samples: UnboundedSender<ProgressSample>,
    ) -> Self {
        let now = Instant::now();
        Self {
            inner,
            length,
            interval,
            started: now,
            last_emit: now,
            transferred: 0,
            last_transferred: 0,
            samples,
            finished: false,
        }
    }

    fn sample(&mut self, now: Instant, completed: bool) {
        let percentage = match self.length {
            Some(_) if completed => Some(100.0),
            Some(0) => Some(100.0),
            Some(length) => Some(self.transferred as f64 * 100.0 / length as f64),
            None => None,
        };

        if !completed && percentage.is_some_and(|p| p >= 100.0) {
            return;
        }

        if completed {
            if let Some(length) = self.length.filter(|l| *l != self.transferred) {
                warn!(
                    "数据流结束时字节数与声明长度不一致: {}/{}",
                    self.transferred, length
                );
            }
        }

        let runtime = now.duration_since(self.started);
        let since_last = now.duration_since(self.last_emit).as_secs_f64();
        let delta = self.transferred - self.last_transferred;
        let average = if runtime.as_secs_f64() > 0.0 {
            self.transferred as f64 / runtime.as_secs_f64()
        } else {
            0.0
        };
        let speed = if since_last > 0.0 {
            delta as f64 / since_last
        } else {
            average
        };

        let remaining = self
            .length
            .map(|length| length.saturating_sub(self.transferred));
        let eta = match remaining {
            Some(0) => Some(Duration::ZERO),
            // 声明长度极大时可能超出 Duration 的范围
            Some(left) if average > 0.0 => Duration::try_from_secs_f64(left as f64 / average).ok(),
            _ => None,
        };

        self.last_emit = now;
        self.last_transferred = self.transferred;

        // 接收方已经不在时直接丢弃采样
        let _ = self.samples.send(ProgressSample {
            percentage,
            transferred: self.transferred,
            length: self.length,
            remaining,
            eta,
            runtime,
            delta,
            speed,
        });
    }
}

impl<S> Stream for ProgressTap<S>
where
    S: Stream<Item = Result<Bytes, StreamError>> + Unpin,
{
    type Item = Result<Bytes, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        match ready!(this.inner.poll_next_unpin(cx)) {
            Some(Ok(chunk)) => {
                this.transferred += chunk.len() as u64;
                let now = Instant::now();
                if now.duration_since(this.last_emit) >= this.interval {
                    this.sample(now, false);
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(e)) => {
                debug!("数据流在 {} 字节处出错: {}", this.transferred, e);
                this.finished = true;
                Poll::Ready(Some(Err(e)))
            }
            None => {
                this.finished = true;
                this.sample(Instant::now(), true);
                Poll::Ready(None)
            }
        }
    }
}
