use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, ClientBuilder, StatusCode};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use super::error::StreamError;
use super::options::RequestOptions;
use crate::parser::models::FormatVariant;

/// 下载数据流
pub type ByteStream = BoxStream<'static, Result<Bytes, StreamError>>;

/// 已打开的源数据流
pub struct SourceStream {
    /// 响应声明的长度，可能未知
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

/// 拉流层参数
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub request: RequestOptions,
    /// 预读的数据块数量
    pub read_ahead: usize,
}

/// 打开某个格式对应的字节流
#[async_trait]
pub trait StreamFetcher: Send + Sync {
    async fn open(
        &self,
        format: &FormatVariant,
        options: &FetchOptions,
    ) -> Result<SourceStream, StreamError>;
}

/// 基于 reqwest 的拉流实现
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, StreamError> {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .default_headers(Self::get_default_headers())
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36"));
        headers
    }

    fn build_headers(request: &RequestOptions) -> Result<HeaderMap, StreamError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| StreamError::InvalidRequest(format!("请求头 {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                StreamError::InvalidRequest(format!("请求头 {}: {}", name.as_str(), e))
            })?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    // 检查响应状态并处理特殊情况
    fn check_response_status(status: StatusCode, url: &str) -> Result<(), StreamError> {
        debug!("Response Status: {}", status);

        match status {
            StatusCode::FORBIDDEN => {
                warn!("🚫 检测到 403 Forbidden 状态码，可能触发了风控机制");
                Err(StreamError::RateLimited(format!(
                    "访问被拒绝 (403 Forbidden)，URL: {}",
                    url
                )))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("⚠️ 检测到 429 Too Many Requests 状态码，请求过于频繁");
                Err(StreamError::RateLimited(format!(
                    "请求过于频繁 (429 Too Many Requests)，URL: {}",
                    url
                )))
            }
            StatusCode::UNAUTHORIZED => {
                warn!("🔐 检测到 401 Unauthorized 状态码，认证失败");
                Err(StreamError::RateLimited(format!(
                    "认证失败 (401 Unauthorized)，URL: {}",
                    url
                )))
            }
            status if status.is_success() => Ok(()),
            _ => {
                warn!("❌ 非成功状态码: {}", status);
                Err(StreamError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl StreamFetcher for HttpFetcher {
    async fn open(
        &self,
        format: &FormatVariant,
        options: &FetchOptions,
    ) -> Result<SourceStream, StreamError> {
        let mut request = self
            .client
            .get(&format.url)
            .headers(Self::build_headers(&options.request)?);
        if let Some(timeout) = options.request.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            error!("请求失败: {}", e);
            StreamError::Http(e)
        })?;
        Self::check_response_status(response.status(), &format.url)?;

        let content_length = response.content_length().or(format.content_length);
        debug!(
            "开始拉取格式 {}，长度: {:?}，预读 {} 块",
            format.format_id, content_length, options.read_ahead
        );

        Ok(SourceStream {
            content_length,
            body: read_ahead(response.bytes_stream(), options.read_ahead),
        })
    }
}

/// 在后台任务中预读数据块，通道容量就是预读深度
fn read_ahead<S, E>(source: S, depth: usize) -> ByteStream
where
    S: futures::Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<StreamError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(depth.max(1));

    tokio::spawn(async move {
        let mut source = Box::pin(source);
        while let Some(item) = source.next().await {
            let failed = item.is_err();
            if tx.send(item.map_err(Into::into)).await.is_err() {
                // 消费端已经关闭
                debug!("预读通道已关闭，停止拉取");
                break;
            }
            if failed {
                break;
            }
        }
    });

    stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) }).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[test]
    fn builds_pass_through_headers() {
        let request = RequestOptions {
            headers: vec![("Referer".to_string(), "https://example.com/".to_string())],
            timeout: None,
        };
        let headers = HttpFetcher::build_headers(&request).unwrap();
        assert_eq!(headers["referer"], "https://example.com/");
    }

    #[test]
    fn rejects_invalid_header_names() {
        let request = RequestOptions {
            headers: vec![("bad header".to_string(), "x".to_string())],
            timeout: None,
        };
        assert!(matches!(
            HttpFetcher::build_headers(&request),
            Err(StreamError::InvalidRequest(_))
        ));
    }

    #[test]
    fn maps_rejected_statuses() {
        let url = "https://media.example/140";
        for status in [
            StatusCode::FORBIDDEN,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::UNAUTHORIZED,
        ] {
            assert!(matches!(
                HttpFetcher::check_response_status(status, url),
                Err(StreamError::RateLimited(_))
            ));
        }
        assert!(matches!(
            HttpFetcher::check_response_status(StatusCode::NOT_FOUND, url),
            Err(StreamError::Status { status: 404, .. })
        ));
        assert!(HttpFetcher::check_response_status(StatusCode::OK, url).is_ok());
        assert!(HttpFetcher::check_response_status(StatusCode::PARTIAL_CONTENT, url).is_ok());
    }

    #[tokio::test]
    async fn read_ahead_stops_after_first_error() {
        let source = stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Ok(Bytes::from_static(b"cd")),
            Err(StreamError::Interrupted("reset".to_string())),
            Ok(Bytes::from_static(b"ef")),
        ]);
        let mut body = read_ahead(source, 2);

        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from_static(b"ab"));
        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from_static(b"cd"));
        assert!(matches!(
            body.next().await,
            Some(Err(StreamError::Interrupted(_)))
        ));
        assert!(body.next().await.is_none());
    }

    /// 源数据流被丢弃时置位
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn read_ahead_is_bounded_and_stops_without_reader() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicBool::new(false));

        let counter = Arc::clone(&pulled);
        let flag = DropFlag(Arc::clone(&dropped));
        let source = stream::repeat(()).map(move |_| {
            let _keep = &flag;
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, StreamError>(Bytes::from_static(b"x"))
        });

        let mut body = read_ahead(source, 2);
        assert!(body.next().await.unwrap().is_ok());
        tokio::time::sleep(Duration::from_millis(50)).await;

        // 已读 1 块，通道中最多 2 块，发送任务手上最多再有 1 块
        assert!(pulled.load(Ordering::SeqCst) <= 4);
        assert!(!dropped.load(Ordering::SeqCst));

        drop(body);
        for _ in 0..50 {
            if dropped.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(dropped.load(Ordering::SeqCst));
    }
}
