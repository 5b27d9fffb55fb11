use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error};

use super::errors::ResolveError;
use super::models::{Container, FormatVariant, SourceDescriptor};

/// 把媒体地址解析成源描述
///
/// `Ok(None)` 表示解析器正常返回但没有可用的描述，
/// 解析器本身出错时返回 `Err`。
#[async_trait]
pub trait SourceResolver: Send + Sync {
    async fn resolve(&self, source_url: &str) -> Result<Option<SourceDescriptor>, ResolveError>;
}

/// 基于 yt-dlp 命令行的解析器
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    program: String,
}

impl YtDlpResolver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// 读取 YTDLP_PATH 环境变量，默认使用 PATH 中的 yt-dlp
    pub fn from_env() -> Self {
        Self::new(std::env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string()))
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::from_env()
    }
}

#[async_trait]
impl SourceResolver for YtDlpResolver {
    async fn resolve(&self, source_url: &str) -> Result<Option<SourceDescriptor>, ResolveError> {
        debug!("调用 {} 解析: {}", self.program, source_url);

        let output = Command::new(&self.program)
            .arg("--dump-single-json")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg(source_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ResolveError::Unavailable(format!(
                    "未找到 {}，请安装或设置 YTDLP_PATH",
                    self.program
                )),
                _ => ResolveError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            error!("❌ {} 解析失败: {}", self.program, stderr.trim());
            return Err(ResolveError::Failed {
                reason: format!("{} 退出码: {}", self.program, output.status),
                stderr: Some(stderr),
            });
        }

        descriptor_from_json(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    id: Option<String>,
    title: Option<String>,
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: String,
    #[serde(default)]
    ext: String,
    url: Option<String>,
    abr: Option<f64>,
    acodec: Option<String>,
    vcodec: Option<String>,
    filesize: Option<u64>,
    filesize_approx: Option<u64>,
}

impl RawFormat {
    fn into_variant(self) -> Option<FormatVariant> {
        let url = self.url?;
        let has_codec = |codec: &Option<String>| codec.as_deref().is_some_and(|c| c != "none");
        Some(FormatVariant {
            container: Container::from_ext(&self.ext),
            audio_bitrate: self.abr.filter(|b| *b > 0.0).map(|b| b.round() as u32),
            has_audio: has_codec(&self.acodec),
            has_video: has_codec(&self.vcodec),
            content_length: self.filesize.or(self.filesize_approx),
            format_id: self.format_id,
            url,
        })
    }
}

/// 把 yt-dlp 的 JSON 输出转换成源描述
pub fn descriptor_from_json(bytes: &[u8]) -> Result<Option<SourceDescriptor>, ResolveError> {
    let raw: Option<RawInfo> = serde_json::from_slice(bytes)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let Some(id) = raw.id else {
        return Ok(None);
    };

    let formats: Vec<FormatVariant> = raw
        .formats
        .into_iter()
        .filter_map(RawFormat::into_variant)
        .collect();
    debug!("解析到 {} 个可用格式", formats.len());

    Ok(Some(SourceDescriptor {
        title: raw.title.unwrap_or_default(),
        thumbnail: raw.thumbnail,
        id,
        formats,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats_from_json() {
        let json = br#"{
            "id": "abc123",
            "title": "Artist X - Cool Song",
            "thumbnail": "https://img.example/abc123.jpg",
            "formats": [
                {"format_id": "sb0", "ext": "mhtml", "acodec": "none", "vcodec": "none"},
                {"format_id": "140", "ext": "m4a", "url": "https://media.example/140",
                 "abr": 129.5, "acodec": "mp4a.40.2", "vcodec": "none", "filesize": 1000000},
                {"format_id": "251", "ext": "webm", "url": "https://media.example/251",
                 "abr": 160.0, "acodec": "opus", "vcodec": "none"},
                {"format_id": "18", "ext": "mp4", "url": "https://media.example/18",
                 "acodec": "mp4a.40.2", "vcodec": "avc1.42001E", "filesize_approx": 5000}
            ]
        }"#;

        let descriptor = descriptor_from_json(json).unwrap().unwrap();
        assert_eq!(descriptor.id, "abc123");
        assert_eq!(descriptor.formats.len(), 3);

        let m4a = &descriptor.formats[0];
        assert_eq!(m4a.container, Container::Mp4);
        assert_eq!(m4a.audio_bitrate, Some(130));
        assert!(m4a.is_audio_only());
        assert_eq!(m4a.content_length, Some(1_000_000));

        assert_eq!(descriptor.formats[1].container, Container::Webm);
        assert!(descriptor.formats[2].has_video);
        assert_eq!(descriptor.formats[2].content_length, Some(5000));
    }

    #[test]
    fn null_or_missing_id_means_no_descriptor() {
        assert!(descriptor_from_json(b"null").unwrap().is_none());
        assert!(descriptor_from_json(br#"{"title": "x"}"#).unwrap().is_none());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            descriptor_from_json(b"<html>"),
            Err(ResolveError::InvalidResponse(_))
        ));
    }
}
