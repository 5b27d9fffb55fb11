pub mod error;
pub mod ffmpeg;

use async_trait::async_trait;
use std::path::PathBuf;

use crate::downloader::core::ByteStream;
use crate::parser::models::TrackMetadata;
use error::EncodeError;

pub use ffmpeg::FfmpegEncoder;

pub const MP3_CODEC: &str = "libmp3lame";
pub const MP3_FORMAT: &str = "mp3";
pub const ID3_VERSION: &str = "4";

/// 一次转码任务
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeJob {
    pub output_path: PathBuf,
    /// 音频码率 (kbps)
    pub audio_bitrate: u32,
    pub codec: String,
    pub format: String,
    /// 输出参数，按顺序传给编码器
    pub directives: Vec<String>,
}

impl EncodeJob {
    /// MP3 转码任务
    ///
    /// 必需的 ID3 标签参数在前，调用方的额外参数追加在后面。
    /// ffmpeg 对重复参数以后出现的为准，所以额外参数可以覆盖标签。
    pub fn mp3(
        output_path: PathBuf,
        audio_bitrate: u32,
        metadata: &TrackMetadata,
        extra: &[String],
    ) -> Self {
        let mut directives = vec![
            "-id3v2_version".to_string(),
            ID3_VERSION.to_string(),
            "-metadata".to_string(),
            format!("title={}", metadata.title),
            "-metadata".to_string(),
            format!("artist={}", metadata.artist),
        ];
        directives.extend(extra.iter().cloned());

        Self {
            output_path,
            audio_bitrate,
            codec: MP3_CODEC.to_string(),
            format: MP3_FORMAT.to_string(),
            directives,
        }
    }
}

/// 流式编码器：读入字节流，写出目标文件
#[async_trait]
pub trait Encoder: Send + Sync {
    fn name(&self) -> &str;

    /// 读完整个输入流并完成编码后返回
    ///
    /// 输入流出错时返回 `EncodeError::Input`，已写出的部分文件保留不动。
    async fn encode(&self, input: ByteStream, job: EncodeJob) -> Result<(), EncodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_directives_follow_metadata() {
        let metadata = TrackMetadata {
            cleaned: "Artist X - Cool Song".to_string(),
            artist: "Artist X".to_string(),
            title: "Cool Song".to_string(),
        };
        let extra = vec!["-metadata".to_string(), "title=Override".to_string()];
        let job = EncodeJob::mp3(PathBuf::from("out.mp3"), 128, &metadata, &extra);

        assert_eq!(job.codec, "libmp3lame");
        assert_eq!(job.format, "mp3");
        assert_eq!(
            job.directives,
            vec![
                "-id3v2_version",
                "4",
                "-metadata",
                "title=Cool Song",
                "-metadata",
                "artist=Artist X",
                "-metadata",
                "title=Override",
            ]
        );
    }
}
