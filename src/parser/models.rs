use serde::{Deserialize, Serialize};
use std::fmt;

/// 媒体源描述：由解析器返回，解析后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub formats: Vec<FormatVariant>,
}

impl SourceDescriptor {
    /// 第一个带有音频码率的格式所给出的码率 (kbps)
    pub fn first_audio_bitrate(&self) -> Option<u32> {
        self.formats.iter().find_map(|f| f.audio_bitrate)
    }
}

/// 可用的编码格式之一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatVariant {
    pub format_id: String,
    pub container: Container,
    /// 音频码率 (kbps)
    pub audio_bitrate: Option<u32>,
    pub has_audio: bool,
    pub has_video: bool,
    pub url: String,
    pub content_length: Option<u64>,
}

impl FormatVariant {
    pub fn is_audio_only(&self) -> bool {
        self.has_audio && !self.has_video
    }
}

// 容器类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Container {
    Mp4,
    Webm,
    Other(String),
}

impl Container {
    /// 根据文件扩展名推断容器，m4a 属于 MP4 容器
    pub fn from_ext(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" | "m4a" => Self::Mp4,
            "webm" | "weba" => Self::Webm,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mp4 => write!(f, "mp4"),
            Self::Webm => write!(f, "webm"),
            Self::Other(ext) => write!(f, "{}", ext),
        }
    }
}

// 音质选择
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    HighestAudio, // 码率最高的音频，优先纯音频
    LowestAudio,      // 码率最低的音频，优先纯音频
    FormatId(String), // 指定格式ID
}

impl std::str::FromStr for Quality {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "highestaudio" | "highest" | "best" => Self::HighestAudio,
            "lowestaudio" | "lowest" | "worst" => Self::LowestAudio,
            _ => Self::FormatId(s.trim().to_string()),
        })
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighestAudio => write!(f, "highestaudio"),
            Self::LowestAudio => write!(f, "lowestaudio"),
            Self::FormatId(id) => write!(f, "format {}", id),
        }
    }
}

/// 从标题派生出的元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub cleaned: String,
    pub artist: String,
    pub title: String,
}
