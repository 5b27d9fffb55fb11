use url::Url;

pub mod logger;
pub mod utils;

/// 媒体地址前缀，后面直接拼接媒体ID
pub const BASE_URL: &str = "https://www.youtube.com/watch?v=";

/// 输出文件扩展名
pub const AUDIO_EXTENSION: &str = "mp3";

/// 没有任何格式给出码率时使用的默认码率 (kbps)
pub const DEFAULT_AUDIO_BITRATE: u32 = 192;

/// 拼接媒体地址
pub fn source_url(media_id: &str) -> String {
    format!("{}{}", BASE_URL, media_id)
}

/// 检查拼接出来的地址是否合法
pub fn parse_source_url(media_id: &str) -> Result<Url, url::ParseError> {
    Url::parse(&source_url(media_id))
}
