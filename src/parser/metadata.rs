use tracing::debug;

use super::models::TrackMetadata;

pub const UNKNOWN_ARTIST: &str = "Unknown";

// 标题中需要去掉的字符，集合互不相交，替换顺序无关
const STRIPPED_CHARS: &[char] = &['\'', '‘', '’', '|', '/', '?', ':', ';'];

/// 去掉标题中不适合出现在文件名里的字符
pub fn clean_title(raw: &str) -> String {
    raw.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect()
}

/// 从原始标题中拆出 歌手 - 歌名
///
/// 只在第一个连字符处拆分，两边去空白后任一边为空就退回到
/// "Unknown" + 完整标题。歧义输入一律这样降级处理，不再细分。
pub fn extract_metadata(raw_title: &str) -> TrackMetadata {
    let cleaned = clean_title(raw_title);

    let (artist, title) = match cleaned.split_once('-') {
        Some((artist, title)) if !artist.trim().is_empty() && !title.trim().is_empty() => {
            (artist.trim().to_string(), title.trim().to_string())
        }
        _ => (UNKNOWN_ARTIST.to_string(), cleaned.clone()),
    };

    debug!("标题解析: '{}' -> 歌手: '{}', 歌名: '{}'", raw_title, artist, title);

    TrackMetadata {
        cleaned,
        artist,
        title,
    }
}
