use lazy_static::lazy_static;
use regex::Regex;

use crate::common::AUDIO_EXTENSION;

const MAX_FILE_NAME_BYTES: usize = 255;

lazy_static! {
    // Windows 保留设备名，带不带扩展名都不能用
    static ref RESERVED_NAME: Regex =
        Regex::new(r"(?i)^(con|prn|aux|nul|com[0-9]|lpt[0-9])(\..*)?$").unwrap();
}

/// 把任意显示字符串转换成各平台都安全的文件名，结果可能为空
pub fn sanitize_file_name(name: &str) -> String {
    let stripped: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '?' | '<' | '>' | ':' | '*' | '|' | '"'))
        .filter(|c| !c.is_control())
        .collect();

    let trimmed = stripped.trim_end_matches(['.', ' ']);

    if trimmed == "." || trimmed == ".." || RESERVED_NAME.is_match(trimmed) {
        return String::new();
    }

    truncate_on_char_boundary(trimmed, MAX_FILE_NAME_BYTES).to_string()
}

/// 输出文件名：清理后为空时退回到媒体ID
pub fn output_file_name(display: &str, media_id: &str) -> String {
    let mut stem = sanitize_file_name(display);
    if stem.is_empty() {
        stem = media_id.to_string();
    }

    // 给扩展名留出位置
    let budget = MAX_FILE_NAME_BYTES - AUDIO_EXTENSION.len() - 1;
    let stem = truncate_on_char_boundary(&stem, budget);
    format!("{}.{}", stem, AUDIO_EXTENSION)
}

fn truncate_on_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
