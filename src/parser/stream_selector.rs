use tracing::debug;

use super::models::{Container, FormatVariant, Quality, SourceDescriptor};

/// 选流条件
#[derive(Debug, Clone, Default)]
pub struct StreamCriteria {
    pub quality: Quality,
    /// 为 false 时只接受 MP4 容器，属于硬过滤，不做回退
    pub allow_webm: bool,
}

pub struct StreamSelector;

impl StreamSelector {
    /// 按条件选出要下载的格式，没有满足条件的格式时返回 None
    pub fn select<'a>(
        descriptor: &'a SourceDescriptor,
        criteria: &StreamCriteria,
    ) -> Option<&'a FormatVariant> {
        let candidates: Vec<&FormatVariant> = descriptor
            .formats
            .iter()
            .filter(|f| criteria.allow_webm || f.container == Container::Mp4)
            .collect();

        debug!(
            "可选格式: {}/{} (allow_webm={})",
            candidates.len(),
            descriptor.formats.len(),
            criteria.allow_webm
        );

        let selected = match &criteria.quality {
            Quality::FormatId(id) => candidates.into_iter().find(|f| &f.format_id == id),
            Quality::HighestAudio => candidates
                .into_iter()
                .filter(|f| f.has_audio)
                // 纯音频优先，其次比较码率
                .max_by_key(|f| (f.is_audio_only(), f.audio_bitrate.unwrap_or(0))),
            Quality::LowestAudio => candidates
                .into_iter()
                .filter(|f| f.has_audio)
                .min_by_key(|f| (!f.is_audio_only(), f.audio_bitrate.unwrap_or(u32::MAX))),
        };

        if let Some(format) = selected {
            debug!(
                "选中格式: {} ({}, {:?} kbps)",
                format.format_id, format.container, format.audio_bitrate
            );
        }
        selected
    }
}
