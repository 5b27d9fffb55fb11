use std::path::PathBuf;
use std::time::Duration;

/// 某一时刻的传输进度快照
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSample {
    /// 完成百分比 0-100，总长度未知时为 None（不确定）
    pub percentage: Option<f64>,
    pub transferred: u64,
    pub length: Option<u64>,
    pub remaining: Option<u64>,
    pub eta: Option<Duration>,
    /// 从开始传输到现在的时间
    pub runtime: Duration,
    /// 距离上一次采样新增的字节数
    pub delta: u64,
    /// 瞬时速度 字节/秒
    pub speed: f64,
}

impl ProgressSample {
    pub fn is_complete(&self) -> bool {
        self.percentage == Some(100.0)
    }
}

/// 下载统计，只从 100% 的那次采样中获取
#[derive(Debug, Clone, PartialEq)]
pub struct ResultStats {
    pub transferred_bytes: u64,
    pub runtime: Duration,
    /// 平均速度 字节/秒，保留两位小数
    pub average_speed: f64,
}

impl ResultStats {
    pub fn from_sample(sample: &ProgressSample) -> Option<Self> {
        if !sample.is_complete() {
            return None;
        }
        let secs = sample.runtime.as_secs_f64();
        let average_speed = if secs > 0.0 {
            (sample.transferred as f64 / secs * 100.0).round() / 100.0
        } else {
            0.0
        };
        Some(Self {
            transferred_bytes: sample.transferred,
            runtime: sample.runtime,
            average_speed,
        })
    }
}

/// 一次成功运行的结果
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadResult {
    pub media_id: String,
    /// None 表示传输结束时没有出现 100% 的采样，统计缺失
    pub stats: Option<ResultStats>,
    pub file: PathBuf,
    pub source_url: String,
    pub raw_title: String,
    pub artist: String,
    pub title: String,
    pub thumbnail: Option<String>,
}

impl DownloadResult {
    /// 进度没有走到 100%，统计数据不可用
    pub fn is_incomplete(&self) -> bool {
        self.stats.is_none()
    }
}
