use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use mp3dl::OptionOverrides;
use mp3dl::parser::models::Quality;

/// 音频下载转码工具
#[derive(Parser, Debug)]
#[command(name = "mp3dl")]
#[command(version = "0.1")]
#[command(author = "rpeng252@gmail.com")]
#[command(about = "下载媒体音频并转码为 MP3", long_about = None)]
pub struct Cli {
    /// 媒体ID，可以一次传入多个，按顺序下载
    #[arg(value_name = "MEDIA_ID")]
    pub ids: Vec<String>,

    /// 保存目录
    #[arg(long, value_name = "DIR")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// 输出文件名 (仅用于单个媒体ID)
    #[arg(long, value_name = "NAME")]
    pub file_name: Option<String>,

    /// 音质
    #[arg(long, value_name = "QUALITY")]
    #[arg(help = "音质: highestaudio, lowestaudio 或格式ID")]
    pub quality: Option<Quality>,

    /// 允许 webm 容器
    #[arg(long)]
    pub allow_webm: bool,

    /// 进度采样间隔 (毫秒)
    #[arg(long, value_name = "MS")]
    pub progress_interval: Option<u64>,

    /// 预读数据块数量
    #[arg(long, value_name = "N")]
    pub read_ahead: Option<usize>,

    /// 追加的 ffmpeg 输出参数，可重复
    #[arg(long = "output-option", value_name = "ARG", allow_hyphen_values = true)]
    pub output_options: Vec<String>,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// 命令行参数转换为配置覆盖项，未指定的使用默认值
    pub fn overrides(&self) -> OptionOverrides {
        OptionOverrides {
            output_dir: self.output_dir.clone(),
            file_name: self.file_name.clone(),
            quality: self.quality.clone(),
            read_ahead: self.read_ahead,
            progress_interval: self.progress_interval.map(Duration::from_millis),
            allow_webm: self.allow_webm.then_some(true),
            output_options: (!self.output_options.is_empty()).then(|| self.output_options.clone()),
            request: None,
        }
    }
}
