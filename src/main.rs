use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::{error, info};

use mp3dl::common::logger::PrettyLogger;
use mp3dl::common::utils::FormatTool;
use mp3dl::{Backends, DownloadError, DownloadResult, Pipeline, PipelineOptions};

mod cli;

/// 下载单个媒体，进度显示为取整后的百分比
async fn download_one(
    media_id: &str,
    options: Arc<PipelineOptions>,
    backends: Backends,
) -> std::result::Result<DownloadResult, DownloadError> {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );

    let mut last_logged = None;
    let result = Pipeline::new(media_id, options, backends)
        .spawn()
        .wait_with_progress(|sample| {
            let transferred = FormatTool::format_size(sample.transferred);
            match sample.percentage {
                Some(percentage) => {
                    let rounded = percentage.round() as u64;
                    pb.set_position(rounded);
                    pb.set_message(format!(
                        "{} {}",
                        transferred,
                        FormatTool::format_speed(sample.speed)
                    ));
                    if last_logged != Some(rounded) {
                        last_logged = Some(rounded);
                        pb.suspend(|| info!("{}: {}%", media_id, rounded));
                    }
                }
                // 总长度未知，只能显示已下载的量
                None => pb.set_message(format!("{} 已下载", transferred)),
            }
        })
        .await;

    match &result {
        Ok(_) => pb.finish_with_message("下载完成"),
        Err(_) => pb.abandon_with_message("下载失败"),
    }
    result
}

fn report_success(result: &DownloadResult) {
    PrettyLogger::track_info(&result.artist, &result.title);
    PrettyLogger::file_info("输出文件", result.file.display().to_string());
    match &result.stats {
        Some(stats) => PrettyLogger::success(format!(
            "共 {}，用时 {}，平均速度 {}",
            FormatTool::format_size(stats.transferred_bytes),
            FormatTool::format_duration(stats.runtime),
            FormatTool::format_speed(stats.average_speed)
        )),
        None => PrettyLogger::warning("进度没有达到 100%，没有统计数据"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = cli::Cli::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    if args.ids.is_empty() {
        cli::Cli::command().print_help()?;
        println!();
        return Ok(());
    }
    if args.file_name.is_some() && args.ids.len() > 1 {
        anyhow::bail!("--file-name 只能用于单个媒体ID");
    }

    let options = Arc::new(args.overrides().resolve());
    let backends = Backends::system()?;
    info!("保存目录: {:?}", options.output_dir);

    // 逐个下载，单个失败不影响后面的
    let mut summary = Vec::new();
    let mut failed = 0usize;
    for media_id in &args.ids {
        PrettyLogger::step_start(format!("开始下载: {}", media_id));
        match download_one(media_id, Arc::clone(&options), backends.clone()).await {
            Ok(result) => {
                report_success(&result);
                summary.push(format!("{} {}", "✓".green(), result.file.display()));
            }
            Err(e) => {
                error!("下载失败: {}, 错误: {}", media_id, e);
                PrettyLogger::error(format!("{}: {}", media_id, e));
                summary.push(format!("{} {}: {}", "✗".red(), media_id, e));
                failed += 1;
            }
        }
        PrettyLogger::separator();
    }

    PrettyLogger::completion_summary(summary);
    if failed > 0 {
        anyhow::bail!("{}/{} 个媒体下载失败", failed, args.ids.len());
    }
    Ok(())
}
