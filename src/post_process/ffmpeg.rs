use async_trait::async_trait;
use futures::StreamExt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, error, info};

use super::error::EncodeError;
use super::{EncodeJob, Encoder};
use crate::downloader::core::ByteStream;
use crate::downloader::error::StreamError;

/// 使用系统 FFmpeg 的编码器，输入通过 stdin 管道写入
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
}

enum Pump {
    Done,
    InputFailed(StreamError),
    PipeClosed(std::io::Error),
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// 获取 ffmpeg 路径（支持环境变量 FFMPEG_PATH）
    pub fn from_env() -> Self {
        Self::new(std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()))
    }

    /// 检查 ffmpeg 是否可用
    pub async fn check_available(&self) -> Result<(), EncodeError> {
        debug!("检查系统中是否安装了 ffmpeg...");
        let status = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => {
                error!("❌ 未检测到 ffmpeg，请确保系统中已安装并配置了 ffmpeg 可执行路径。");
                error!("或者设置环境变量 FFMPEG_PATH 指向 ffmpeg 可执行文件路径");
                Err(EncodeError::FfmpegNotFound {
                    path: self.program.clone(),
                })
            }
        }
    }

    pub fn build_args(job: &EncodeJob) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(), // 自动覆盖
            "-i".to_string(),
            "pipe:0".to_string(),
            "-b:a".to_string(),
            format!("{}k", job.audio_bitrate),
            "-c:a".to_string(),
            job.codec.clone(),
            "-f".to_string(),
            job.format.clone(),
        ];
        args.extend(job.directives.iter().cloned());
        args.push(job.output_path.to_string_lossy().to_string());
        args
    }

    async fn pump<W>(input: &mut ByteStream, stdin: &mut W) -> Pump
    where
        W: AsyncWrite + Unpin,
    {
        while let Some(chunk) = input.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => return Pump::InputFailed(e),
            };
            if let Err(e) = stdin.write_all(&chunk).await {
                return Pump::PipeClosed(e);
            }
        }
        match stdin.flush().await {
            Ok(()) => Pump::Done,
            Err(e) => Pump::PipeClosed(e),
        }
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::from_env()
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn encode(&self, mut input: ByteStream, job: EncodeJob) -> Result<(), EncodeError> {
        self.check_available().await?;

        let args = Self::build_args(&job);
        debug!("ffmpeg 参数: {:?}", args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EncodeError::failed("无法获取 ffmpeg 标准输入", None))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| EncodeError::failed("无法获取 ffmpeg 错误输出", None))?;

        // 同时读取错误输出，避免管道写满后 ffmpeg 阻塞
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let pumped = Self::pump(&mut input, &mut stdin).await;
        // 关闭 stdin，让 ffmpeg 结束读取
        drop(stdin);

        let pipe_error = match pumped {
            Pump::InputFailed(e) => {
                error!("❌ 输入流出错，终止 ffmpeg: {}", e);
                let _ = child.kill().await;
                return Err(EncodeError::Input(e));
            }
            Pump::PipeClosed(e) => Some(e),
            Pump::Done => None,
        };

        let status = child.wait().await?;
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            error!("❌ ffmpeg 转码失败，错误日志如下：\n{}", stderr);
            return Err(EncodeError::failed(
                format!("ffmpeg 退出码: {}", status),
                Some(stderr),
            ));
        }

        if let Some(e) = pipe_error {
            error!("❌ ffmpeg 提前关闭了输入管道: {}", e);
            return Err(EncodeError::failed(
                format!("写入 ffmpeg 失败: {}", e),
                Some(stderr),
            ));
        }

        info!("✅ 转码完成，输出文件: {:?}", job.output_path);
        Ok(())
    }
}
