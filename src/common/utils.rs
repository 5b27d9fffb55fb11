use std::time::Duration;

pub struct FormatTool;

impl FormatTool {
    // 格式化时长
    pub fn format_duration(duration: Duration) -> String {
        let total = duration.as_secs_f64();
        let hours = (total / 3600.0).floor() as u32;
        let mins = ((total - (hours * 3600) as f64) / 60.0).floor() as u32;
        let secs = (total - (hours * 3600 + mins * 60) as f64).round() as u32;

        if hours != 0 {
            format!("{:02}:{:02}:{:02}", hours, mins, secs)
        } else {
            format!("{:02}:{:02}", mins, secs)
        }
    }

    // 格式化下载速度
    pub fn format_speed(speed: f64) -> String {
        if speed > 1024.0 * 1024.0 * 1024.0 {
            format!("{:.1} GB/s", speed / 1024.0 / 1024.0 / 1024.0)
        } else if speed > 1024.0 * 1024.0 {
            format!("{:.1} MB/s", speed / 1024.0 / 1024.0)
        } else if speed > 1024.0 {
            format!("{:.1} KB/s", speed / 1024.0)
        } else {
            format!("{:.0} B/s", speed.max(0.0))
        }
    }

    // 格式化文件大小
    pub fn format_size(size: u64) -> String {
        if size > 1024 * 1024 * 1024 {
            format!("{:.2} GB", size as f64 / 1024.0 / 1024.0 / 1024.0)
        } else if size > 1024 * 1024 {
            format!("{:.1} MB", size as f64 / 1024.0 / 1024.0)
        } else {
            format!("{:.1} KB", size as f64 / 1024.0)
        }
    }
}
