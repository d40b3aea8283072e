use url::Url;

/// Characters that may not appear in a file name on common filesystems
const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest file stem we produce, in characters
const MAX_FILENAME_CHARS: usize = 200;

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log10() / THRESHOLD.log10()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Replace filesystem-illegal characters one-for-one with `_` and cap the length
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if ILLEGAL_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_FILENAME_CHARS)
        .collect()
}

/// `<custom>.<ext>` when a name was given, `<title>_<id>.<ext>` otherwise
pub fn media_filename(title: &str, video_id: &str, custom_name: Option<&str>, extension: &str) -> String {
    match custom_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!("{}.{}", sanitize_filename(name), extension),
        None => format!("{}_{}.{}", sanitize_filename(title), video_id, extension),
    }
}

/// Extract domain from URL for display purposes
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|host| host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Check if the current environment has the tools the pipeline shells out to
pub async fn check_dependencies(transcriber: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available("ffmpeg", "-version").await {
        missing.push("ffmpeg - required to extract audio from downloaded videos".to_string());
    }

    if !check_command_available(transcriber, "--help").await {
        missing.push(format!("{} - required for speech-to-text", transcriber));
    }

    if !check_command_available("git", "--version").await {
        missing.push("git - required for publishing results".to_string());
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str, probe_arg: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg(probe_arg)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1048576), "1.0 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30s");
        assert_eq!(format_duration(90.0), "1m 30s");
        assert_eq!(format_duration(3661.0), "1h 1m 1s");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My/Video:Test*2024"), "My_Video_Test_2024");
        assert_eq!(sanitize_filename(r#"a<b>c"d\e|f?g"#), "a_b_c_d_e_f_g");
        assert_eq!(sanitize_filename("街头 采访!"), "街头 采访!");
    }

    #[test]
    fn test_sanitize_filename_truncates_by_chars() {
        let long = "抖".repeat(250);
        let sanitized = sanitize_filename(&long);
        assert_eq!(sanitized.chars().count(), 200);
    }

    #[test]
    fn test_media_filename() {
        assert_eq!(
            media_filename("街头/采访", "7301234567890123456", None, "mp4"),
            "街头_采访_7301234567890123456.mp4"
        );
        assert_eq!(media_filename("ignored", "1", Some("my:clip"), "mp4"), "my_clip.mp4");
        assert_eq!(media_filename("title", "1", Some("  "), "mp4"), "title_1.mp4");
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://www.douyin.com/video/1"), Some("douyin.com".to_string()));
        assert_eq!(extract_domain("https://v26.douyinvod.com/x"), Some("v26.douyinvod.com".to_string()));
        assert_eq!(extract_domain("invalid-url"), None);
    }
}
