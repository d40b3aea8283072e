use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted with the video identifier in endpoint templates
pub const ID_PLACEHOLDER: &str = "{id}";

/// Placeholder substituted with the transcript in the summary prompt
pub const CONTENT_PLACEHOLDER: &str = "{news_content}";

const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 13_2_3 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/13.0.3 Mobile/15E148 Safari/604.1";

const DEFAULT_SUMMARY_PROMPT: &str = "请分析以下新闻内容，由于这是语音转文字的结果，可能存在同音字错误。分析后并提供：

1. 新闻摘要（200字以内）
2. 关键信息提取
3. 投资建议和风险提示
4. 相关行业影响分析

请用markdown格式输出。请在回答的第一行单独写一个简洁的标题（不要包含markdown格式符号），然后空一行，再开始正式的markdown内容。

**原始新闻内容（请自动纠正错误）：**
{news_content}
";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP session settings
    pub http: HttpConfig,

    /// Endpoint templates used by the resolution strategies
    pub endpoints: EndpointConfig,

    /// Media download settings
    pub download: DownloadConfig,

    /// External pipeline settings
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User-Agent sent on every request (mobile Safari by default)
    pub user_agent: String,

    /// Accept-Language header
    pub accept_language: String,

    /// Hostnames that mark a share link as a redirecting short link
    pub short_link_hosts: Vec<String>,

    pub redirect_timeout_secs: u64,
    pub api_timeout_secs: u64,
    pub page_timeout_secs: u64,
    pub connect_timeout_secs: u64,

    /// Maximum silence between two body chunks while downloading
    pub download_idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Mobile JSON API, `{id}` is replaced with the video identifier
    pub mobile_api: String,

    /// Mobile share page
    pub mobile_page: String,

    /// Desktop video page
    pub desktop_page: String,

    /// Referer header for the mobile API
    pub referer: String,

    /// Origin header for the mobile API
    pub origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Default output directory
    pub output_dir: PathBuf,

    /// Write buffer size in bytes
    pub chunk_size: usize,

    /// File extension given to downloaded media
    pub extension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub segment_dir: PathBuf,
    pub news_dir: PathBuf,

    /// Length of the audio parts handed to the transcriber one at a time
    pub segment_seconds: u64,

    /// Program used for speech-to-text
    pub transcriber: String,
    pub whisper_model: String,
    pub language: String,

    /// Program (and arguments) receiving the rendered prompt on stdin
    pub summarizer: Vec<String>,

    /// Prompt template, must contain `{news_content}`
    pub summary_prompt: String,

    pub git_auto_commit: bool,
    pub git_auto_push: bool,

    /// Directory staged by the publishing step
    pub publish_dir: PathBuf,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: MOBILE_USER_AGENT.to_string(),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8".to_string(),
            short_link_hosts: vec!["v.douyin.com".to_string()],
            redirect_timeout_secs: 10,
            api_timeout_secs: 15,
            page_timeout_secs: 15,
            connect_timeout_secs: 10,
            download_idle_timeout_secs: 30,
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            mobile_api: "https://www.iesdouyin.com/web/api/v2/aweme/iteminfo/?item_ids={id}".to_string(),
            mobile_page: "https://m.douyin.com/share/video/{id}".to_string(),
            desktop_page: "https://www.douyin.com/video/{id}".to_string(),
            referer: "https://www.douyin.com/".to_string(),
            origin: "https://www.douyin.com".to_string(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            chunk_size: 8192,
            extension: "mp4".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segment_dir: PathBuf::from("segments"),
            news_dir: PathBuf::from("news"),
            segment_seconds: 65,
            transcriber: "whisper".to_string(),
            whisper_model: "base".to_string(),
            language: "zh".to_string(),
            summarizer: vec!["llm".to_string()],
            summary_prompt: DEFAULT_SUMMARY_PROMPT.to_string(),
            git_auto_commit: true,
            git_auto_push: true,
            publish_dir: PathBuf::from("news"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            endpoints: EndpointConfig::default(),
            download: DownloadConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl HttpConfig {
    pub fn redirect_timeout(&self) -> Duration {
        Duration::from_secs(self.redirect_timeout_secs)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn download_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.download_idle_timeout_secs)
    }
}

impl Config {
    /// Load configuration from an explicit path, the usual locations, or fall back to defaults.
    ///
    /// Loading never writes anything; use [`Config::save`] for that.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };

        let config = match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                let content = fs_err::read_to_string(&path)
                    .context("Failed to read config file")?;
                serde_yaml::from_str::<Config>(&content)
                    .context("Failed to parse config file")?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    fn discover() -> Option<PathBuf> {
        // Current directory first for easy testing
        let local_config = PathBuf::from("douyin-fetch.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        Self::default_path().filter(|path| path.exists())
    }

    /// Per-user configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("douyin-fetch").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, template) in [
            ("mobile_api", &self.endpoints.mobile_api),
            ("mobile_page", &self.endpoints.mobile_page),
            ("desktop_page", &self.endpoints.desktop_page),
        ] {
            if !template.contains(ID_PLACEHOLDER) {
                anyhow::bail!("Endpoint template `{}` must contain {}", name, ID_PLACEHOLDER);
            }
        }

        if !self.pipeline.summary_prompt.contains(CONTENT_PLACEHOLDER) {
            anyhow::bail!("Summary prompt must contain {}", CONTENT_PLACEHOLDER);
        }

        if self.download.chunk_size == 0 {
            anyhow::bail!("Download chunk size must be greater than zero");
        }

        if self.pipeline.segment_seconds == 0 {
            anyhow::bail!("Audio segment length must be greater than zero");
        }

        if self.pipeline.summarizer.is_empty() {
            anyhow::bail!("Summarizer command must not be empty");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Output Directory: {}", self.download.output_dir.display());
        println!("  Short Link Hosts: {}", self.http.short_link_hosts.join(", "));
        println!("  Mobile API: {}", self.endpoints.mobile_api);
        println!("  Mobile Page: {}", self.endpoints.mobile_page);
        println!("  Desktop Page: {}", self.endpoints.desktop_page);
        println!(
            "  Timeouts: redirect {}s, api {}s, page {}s, download idle {}s",
            self.http.redirect_timeout_secs,
            self.http.api_timeout_secs,
            self.http.page_timeout_secs,
            self.http.download_idle_timeout_secs
        );
        println!("  Transcriber: {} (model {})", self.pipeline.transcriber, self.pipeline.whisper_model);
        println!("  Summarizer: {}", self.pipeline.summarizer.join(" "));
        println!("  Git: commit={} push={}", self.pipeline.git_auto_commit, self.pipeline.git_auto_push);
    }
}

/// Substitute the identifier into an endpoint template
pub fn render_endpoint(template: &str, id: &str) -> String {
    template.replace(ID_PLACEHOLDER, id)
}
