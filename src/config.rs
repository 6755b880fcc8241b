/// Command line and environment configuration
///
/// Every flag can also come from the environment (and from a `.env` file,
/// which the binary loads before parsing).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Command line arguments for the habit tracker server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the SQLite database file
    /// If not provided, uses a default location in the user's home directory
    #[arg(long, env = "HABIT_WAVE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Address the HTTP server listens on
    #[arg(long, env = "HABIT_WAVE_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// API key of the text-generation service; enables AI-assisted remarks
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Chat model used for remarks and profiles
    #[arg(long, env = "HABIT_WAVE_LLM_MODEL", default_value = "deepseek-r1-distill-llama-70b")]
    pub llm_model: String,

    /// Root of the OpenAI-compatible API
    #[arg(long, env = "HABIT_WAVE_LLM_BASE_URL", default_value = "https://api.groq.com/openai/v1")]
    pub llm_base_url: String,

    /// Timeout for a single text-generation request, in seconds
    #[arg(long, default_value_t = 30)]
    pub llm_timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings for the network-backed text generator
#[derive(Debug, Clone)]
pub struct TextGenerationConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    /// `None` selects the local text fallback
    pub text_generation: Option<TextGenerationConfig>,
}

impl ServerConfig {
    /// Configuration for a given database with everything else defaulted
    pub fn with_database(database_path: PathBuf) -> Self {
        Self {
            database_path,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            text_generation: None,
        }
    }
}

impl Args {
    /// Log filter level derived from the flags
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.debug {
            "info"
        } else {
            "warn"
        }
    }

    /// Resolve defaults and prepare the database directory
    pub fn into_config(self) -> std::io::Result<ServerConfig> {
        let database_path = match self.database {
            Some(path) => {
                // Validate and prepare the provided path
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                path
            }
            None => default_database_path()?,
        };

        let text_generation = self
            .groq_api_key
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| TextGenerationConfig {
                api_key,
                model: self.llm_model,
                base_url: self.llm_base_url,
                timeout: Duration::from_secs(self.llm_timeout_secs),
            });

        Ok(ServerConfig {
            database_path,
            bind_addr: self.bind,
            text_generation,
        })
    }
}

/// Get the default database path with robust fallback strategy
fn default_database_path() -> std::io::Result<PathBuf> {
    // Try various locations in order of preference
    let potential_paths = [
        dirs::data_dir().map(|p| p.join("habit-wave")),
        dirs::home_dir().map(|p| p.join(".habit-wave")),
        dirs::config_dir().map(|p| p.join("habit-wave")),
        std::env::current_dir().ok().map(|p| p.join(".habit-wave")),
    ];

    for dir in potential_paths.iter().flatten() {
        if std::fs::create_dir_all(dir).is_ok() {
            // Test if we can write to this directory
            let probe = dir.join(".write_probe");
            if std::fs::write(&probe, b"ok").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return Ok(dir.join("wave.db"));
            }
        }
    }

    // Ultimate fallback: use a temporary directory
    let dir = std::env::temp_dir().join("habit-wave");
    std::fs::create_dir_all(&dir)?;

    tracing::warn!("Using temporary directory for database: {}", dir.display());
    Ok(dir.join("wave.db"))
}
