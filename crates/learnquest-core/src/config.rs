use serde::Deserialize;
use std::env;

const DEFAULT_RETRY_ATTEMPTS: usize = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 500;
const DEFAULT_BELL_PEPPER_CAP: u32 = 3;
const DEFAULT_DAILY_REWARD_POINTS: u64 = 20;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub retry_attempts: usize,
    pub retry_delay_ms: u64,
    pub bell_pepper_cap: u32,
    pub daily_reward_points: u64,
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: String::new(),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            bell_pepper_cap: DEFAULT_BELL_PEPPER_CAP,
            daily_reward_points: DEFAULT_DAILY_REWARD_POINTS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Local .env is optional; real deployments inject env vars directly
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let defaults = Config::default();

        let supabase_url = settings
            .get_string("supabase.url")
            .or_else(|_| env::var("SUPABASE_URL"))
            .unwrap_or_else(|_| {
                tracing::warn!(
                    "SUPABASE_URL not set, using local default {}",
                    defaults.supabase_url
                );
                defaults.supabase_url.clone()
            });

        let supabase_anon_key = match settings
            .get_string("supabase.anon_key")
            .or_else(|_| env::var("SUPABASE_ANON_KEY"))
        {
            Ok(key) => key,
            Err(_) if env == "prod" => {
                return Err(config::ConfigError::Message(
                    "SUPABASE_ANON_KEY must be set in production".to_string(),
                ))
            }
            Err(_) => {
                tracing::warn!("SUPABASE_ANON_KEY not set (dev mode only!)");
                String::new()
            }
        };

        let retry_attempts = read_positive(&settings, "retry.attempts")
            .map(|v| v as usize)
            .unwrap_or(defaults.retry_attempts);

        let retry_delay_ms = read_positive(&settings, "retry.delay_ms")
            .unwrap_or(defaults.retry_delay_ms);

        let bell_pepper_cap = read_positive(&settings, "resources.bell_pepper_cap")
            .map(|v| v as u32)
            .unwrap_or(defaults.bell_pepper_cap);

        let daily_reward_points = read_positive(&settings, "rewards.daily_points")
            .unwrap_or(defaults.daily_reward_points);

        let http_timeout_secs = read_positive(&settings, "http.timeout_secs")
            .unwrap_or(defaults.http_timeout_secs);

        Ok(Config {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key,
            retry_attempts,
            retry_delay_ms,
            bell_pepper_cap,
            daily_reward_points,
            http_timeout_secs,
        })
    }
}

fn read_positive(settings: &config::Config, key: &str) -> Option<u64> {
    settings
        .get_int(key)
        .ok()
        .filter(|v| *v > 0)
        .map(|v| v as u64)
}
