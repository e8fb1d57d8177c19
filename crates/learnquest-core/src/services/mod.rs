use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::utils::retry::RetryConfig;

use self::profile_service::ProfileService;
use self::reward_service::RewardService;
use self::store::ProgressStore;
use self::supabase_store::SupabaseStore;
use self::task_service::TaskService;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ProgressStore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        tracing::info!("Using Supabase project at {}", config.supabase_url);
        let store = Arc::new(SupabaseStore::new(&config)?);
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn ProgressStore>) -> Self {
        Self { config, store }
    }

    /// Fixed-delay policy for writes.
    pub fn write_retry(&self) -> RetryConfig {
        RetryConfig::from_config(&self.config)
    }

    /// Reads are idempotent, so they back off faster and grow.
    pub fn read_retry(&self) -> RetryConfig {
        RetryConfig::exponential(
            self.config.retry_attempts.max(1),
            Duration::from_millis((self.config.retry_delay_ms / 4).max(1)),
        )
    }

    pub fn profile_service(&self) -> ProfileService {
        ProfileService::new(
            self.store.clone(),
            self.read_retry(),
            self.config.bell_pepper_cap,
        )
    }

    pub fn task_service(&self) -> TaskService {
        TaskService::new(
            self.store.clone(),
            self.read_retry(),
            self.write_retry(),
            self.config.bell_pepper_cap,
        )
    }

    pub fn reward_service(&self) -> RewardService {
        RewardService::new(
            self.store.clone(),
            self.read_retry(),
            self.write_retry(),
            self.config.bell_pepper_cap,
            self.config.daily_reward_points,
        )
    }
}

pub mod answer_evaluator;
pub mod level_calculator;
pub mod memory_store;
pub mod profile_service;
pub mod reward_service;
pub mod store;
pub mod streak_calculator;
pub mod supabase_store;
pub mod task_engine;
pub mod task_service;
