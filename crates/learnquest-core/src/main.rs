use learnquest_core::{config::Config, models::UserContext, services::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Prints the profile summary (level, streak, bell peppers) for one user.
///
/// Usage: `learnquest-core <user-id> [access-token]`. The token falls back to
/// `LEARNQUEST_ACCESS_TOKEN`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "learnquest_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let user_id: Uuid = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: learnquest-core <user-id> [access-token]"))?
        .parse()?;
    let access_token = args
        .next()
        .or_else(|| std::env::var("LEARNQUEST_ACCESS_TOKEN").ok())
        .unwrap_or_default();

    let config = Config::load()?;
    tracing::info!(
        "Configuration loaded for environment: {}",
        std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())
    );

    let state = AppState::new(config)?;
    let ctx = UserContext::new(user_id, access_token);

    let summary = state.profile_service().summary(&ctx).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
