use atlas::{bot, config::Settings, db};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn summarize(settings: &Settings) {
    info!("Atlas configured for guild {}", settings.guild_id);
    if settings.mod_log_channel_id.is_none() {
        warn!("MOD_LOG_CHANNEL_ID not set; moderation cases will not be logged");
    }
    if settings.suggestion_channel_id.is_none() {
        warn!("SUGGESTION_CHANNEL_ID not set; /suggest is disabled");
    }
    if settings.ticket_category_id.is_none() {
        warn!("TICKET_CATEGORY_ID not set; /ticket is disabled");
    }
    if settings.exceptions_channel_id.is_none() {
        warn!("EXCEPTIONS_CHANNEL_ID not set; command failures stay in the log only");
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Atlas");

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load settings: {}", e);
            std::process::exit(1);
        }
    };
    summarize(&settings);

    let pool = match db::pool::create_pool(&settings.database_url).await {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = db::pool::run_migrations(&pool).await {
        error!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }
    info!("Database ready at {}", settings.database_url);

    // The framework owns the gateway connection plus the expiry and
    // ticket sweepers; main only assembles its inputs.
    if let Err(e) = bot::framework::run(settings, pool).await {
        error!("Bot error: {}", e);
        std::process::exit(1);
    }
}
