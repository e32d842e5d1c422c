use std::env;

#[derive(Debug, Clone)]
pub struct Settings {
    pub discord_token: String,
    pub database_url: String,
    /// The single guild this bot manages
    pub guild_id: u64,
    /// Role applied to muted members
    pub mute_role_id: u64,
    /// Restricted-access role used for limbo
    pub limbo_role_id: u64,
    /// Staff tiers, lowest to highest
    pub helper_role_id: Option<u64>,
    pub moderator_role_id: Option<u64>,
    pub admin_role_id: Option<u64>,
    /// Channel for moderation log embeds
    pub mod_log_channel_id: Option<u64>,
    /// Channel suggestions are posted to
    pub suggestion_channel_id: Option<u64>,
    /// Channel unhandled errors are forwarded to
    pub exceptions_channel_id: Option<u64>,
    /// Category new ticket channels are created under
    pub ticket_category_id: Option<u64>,
    /// Role pinged on new tickets
    pub ticket_role_id: Option<u64>,
    /// Channel finished staff applications are posted to
    pub applications_channel_id: Option<u64>,
}

fn required(name: &str) -> Result<String, String> {
    env::var(name).map_err(|_| format!("{} environment variable not set", name))
}

fn required_id(name: &str) -> Result<u64, String> {
    required(name)?
        .parse::<u64>()
        .map_err(|_| format!("{} is not a valid Discord ID", name))
}

fn optional_id(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|s| s.parse::<u64>().ok())
}

impl Settings {
    pub fn from_env() -> Result<Self, String> {
        let discord_token = required("DISCORD_TOKEN")?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/atlas.db".to_string());

        let guild_id = required_id("GUILD_ID")?;
        let mute_role_id = required_id("MUTE_ROLE_ID")?;
        let limbo_role_id = required_id("LIMBO_ROLE_ID")?;

        Ok(Self {
            discord_token,
            database_url,
            guild_id,
            mute_role_id,
            limbo_role_id,
            helper_role_id: optional_id("HELPER_ROLE_ID"),
            moderator_role_id: optional_id("MODERATOR_ROLE_ID"),
            admin_role_id: optional_id("ADMIN_ROLE_ID"),
            mod_log_channel_id: optional_id("MOD_LOG_CHANNEL_ID"),
            suggestion_channel_id: optional_id("SUGGESTION_CHANNEL_ID"),
            exceptions_channel_id: optional_id("EXCEPTIONS_CHANNEL_ID"),
            ticket_category_id: optional_id("TICKET_CATEGORY_ID"),
            ticket_role_id: optional_id("TICKET_ROLE_ID"),
            applications_channel_id: optional_id("APPLICATIONS_CHANNEL_ID"),
        })
    }
}
