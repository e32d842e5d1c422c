use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{ChannelId, CreateMessage, GuildId, Http, RoleId, UserId};
use serenity::http::HttpError;
use tracing::debug;

use crate::bot::error::Error;
use crate::config::settings::Settings;
use crate::constants::embeds;
use crate::db::models::ModerationAction;
use crate::services::moderation::scheduler::ModerationGateway;

const UNKNOWN_BAN: isize = 10026;

/// [`ModerationGateway`] backed by the Discord REST API.
pub struct DiscordGateway {
    http: Arc<Http>,
    guild_id: GuildId,
    mute_role_id: RoleId,
    limbo_role_id: RoleId,
    mod_log_channel_id: Option<ChannelId>,
}

impl DiscordGateway {
    pub fn new(http: Arc<Http>, settings: &Settings) -> Self {
        Self {
            http,
            guild_id: GuildId::new(settings.guild_id),
            mute_role_id: RoleId::new(settings.mute_role_id),
            limbo_role_id: RoleId::new(settings.limbo_role_id),
            mod_log_channel_id: settings.mod_log_channel_id.map(ChannelId::new),
        }
    }

    /// Remove a marker role. A member who left the guild or already lost
    /// the role counts as nothing-to-undo.
    async fn remove_role(&self, user_id: u64, role_id: RoleId) -> Result<bool, Error> {
        let member = match self.guild_id.member(&self.http, UserId::new(user_id)).await {
            Ok(member) => member,
            Err(e) => {
                debug!("Member {} not found for role removal: {:?}", user_id, e);
                return Ok(false);
            }
        };

        if !member.roles.contains(&role_id) {
            return Ok(false);
        }

        member.remove_role(&self.http, role_id).await?;
        Ok(true)
    }
}

#[async_trait]
impl ModerationGateway for DiscordGateway {
    async fn remove_mute_role(&self, user_id: u64) -> Result<bool, Error> {
        self.remove_role(user_id, self.mute_role_id).await
    }

    async fn remove_limbo_role(&self, user_id: u64) -> Result<bool, Error> {
        self.remove_role(user_id, self.limbo_role_id).await
    }

    async fn unban(&self, user_id: u64) -> Result<bool, Error> {
        match self.guild_id.unban(&self.http, UserId::new(user_id)).await {
            Ok(()) => Ok(true),
            Err(serenity::Error::Http(HttpError::UnsuccessfulRequest(resp)))
                if resp.error.code == UNKNOWN_BAN =>
            {
                Ok(false)
            }
            Err(e) => Err(Error::Serenity(e)),
        }
    }

    async fn notify_user(&self, user_id: u64, message: &str) {
        let embed = embeds::info_embed().title("Moderation Update").description(message);
        let create = CreateMessage::new().embed(embed);

        // Closed DMs are fine
        match UserId::new(user_id).create_dm_channel(&self.http).await {
            Ok(dm) => {
                if let Err(e) = dm.send_message(&self.http, create).await {
                    debug!("Could not DM user {}: {:?}", user_id, e);
                }
            }
            Err(e) => {
                debug!("Could not open DM channel for user {}: {:?}", user_id, e);
            }
        }
    }

    async fn log_expiry(&self, action: &ModerationAction) {
        let Some(channel_id) = self.mod_log_channel_id else {
            return;
        };

        let embed = embeds::info_embed()
            .title(format!("{} Expired", action.kind.name()))
            .field("Case", format!("#{}", action.id), true)
            .field("User", format!("<@{}>", action.user_id), true)
            .field("Reason", action.reason.clone(), false);

        if let Err(e) = channel_id.send_message(&self.http, CreateMessage::new().embed(embed)).await
        {
            debug!("Could not write to mod log channel: {:?}", e);
        }
    }
}
