use std::sync::Arc;

use poise::serenity_prelude::{
    self as serenity, CreateMessage, FullEvent, GuildId, Mentionable, Message, RoleId, UserId,
};
use tracing::{debug, error, info};

use crate::bot::data::Data;
use crate::bot::error::Error;
use crate::constants::embeds;
use crate::db::models::{ActionKind, ModerationAction};
use crate::db::queries::{actions, tickets};
use crate::services::levels;
use crate::services::moderation::automod::{self, Infraction, ILLEGAL_WORD_LIMBO_SECONDS};
use crate::services::moderation::escalation::{self, EscalationPolicy, ESCALATION_MODERATOR_ID};
use crate::services::tickets as ticket_service;
use crate::utils::duration::humanize_opt;
use crate::utils::permissions::{is_at_least, StaffTier};

fn message_is_staff(data: &Arc<Data>, message: &Message) -> bool {
    message
        .member
        .as_ref()
        .map(|member| {
            let is_admin = member.permissions.map(|p| p.administrator()).unwrap_or(false);
            is_at_least(&data.settings, &member.roles, is_admin, StaffTier::Helper)
        })
        .unwrap_or(false)
}

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, Arc<Data>, Error>,
    data: &Arc<Data>,
) -> Result<(), Error> {
    match event {
        FullEvent::Ready { data_about_bot, .. } => {
            info!("Bot ready as {}", data_about_bot.user.name);
        }

        FullEvent::Message { new_message } => {
            if new_message.author.bot || new_message.guild_id.is_none() {
                return Ok(());
            }

            match moderate(ctx, data, new_message).await {
                // The message is gone; nothing downstream should count it
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => error!("Automod error: {:?}", e),
            }

            if let Err(e) = grant_xp(ctx, data, new_message).await {
                error!("XP grant error: {:?}", e);
            }
            if let Err(e) = advance_ticket(data, new_message).await {
                error!("Ticket state handler error: {:?}", e);
            }
        }

        _ => {}
    }

    Ok(())
}

/// Best-effort DM telling the user why their message disappeared.
async fn dm_notice(ctx: &serenity::Context, user_id: UserId, text: &str) {
    let embed = embeds::warning_embed().description(text.to_string());
    if let Ok(dm) = user_id.create_dm_channel(&ctx.http).await {
        let _ = dm.send_message(&ctx.http, CreateMessage::new().embed(embed)).await;
    }
}

/// Apply an automatically escalated action on Discord. Warn and kick
/// escalations need no role work here; kicks are not in the default
/// policy anyway.
async fn enforce_escalation(
    ctx: &serenity::Context,
    data: &Arc<Data>,
    action: &ModerationAction,
) -> Result<(), Error> {
    let guild_id = GuildId::new(data.settings.guild_id);
    let user_id = UserId::new(action.user_id as u64);

    match action.kind {
        ActionKind::Mute => {
            let role = RoleId::new(data.settings.mute_role_id);
            guild_id.member(&ctx.http, user_id).await?.add_role(&ctx.http, role).await?;
        }
        ActionKind::Limbo => {
            let role = RoleId::new(data.settings.limbo_role_id);
            guild_id.member(&ctx.http, user_id).await?.add_role(&ctx.http, role).await?;
        }
        ActionKind::Ban => {
            guild_id.ban_with_reason(&ctx.http, user_id, 0, &action.reason).await?;
        }
        ActionKind::Warn | ActionKind::Kick => {}
    }

    Ok(())
}

/// Delete blacklisted-word messages. Illegal words limbo the author on
/// the spot; banned words accrue strikes that turn into an automatic
/// warning. Returns true when the message was removed.
async fn moderate(
    ctx: &serenity::Context,
    data: &Arc<Data>,
    message: &Message,
) -> Result<bool, Error> {
    let Some(infraction) = automod::scan(&message.content) else {
        return Ok(false);
    };
    if message_is_staff(data, message) {
        return Ok(false);
    }

    message.delete(&ctx.http).await?;
    let user_id = message.author.id;

    match infraction {
        Infraction::Illegal => {
            let action = actions::create(
                &data.pool,
                user_id.get() as i64,
                ESCALATION_MODERATOR_ID,
                "Use of a blacklisted word.",
                ActionKind::Limbo,
                Some(ILLEGAL_WORD_LIMBO_SECONDS),
            )
            .await?;
            enforce_escalation(ctx, data, &action).await?;
            info!("Automod sent {} to limbo (case #{})", user_id, action.id);

            dm_notice(
                ctx,
                user_id,
                &format!(
                    "Your message has been deleted because it contains a blacklisted word.\nYou have been sent to limbo for {}.",
                    humanize_opt(Some(ILLEGAL_WORD_LIMBO_SECONDS))
                ),
            )
            .await;
        }
        Infraction::Banned => {
            dm_notice(
                ctx,
                user_id,
                "Your message has been deleted because it contains a blacklisted word.",
            )
            .await;

            if data.strikes.record(user_id.get()) {
                let result = escalation::apply_warning(
                    &data.pool,
                    &EscalationPolicy::default(),
                    user_id.get() as i64,
                    ESCALATION_MODERATOR_ID,
                    "Repeated use of blacklisted words.",
                )
                .await?;
                info!(
                    "Automod warned {} (warning #{}, case #{})",
                    user_id, result.warning_count, result.warning.id
                );

                let mut notice = format!(
                    "You have been warned for repeated use of blacklisted words. This is warning #{}.",
                    result.warning_count
                );
                if let Some(escalated) = &result.escalation {
                    notice.push_str(&format!(
                        "\nBecause of your warning count you received a {} ({}).",
                        escalated.kind.name(),
                        humanize_opt(escalated.expires_at.map(|e| e - escalated.created_at))
                    ));
                }
                // DM before a ban lands, or it can never arrive
                dm_notice(ctx, user_id, &notice).await;
                if let Some(escalated) = &result.escalation {
                    enforce_escalation(ctx, data, escalated).await?;
                }
            }
        }
    }

    Ok(true)
}

/// Count a guild message toward the author's XP and congratulate them in
/// the channel they spoke in when it crossed a level boundary.
async fn grant_xp(
    ctx: &serenity::Context,
    data: &Arc<Data>,
    message: &Message,
) -> Result<(), Error> {
    let new_level =
        levels::grant_message_xp(&data.pool, &data.xp_cooldowns, message.author.id.get()).await?;

    if let Some(level) = new_level {
        let embed = embeds::success_embed()
            .title("Level Up!")
            .description(format!("{} is now level **{}**!", message.author.mention(), level));
        message
            .channel_id
            .send_message(&ctx.http, CreateMessage::new().embed(embed))
            .await?;
    }

    Ok(())
}

/// The opener's first message moves a ticket to awaiting-staff; the first
/// staff message after that opens it.
async fn advance_ticket(data: &Arc<Data>, message: &Message) -> Result<(), Error> {
    let Some(ticket) = tickets::by_channel(&data.pool, message.channel_id.get() as i64).await?
    else {
        return Ok(());
    };

    let is_staff = message_is_staff(data, message);

    let advanced =
        ticket_service::advance_on_message(&data.pool, &ticket, message.author.id.get(), is_staff)
            .await?;

    if let Some(state) = advanced {
        debug!("Ticket #{} advanced to {:?} in channel {}", ticket.id, state, message.channel_id);
    }

    Ok(())
}
