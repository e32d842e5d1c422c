use poise::serenity_prelude::{
    ChannelId, CreateEmbed, CreateMessage, GuildId, RoleId, User, UserId,
};
use tracing::{info, warn};

use crate::bot::data::Context;
use crate::bot::error::Error;
use crate::commands::require_staff;
use crate::constants::embeds;
use crate::db::models::{ActionKind, ModerationAction};
use crate::db::queries::actions;
use crate::services::moderation::escalation::{self, EscalationPolicy};
use crate::utils::duration::{humanize_opt, parse_duration};
use crate::utils::permissions::StaffTier;

fn case_embed(action: &ModerationAction) -> CreateEmbed {
    embeds::info_embed()
        .title(format!("Case #{} | {}", action.id, action.kind.name()))
        .field("User", format!("<@{}>", action.user_id), true)
        .field("Moderator", format!("<@{}>", action.moderator_id), true)
        .field("Issued", format!("<t:{}:R>", action.created_at), true)
        .field(
            "Duration",
            humanize_opt(action.expires_at.map(|e| e - action.created_at)),
            true,
        )
        .field("Resolved", if action.resolved { "Yes" } else { "No" }, true)
        .field("Reason", action.reason.clone(), false)
}

/// Mirror a new case to the moderation log channel, if one is configured.
async fn log_action(ctx: Context<'_>, action: &ModerationAction) {
    let Some(channel_id) = ctx.data().settings.mod_log_channel_id else {
        return;
    };

    let message = CreateMessage::new().embed(case_embed(action));
    if let Err(e) = ChannelId::new(channel_id)
        .send_message(ctx.http(), message)
        .await
    {
        warn!("Could not write case #{} to mod log: {:?}", action.id, e);
    }
}

/// Best-effort DM telling the user what happened to them.
async fn notify_target(ctx: Context<'_>, user_id: i64, text: &str) {
    let embed = embeds::info_embed().title("Moderation Notice").description(text);
    if let Ok(dm) = UserId::new(user_id as u64).create_dm_channel(ctx.http()).await {
        let _ = dm.send_message(ctx.http(), CreateMessage::new().embed(embed)).await;
    }
}

/// Make a recorded action real on Discord.
async fn enforce(ctx: Context<'_>, action: &ModerationAction) -> Result<(), Error> {
    let guild_id = GuildId::new(ctx.data().settings.guild_id);
    let user_id = UserId::new(action.user_id as u64);

    match action.kind {
        ActionKind::Warn => {}
        ActionKind::Mute => {
            let role = RoleId::new(ctx.data().settings.mute_role_id);
            guild_id.member(ctx.http(), user_id).await?.add_role(ctx.http(), role).await?;
        }
        ActionKind::Limbo => {
            let role = RoleId::new(ctx.data().settings.limbo_role_id);
            guild_id.member(ctx.http(), user_id).await?.add_role(ctx.http(), role).await?;
        }
        ActionKind::Kick => {
            guild_id.kick_with_reason(ctx.http(), user_id, &action.reason).await?;
        }
        ActionKind::Ban => {
            guild_id.ban_with_reason(ctx.http(), user_id, 0, &action.reason).await?;
        }
    }

    Ok(())
}

async fn reply_case(ctx: Context<'_>, action: &ModerationAction, headline: &str) -> Result<(), Error> {
    let embed = embeds::success_embed().description(format!(
        "{} **Case #{}**: <@{}> ({})",
        headline,
        action.id,
        action.user_id,
        humanize_opt(action.expires_at.map(|e| e - action.created_at))
    ));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Warn a user. Warnings escalate automatically at fixed counts.
#[poise::command(slash_command, guild_only)]
pub async fn warn(
    ctx: Context<'_>,
    #[description = "User to warn"] user: User,
    #[description = "Reason"] reason: String,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Helper).await?;

    let result = escalation::apply_warning(
        &ctx.data().pool,
        &EscalationPolicy::default(),
        user.id.get() as i64,
        ctx.author().id.get() as i64,
        &reason,
    )
    .await?;

    notify_target(
        ctx,
        result.warning.user_id,
        &format!("You were warned: {} (warning #{})", reason, result.warning_count),
    )
    .await;
    log_action(ctx, &result.warning).await;

    let mut description = format!(
        "Warned <@{}> (warning #{}). **Case #{}**",
        user.id, result.warning_count, result.warning.id
    );

    if let Some(escalated) = &result.escalation {
        enforce(ctx, escalated).await?;
        log_action(ctx, escalated).await;
        description.push_str(&format!(
            "\nEscalated to **{}** for {} (**Case #{}**).",
            escalated.kind.name(),
            humanize_opt(escalated.expires_at.map(|e| e - escalated.created_at)),
            escalated.id
        ));
    }

    let embed = embeds::warning_embed().description(description);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Record a timed or indefinite action, enforce it, and announce it.
async fn punish(
    ctx: Context<'_>,
    user: &User,
    kind: ActionKind,
    duration: Option<String>,
    reason: String,
) -> Result<(), Error> {
    let duration = duration.map(|d| parse_duration(&d)).transpose()?;

    let action = actions::create(
        &ctx.data().pool,
        user.id.get() as i64,
        ctx.author().id.get() as i64,
        &reason,
        kind,
        duration,
    )
    .await?;

    // DM before a kick or ban lands, or it can never arrive
    notify_target(
        ctx,
        action.user_id,
        &format!(
            "You received a {} ({}): {}",
            kind.name(),
            humanize_opt(duration),
            reason
        ),
    )
    .await;

    enforce(ctx, &action).await?;
    log_action(ctx, &action).await;
    info!("{} issued {} #{} against {}", ctx.author().id, kind.name(), action.id, user.id);

    reply_case(ctx, &action, &format!("{} applied.", kind.name())).await
}

/// Undo the newest active action of a kind, or tell the moderator there is
/// nothing to undo.
async fn pardon(ctx: Context<'_>, user: &User, kind: ActionKind) -> Result<(), Error> {
    let action = actions::latest_active_of_kind(&ctx.data().pool, user.id.get() as i64, kind)
        .await?
        .ok_or_else(|| Error::custom(format!("<@{}> has no active {}.", user.id, kind.name())))?;

    let guild_id = GuildId::new(ctx.data().settings.guild_id);
    match kind {
        ActionKind::Mute => {
            let role = RoleId::new(ctx.data().settings.mute_role_id);
            guild_id.member(ctx.http(), user.id).await?.remove_role(ctx.http(), role).await?;
        }
        ActionKind::Limbo => {
            let role = RoleId::new(ctx.data().settings.limbo_role_id);
            guild_id.member(ctx.http(), user.id).await?.remove_role(ctx.http(), role).await?;
        }
        ActionKind::Ban => {
            guild_id.unban(ctx.http(), user.id).await?;
        }
        ActionKind::Warn | ActionKind::Kick => {
            return Err(Error::custom(format!("A {} cannot be undone.", kind.name())));
        }
    }

    actions::mark_resolved(&ctx.data().pool, action.id).await?;
    info!("{} resolved {} #{} for {}", ctx.author().id, kind.name(), action.id, user.id);

    let embed = embeds::success_embed()
        .description(format!("Removed {} from <@{}> (Case #{}).", kind.name(), user.id, action.id));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Mute a user, optionally for a limited time.
#[poise::command(slash_command, guild_only)]
pub async fn mute(
    ctx: Context<'_>,
    #[description = "User to mute"] user: User,
    #[description = "Reason"] reason: String,
    #[description = "Duration, e.g. 45m, 2h, 7d"] duration: Option<String>,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Moderator).await?;
    punish(ctx, &user, ActionKind::Mute, duration, reason).await
}

/// Lift a user's mute early.
#[poise::command(slash_command, guild_only)]
pub async fn unmute(
    ctx: Context<'_>,
    #[description = "User to unmute"] user: User,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Moderator).await?;
    pardon(ctx, &user, ActionKind::Mute).await
}

/// Kick a user from the server.
#[poise::command(slash_command, guild_only)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "User to kick"] user: User,
    #[description = "Reason"] reason: String,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Moderator).await?;
    punish(ctx, &user, ActionKind::Kick, None, reason).await
}

/// Ban a user, optionally for a limited time.
#[poise::command(slash_command, guild_only)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "User to ban"] user: User,
    #[description = "Reason"] reason: String,
    #[description = "Duration, e.g. 30d"] duration: Option<String>,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Moderator).await?;
    punish(ctx, &user, ActionKind::Ban, duration, reason).await
}

/// Lift a user's ban early.
#[poise::command(slash_command, guild_only)]
pub async fn unban(
    ctx: Context<'_>,
    #[description = "User to unban"] user: User,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Moderator).await?;
    pardon(ctx, &user, ActionKind::Ban).await
}

/// Restrict a user to the limbo channel, optionally for a limited time.
#[poise::command(slash_command, guild_only)]
pub async fn limbo(
    ctx: Context<'_>,
    #[description = "User to send to limbo"] user: User,
    #[description = "Reason"] reason: String,
    #[description = "Duration, e.g. 12h"] duration: Option<String>,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Moderator).await?;
    punish(ctx, &user, ActionKind::Limbo, duration, reason).await
}

/// Release a user from limbo early.
#[poise::command(slash_command, guild_only)]
pub async fn unlimbo(
    ctx: Context<'_>,
    #[description = "User to release"] user: User,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Moderator).await?;
    pardon(ctx, &user, ActionKind::Limbo).await
}

/// List a user's moderation history.
#[poise::command(slash_command, guild_only)]
pub async fn actions(
    ctx: Context<'_>,
    #[description = "User to look up"] user: User,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Helper).await?;

    let history = actions::for_user(&ctx.data().pool, user.id.get() as i64).await?;
    if history.is_empty() {
        let embed = embeds::info_embed().description(format!("<@{}> has a clean record.", user.id));
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        return Ok(());
    }

    let lines: Vec<String> = history
        .iter()
        .map(|a| {
            format!(
                "`#{}` **{}**{} <t:{}:R> | {}",
                a.id,
                a.kind.name(),
                if a.resolved { " (resolved)" } else { "" },
                a.created_at,
                a.reason
            )
        })
        .collect();

    let embed = embeds::info_embed()
        .title(format!("Moderation history ({} entries)", history.len()))
        .description(lines.join("\n"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show one case in full.
#[poise::command(slash_command, guild_only)]
pub async fn action(
    ctx: Context<'_>,
    #[description = "Case number"] id: i64,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Helper).await?;

    let action = actions::get(&ctx.data().pool, id)
        .await?
        .ok_or(Error::ActionNotFound(id))?;

    ctx.send(poise::CreateReply::default().embed(case_embed(&action))).await?;
    Ok(())
}

/// Expunge a case from the record entirely. Its number is never reused.
#[poise::command(slash_command, guild_only)]
pub async fn removeaction(
    ctx: Context<'_>,
    #[description = "Case number"] id: i64,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Admin).await?;

    if !actions::delete(&ctx.data().pool, id).await? {
        return Err(Error::ActionNotFound(id));
    }
    info!("{} expunged case #{}", ctx.author().id, id);

    let embed = embeds::success_embed().description(format!("Case #{} expunged.", id));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Rewrite the reason on an existing case.
#[poise::command(slash_command, guild_only)]
pub async fn reason(
    ctx: Context<'_>,
    #[description = "Case number"] id: i64,
    #[description = "New reason"] text: String,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Moderator).await?;

    if !actions::set_reason(&ctx.data().pool, id, &text).await? {
        return Err(Error::ActionNotFound(id));
    }

    let embed = embeds::success_embed().description(format!("Updated reason on case #{}.", id));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
