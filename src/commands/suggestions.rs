use poise::serenity_prelude::{ChannelId, CreateMessage, EditMessage, MessageId, ReactionType, UserId};
use tracing::warn;

use crate::bot::data::Context;
use crate::bot::error::Error;
use crate::commands::require_staff;
use crate::constants::embeds;
use crate::db::models::Suggestion;
use crate::db::queries::suggestions;
use crate::utils::permissions::StaffTier;

fn suggestion_channel(ctx: Context<'_>) -> Result<ChannelId, Error> {
    ctx.data()
        .settings
        .suggestion_channel_id
        .map(ChannelId::new)
        .ok_or_else(|| Error::custom("Suggestions are not set up on this server."))
}

/// Submit a suggestion for the server.
#[poise::command(slash_command, guild_only)]
pub async fn suggest(
    ctx: Context<'_>,
    #[description = "Your suggestion"] text: String,
) -> Result<(), Error> {
    let channel = suggestion_channel(ctx)?;

    // Post first so the stored row can carry the message id
    let embed = embeds::info_embed()
        .title("New Suggestion")
        .description(text.clone())
        .field("Submitted by", format!("<@{}>", ctx.author().id), true)
        .colour(embeds::SUGGESTION_COLOR);
    let message = channel.send_message(ctx.http(), CreateMessage::new().embed(embed)).await?;

    for vote in ["⬆️", "⬇️"] {
        if let Err(e) = message
            .react(ctx.http(), ReactionType::Unicode(vote.to_string()))
            .await
        {
            warn!("Could not add vote reaction: {:?}", e);
        }
    }

    let suggestion = suggestions::create(
        &ctx.data().pool,
        ctx.author().id.get() as i64,
        message.id.get() as i64,
        &text,
    )
    .await?;

    // Retitle with the assigned number
    let embed = embeds::info_embed()
        .title(format!("Suggestion #{}", suggestion.id))
        .description(text)
        .field("Submitted by", format!("<@{}>", ctx.author().id), true)
        .colour(embeds::SUGGESTION_COLOR);
    channel
        .edit_message(ctx.http(), message.id, EditMessage::new().embed(embed))
        .await?;

    let reply = embeds::success_embed()
        .description(format!("Thanks! Your suggestion was filed as **#{}**.", suggestion.id));
    ctx.send(poise::CreateReply::default().embed(reply).ephemeral(true)).await?;
    Ok(())
}

/// Fetch an unresolved suggestion or explain why it cannot be resolved.
async fn resolvable(ctx: Context<'_>, id: i64) -> Result<Suggestion, Error> {
    let suggestion = suggestions::get(&ctx.data().pool, id)
        .await?
        .ok_or(Error::SuggestionNotFound(id))?;
    if suggestion.resolved {
        return Err(Error::SuggestionResolved(id));
    }
    Ok(suggestion)
}

/// Rewrite the posted suggestion with a verdict.
async fn publish_verdict(
    ctx: Context<'_>,
    suggestion: &Suggestion,
    verdict: &str,
    approved: bool,
    response: Option<String>,
) -> Result<(), Error> {
    let channel = suggestion_channel(ctx)?;

    let colour = if approved { embeds::SUCCESS_COLOR } else { embeds::ERROR_COLOR };
    let mut embed = embeds::info_embed()
        .title(format!("Suggestion #{} | {}", suggestion.id, verdict))
        .description(suggestion.suggestion.clone())
        .field("Submitted by", format!("<@{}>", suggestion.user_id), true)
        .field("Resolved by", format!("<@{}>", ctx.author().id), true)
        .colour(colour);
    if let Some(response) = response {
        embed = embed.field("Response", response, false);
    }

    if let Err(e) = channel
        .edit_message(
            ctx.http(),
            MessageId::new(suggestion.message_id as u64),
            EditMessage::new().embed(embed),
        )
        .await
    {
        // The posted message may have been deleted by hand; the verdict
        // still stands in the database
        warn!("Could not edit suggestion message {}: {:?}", suggestion.message_id, e);
    }

    // Tell the suggester; closed DMs are fine
    let embed = embeds::info_embed().title(format!("Your suggestion was {}", verdict.to_lowercase()))
        .description(suggestion.suggestion.clone());
    if let Ok(dm) = UserId::new(suggestion.user_id as u64).create_dm_channel(ctx.http()).await {
        let _ = dm.send_message(ctx.http(), CreateMessage::new().embed(embed)).await;
    }

    Ok(())
}

/// Approve a suggestion.
#[poise::command(slash_command, guild_only)]
pub async fn approve(
    ctx: Context<'_>,
    #[description = "Suggestion number"] id: i64,
    #[description = "Response to the suggester"] response: Option<String>,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Moderator).await?;

    let suggestion = resolvable(ctx, id).await?;
    suggestions::mark_resolved(&ctx.data().pool, id).await?;
    publish_verdict(ctx, &suggestion, "Approved", true, response).await?;

    let embed = embeds::success_embed().description(format!("Suggestion #{} approved.", id));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Deny a suggestion.
#[poise::command(slash_command, guild_only)]
pub async fn deny(
    ctx: Context<'_>,
    #[description = "Suggestion number"] id: i64,
    #[description = "Response to the suggester"] response: Option<String>,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Moderator).await?;

    let suggestion = resolvable(ctx, id).await?;
    suggestions::mark_resolved(&ctx.data().pool, id).await?;
    publish_verdict(ctx, &suggestion, "Denied", false, response).await?;

    let embed = embeds::success_embed().description(format!("Suggestion #{} denied.", id));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
