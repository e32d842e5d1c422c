use poise::serenity_prelude::{
    ChannelId, ChannelType, CreateChannel, CreateMessage, Mentionable, PermissionOverwrite,
    PermissionOverwriteType, Permissions, RoleId,
};
use tracing::info;

use crate::bot::data::Context;
use crate::bot::error::Error;
use crate::commands::{author_member, member_is_staff};
use crate::constants::embeds;
use crate::db::queries::tickets;
use crate::services::tickets as ticket_service;
use crate::utils::permissions::StaffTier;

/// Open a private ticket channel with the staff team.
#[poise::command(slash_command, guild_only)]
pub async fn ticket(
    ctx: Context<'_>,
    #[description = "What the ticket is about"] topic: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or_else(|| Error::custom("This command only works inside the server."))?;
    let settings = &ctx.data().settings;

    // One open ticket per user
    let open = tickets::all(&ctx.data().pool).await?;
    if open.iter().any(|t| t.user_id == ctx.author().id.get() as i64) {
        return Err(Error::custom("You already have an open ticket."));
    }

    let everyone = RoleId::new(guild_id.get());
    let mut overwrites = vec![
        PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            kind: PermissionOverwriteType::Role(everyone),
        },
        PermissionOverwrite {
            allow: Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES,
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Member(ctx.author().id),
        },
    ];
    if let Some(role_id) = settings.ticket_role_id {
        overwrites.push(PermissionOverwrite {
            allow: Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES,
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Role(RoleId::new(role_id)),
        });
    }

    let mut builder = CreateChannel::new(format!("ticket-{}", ctx.author().name))
        .kind(ChannelType::Text)
        .permissions(overwrites);
    if let Some(category_id) = settings.ticket_category_id {
        builder = builder.category(ChannelId::new(category_id));
    }

    let channel = guild_id.create_channel(ctx.http(), builder).await?;
    let ticket = tickets::create(
        &ctx.data().pool,
        ctx.author().id.get() as i64,
        channel.id.get() as i64,
    )
    .await?;
    info!("Ticket #{} opened by {} in channel {}", ticket.id, ctx.author().id, channel.id);

    let ping = settings
        .ticket_role_id
        .map(|id| format!("<@&{}> ", id))
        .unwrap_or_default();
    let embed = embeds::info_embed()
        .title(format!("Ticket #{}", ticket.id))
        .description(format!(
            "{}, describe your issue here. If nothing is written within 10 minutes, \
             this channel is removed automatically.{}",
            ctx.author().mention(),
            topic.map(|t| format!("\n\n**Topic:** {}", t)).unwrap_or_default()
        ));
    channel
        .send_message(ctx.http(), CreateMessage::new().content(ping).embed(embed))
        .await?;

    let reply =
        embeds::success_embed().description(format!("Your ticket is ready: <#{}>", channel.id));
    ctx.send(poise::CreateReply::default().embed(reply).ephemeral(true)).await?;
    Ok(())
}

/// Close the ticket this channel belongs to.
#[poise::command(slash_command, guild_only)]
pub async fn close(ctx: Context<'_>) -> Result<(), Error> {
    let ticket = tickets::by_channel(&ctx.data().pool, ctx.channel_id().get() as i64)
        .await?
        .ok_or(Error::TicketNotFound)?;

    let member = author_member(ctx).await?;
    let is_opener = ticket.user_id as u64 == ctx.author().id.get();
    if !is_opener && !member_is_staff(ctx, &member, StaffTier::Helper) {
        return Err(Error::PermissionDenied(
            "only the ticket opener or staff can close a ticket".to_string(),
        ));
    }

    ticket_service::close(&ctx.data().pool, &ticket).await?;

    let embed = embeds::success_embed()
        .description(format!("Ticket #{} closed. This channel will be removed.", ticket.id));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    ctx.channel_id().delete(ctx.http()).await?;
    tickets::delete(&ctx.data().pool, ticket.id).await?;
    info!("Ticket #{} closed by {}", ticket.id, ctx.author().id);
    Ok(())
}
