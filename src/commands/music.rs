use std::sync::Arc;

use poise::serenity_prelude::{ChannelId, GuildId};

use crate::bot::data::Context;
use crate::bot::error::Error;
use crate::commands::{author_member, member_is_staff};
use crate::constants::embeds;
use crate::services::music::player::{LoopMode, Player, SkipOutcome};
use crate::services::music::resolver::Resolution;
use crate::services::music::track::{format_track_duration, QueuedTrack};
use crate::services::music::voice::SongbirdSession;
use crate::utils::formatting::truncate;
use crate::utils::permissions::StaffTier;

/// The voice channel the invoking user is in, from the gateway cache.
fn author_voice_channel(ctx: Context<'_>) -> Result<ChannelId, Error> {
    ctx.serenity_context()
        .cache
        .guild(GuildId::new(ctx.data().settings.guild_id))
        .and_then(|guild| {
            guild
                .voice_states
                .get(&ctx.author().id)
                .and_then(|vs| vs.channel_id)
        })
        .ok_or_else(|| Error::custom("You need to be in a voice channel first!"))
}

/// The guild's player, or a user-facing error when nothing is playing.
fn existing_player(ctx: Context<'_>) -> Result<Arc<Player>, Error> {
    ctx.data()
        .players
        .get(ctx.data().settings.guild_id)
        .ok_or_else(|| Error::custom("I am not playing anything right now."))
}

/// Commands that steer playback require the author to share the bot's
/// voice channel.
async fn same_channel_player(ctx: Context<'_>) -> Result<Arc<Player>, Error> {
    let player = existing_player(ctx)?;
    let author_channel = author_voice_channel(ctx)?;

    let manager = songbird::get(ctx.serenity_context())
        .await
        .ok_or_else(|| Error::Voice("voice manager not initialized".to_string()))?;

    let bot_channel = match manager.get(GuildId::new(player.guild_id())) {
        Some(call) => call.lock().await.current_channel(),
        None => None,
    };

    if bot_channel != Some(author_channel.into()) {
        return Err(Error::custom("You need to be in my voice channel to do that!"));
    }

    Ok(player)
}

/// Get the guild's player, connecting to the author's voice channel and
/// starting one when there is none.
async fn get_or_join_player(ctx: Context<'_>) -> Result<Arc<Player>, Error> {
    if let Some(player) = ctx.data().players.get(ctx.data().settings.guild_id) {
        return Ok(player);
    }

    let channel = author_voice_channel(ctx)?;
    let guild_id = GuildId::new(ctx.data().settings.guild_id);

    let manager = songbird::get(ctx.serenity_context())
        .await
        .ok_or_else(|| Error::Voice("voice manager not initialized".to_string()))?;

    let call = manager
        .join(guild_id, channel)
        .await
        .map_err(|e| Error::Voice(format!("could not join voice channel: {:?}", e)))?;

    let serenity_ctx = ctx.serenity_context();
    let session = Arc::new(SongbirdSession::new(
        Arc::clone(&manager),
        call,
        Arc::clone(&serenity_ctx.http),
        Arc::clone(&serenity_ctx.cache),
        guild_id,
        ctx.channel_id(),
        serenity_ctx.cache.current_user().id,
    ));

    Ok(ctx.data().players.spawn(
        guild_id.get(),
        session,
        Arc::clone(&ctx.data().resolver),
    ))
}

async fn say_embed(ctx: Context<'_>, embed: serenity::all::CreateEmbed) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Summon the bot to your voice channel.
#[poise::command(slash_command, guild_only)]
pub async fn join(ctx: Context<'_>) -> Result<(), Error> {
    get_or_join_player(ctx).await?;
    say_embed(ctx, embeds::success_embed().description("Connected. Queue something with `/play`.")).await
}

/// Play a song or playlist from a URL or search query.
#[poise::command(slash_command, guild_only)]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"] query: String,
) -> Result<(), Error> {
    // Resolution can take a moment; acknowledge first
    ctx.defer().await?;

    let player = get_or_join_player(ctx).await?;
    let resolution = ctx.data().resolver.resolve(&query, ctx.author().id.get()).await?;

    let embed = match resolution {
        Resolution::Track(track) => {
            let embed = embeds::success_embed().description(format!(
                "Queued **{}** ({})",
                track.title,
                format_track_duration(track.duration_seconds)
            ));
            player.enqueue(QueuedTrack::Resolved(track));
            embed
        }
        Resolution::Playlist(tracks) => {
            let embed = embeds::success_embed()
                .description(format!("Queued **{}** tracks.", tracks.len()));
            player.enqueue_all(tracks);
            embed
        }
    };

    say_embed(ctx, embed).await
}

/// Pause the current track.
#[poise::command(slash_command, guild_only)]
pub async fn pause(ctx: Context<'_>) -> Result<(), Error> {
    let player = same_channel_player(ctx).await?;
    player.pause().await?;
    say_embed(ctx, embeds::success_embed().description("Paused.")).await
}

/// Resume a paused track.
#[poise::command(slash_command, guild_only)]
pub async fn resume(ctx: Context<'_>) -> Result<(), Error> {
    let player = same_channel_player(ctx).await?;
    player.resume().await?;
    say_embed(ctx, embeds::success_embed().description("Resumed.")).await
}

/// Skip the current track, or vote to.
#[poise::command(slash_command, guild_only)]
pub async fn skip(ctx: Context<'_>) -> Result<(), Error> {
    let player = same_channel_player(ctx).await?;

    let member = author_member(ctx).await?;
    let privileged = member_is_staff(ctx, &member, StaffTier::Helper);

    let embed = match player.request_skip(ctx.author().id.get(), privileged).await {
        SkipOutcome::Skipped { .. } => embeds::success_embed().description("Skipped."),
        SkipOutcome::VoteRecorded { votes, needed } => embeds::info_embed()
            .description(format!("Skip vote recorded: **{}/{}**.", votes, needed)),
        SkipOutcome::AlreadyVoted { votes, needed } => embeds::warning_embed()
            .description(format!("You already voted to skip (**{}/{}**).", votes, needed)),
        SkipOutcome::NothingPlaying => {
            return Err(Error::custom("I am not currently playing anything!"))
        }
    };

    say_embed(ctx, embed).await
}

/// Show the queue.
#[poise::command(slash_command, guild_only)]
pub async fn queue(ctx: Context<'_>) -> Result<(), Error> {
    let player = existing_player(ctx)?;

    let mut description = String::new();
    if let Some(current) = player.now_playing() {
        description.push_str(&format!(
            "**Now playing:** {} ({})\n\n",
            current.title,
            format_track_duration(current.duration_seconds)
        ));
    }

    let snapshot = player.queue_snapshot();
    if snapshot.is_empty() {
        description.push_str("The queue is empty.");
    } else {
        for (i, entry) in snapshot.iter().take(10).enumerate() {
            description.push_str(&format!(
                "`{}.` {} (<@{}>)\n",
                i + 1,
                truncate(entry.title(), 60),
                entry.requester()
            ));
        }
        if snapshot.len() > 10 {
            description.push_str(&format!("\n...and {} more.", snapshot.len() - 10));
        }
    }

    let embed = embeds::info_embed()
        .title(format!("Queue ({} entries) | Loop: {:?}", snapshot.len(), player.loop_mode()))
        .description(description);
    say_embed(ctx, embed).await
}

/// Show the current track.
#[poise::command(slash_command, guild_only)]
pub async fn nowplaying(ctx: Context<'_>) -> Result<(), Error> {
    let player = existing_player(ctx)?;
    let track = player
        .now_playing()
        .ok_or_else(|| Error::custom("I am not currently playing anything!"))?;

    let mut embed = embeds::info_embed()
        .title("Now playing")
        .description(format!("[{}]({})", track.title, track.webpage_url))
        .field("Duration", format_track_duration(track.duration_seconds), true)
        .field("Requested by", format!("<@{}>", track.requester), true);
    if let Some(uploader) = &track.uploader {
        embed = embed.field("Uploader", uploader.clone(), true);
    }
    if let Some(thumbnail) = &track.thumbnail {
        embed = embed.thumbnail(thumbnail.clone());
    }

    say_embed(ctx, embed).await
}

/// Remove a queue entry by its position.
#[poise::command(slash_command, guild_only)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Queue position (1 = next up)"]
    #[min = 1]
    position: u32,
) -> Result<(), Error> {
    let player = same_channel_player(ctx).await?;

    let member = author_member(ctx).await?;
    let privileged = member_is_staff(ctx, &member, StaffTier::Helper);

    let removed = player.remove_at(position as usize, ctx.author().id.get(), privileged)?;
    say_embed(
        ctx,
        embeds::success_embed().description(format!("Removed **{}**.", removed.title())),
    )
    .await
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum LoopChoice {
    #[name = "off"]
    Off,
    #[name = "track"]
    Track,
    #[name = "queue"]
    Queue,
}

/// Set the loop mode.
#[poise::command(slash_command, guild_only, rename = "loop")]
pub async fn r#loop(
    ctx: Context<'_>,
    #[description = "What to loop"] mode: LoopChoice,
) -> Result<(), Error> {
    let player = same_channel_player(ctx).await?;

    let mode = match mode {
        LoopChoice::Off => LoopMode::Off,
        LoopChoice::Track => LoopMode::Track,
        LoopChoice::Queue => LoopMode::Queue,
    };
    player.set_loop_mode(mode);

    let text = match mode {
        LoopMode::Off => "Looping is off.",
        LoopMode::Track => "Looping the current track.",
        LoopMode::Queue => "Looping the queue.",
    };
    say_embed(ctx, embeds::success_embed().description(text)).await
}

/// Clear the queue and stop after the current track.
#[poise::command(slash_command, guild_only)]
pub async fn clear(ctx: Context<'_>) -> Result<(), Error> {
    let player = same_channel_player(ctx).await?;
    player.clear();
    say_embed(ctx, embeds::success_embed().description("Queue cleared.")).await
}

/// Set playback volume for upcoming tracks.
#[poise::command(slash_command, guild_only)]
pub async fn volume(
    ctx: Context<'_>,
    #[description = "Volume percent, 0-200"]
    #[min = 0]
    #[max = 200]
    percent: u32,
) -> Result<(), Error> {
    let player = same_channel_player(ctx).await?;
    player.set_volume(percent as f32 / 100.0).await;
    say_embed(
        ctx,
        embeds::success_embed().description(format!("Volume set to {}%.", percent)),
    )
    .await
}

/// Disconnect the bot and drop the queue.
#[poise::command(slash_command, guild_only)]
pub async fn leave(ctx: Context<'_>) -> Result<(), Error> {
    let player = same_channel_player(ctx).await?;
    player.shutdown().await;
    say_embed(ctx, embeds::success_embed().description("Disconnected. See you!")).await
}
