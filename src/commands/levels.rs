use poise::serenity_prelude::User;

use crate::bot::data::Context;
use crate::bot::error::Error;
use crate::constants::embeds;
use crate::db::queries::levels as level_queries;
use crate::services::levels::progress_for_xp;
use crate::utils::formatting::{ordinal, progress_bar};

/// Show your level, or someone else's.
#[poise::command(slash_command, guild_only)]
pub async fn rank(
    ctx: Context<'_>,
    #[description = "User to look up"] user: Option<User>,
) -> Result<(), Error> {
    let target = user.as_ref().unwrap_or_else(|| ctx.author());

    let record = level_queries::get(&ctx.data().pool, target.id.get() as i64)
        .await?
        .ok_or_else(|| Error::custom(format!("<@{}> has not earned any XP yet.", target.id)))?;
    let rank = level_queries::rank_of(&ctx.data().pool, target.id.get() as i64)
        .await?
        .unwrap_or(1);

    let progress = progress_for_xp(record.xp);
    let embed = embeds::info_embed()
        .title(format!("{} | Level {}", target.name, progress.level))
        .description(format!(
            "{} **{}/{}** XP to level {}",
            progress_bar(progress.xp_into_level, progress.xp_for_next, 12),
            progress.xp_into_level,
            progress.xp_for_next,
            progress.level + 1
        ))
        .field("Server rank", ordinal(rank), true)
        .field("Total XP", record.xp.to_string(), true)
        .field("Messages", record.messages.to_string(), true);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show the top chatters on the server.
#[poise::command(slash_command, guild_only)]
pub async fn levels(ctx: Context<'_>) -> Result<(), Error> {
    let board = level_queries::leaderboard(&ctx.data().pool).await?;
    if board.is_empty() {
        let embed = embeds::info_embed().description("Nobody has earned any XP yet.");
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        return Ok(());
    }

    let lines: Vec<String> = board
        .iter()
        .take(10)
        .enumerate()
        .map(|(i, u)| {
            format!(
                "**{}** <@{}> | level {}, {} XP",
                ordinal(i as i64 + 1),
                u.user_id,
                progress_for_xp(u.xp).level,
                u.xp
            )
        })
        .collect();

    let embed = embeds::info_embed().title("Leaderboard").description(lines.join("\n"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
