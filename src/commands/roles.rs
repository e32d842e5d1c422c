use poise::serenity_prelude::Role;

use crate::bot::data::Context;
use crate::bot::error::Error;
use crate::commands::{author_member, require_staff};
use crate::constants::embeds;
use crate::db::queries::self_roles;
use crate::utils::permissions::StaffTier;

/// Manage the self-assignable role list.
#[poise::command(
    slash_command,
    guild_only,
    subcommands("selfrole_add", "selfrole_remove")
)]
pub async fn selfrole(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Make a role self-assignable.
#[poise::command(slash_command, guild_only, rename = "add")]
pub async fn selfrole_add(
    ctx: Context<'_>,
    #[description = "Role to offer"] role: Role,
    #[description = "Name members use to toggle it"] name: String,
    #[description = "What the role is for"] description: String,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Admin).await?;

    if let Some(existing) = self_roles::by_name(&ctx.data().pool, &name).await? {
        return Err(Error::custom(format!(
            "The name **{}** is already taken by <@&{}>.",
            name, existing.role_id
        )));
    }
    if !self_roles::add(&ctx.data().pool, role.id.get() as i64, &name, &description).await? {
        return Err(Error::custom(format!("<@&{}> is already self-assignable.", role.id)));
    }

    let embed = embeds::success_embed()
        .description(format!("<@&{}> can now be claimed with `/role {}`.", role.id, name));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Remove a role from the self-assignable list.
#[poise::command(slash_command, guild_only, rename = "remove")]
pub async fn selfrole_remove(
    ctx: Context<'_>,
    #[description = "Name of the self-role"] name: String,
) -> Result<(), Error> {
    require_staff(ctx, StaffTier::Admin).await?;

    let entry = self_roles::by_name(&ctx.data().pool, &name)
        .await?
        .ok_or(Error::SelfRoleNotFound)?;
    self_roles::remove(&ctx.data().pool, entry.role_id).await?;

    let embed = embeds::success_embed()
        .description(format!("**{}** is no longer self-assignable.", entry.name));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// List the roles you can give yourself.
#[poise::command(slash_command, guild_only)]
pub async fn roles(ctx: Context<'_>) -> Result<(), Error> {
    let all = self_roles::all(&ctx.data().pool).await?;
    if all.is_empty() {
        let embed = embeds::info_embed().description("There are no self-assignable roles yet.");
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        return Ok(());
    }

    let lines: Vec<String> = all
        .iter()
        .map(|r| format!("**{}** | <@&{}> | {}", r.name, r.role_id, r.description))
        .collect();

    let embed = embeds::info_embed()
        .title("Self-assignable roles")
        .description(lines.join("\n"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Give yourself a self-assignable role, or take it off again.
#[poise::command(slash_command, guild_only)]
pub async fn role(
    ctx: Context<'_>,
    #[description = "Name of the self-role"] name: String,
) -> Result<(), Error> {
    let entry = self_roles::by_name(&ctx.data().pool, &name)
        .await?
        .ok_or(Error::SelfRoleNotFound)?;

    let member = author_member(ctx).await?;
    let role_id = poise::serenity_prelude::RoleId::new(entry.role_id as u64);

    let embed = if member.roles.contains(&role_id) {
        member.remove_role(ctx.http(), role_id).await?;
        embeds::success_embed().description(format!("Removed **{}** from you.", entry.name))
    } else {
        member.add_role(ctx.http(), role_id).await?;
        embeds::success_embed().description(format!("You now have **{}**.", entry.name))
    };

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true)).await?;
    Ok(())
}
