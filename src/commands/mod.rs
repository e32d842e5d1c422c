pub mod applications;
pub mod levels;
pub mod moderation;
pub mod music;
pub mod roles;
pub mod suggestions;
pub mod tickets;

use std::sync::Arc;

use serenity::all::Member;

use crate::bot::data::Context;
use crate::bot::error::Error;
use crate::utils::permissions::{is_at_least, StaffTier};

/// Resolve the invoking member, which every guild-only command has.
pub(crate) async fn author_member(ctx: Context<'_>) -> Result<Arc<Member>, Error> {
    ctx.author_member()
        .await
        .map(|m| Arc::new(m.into_owned()))
        .ok_or_else(|| Error::custom("This command only works inside the server."))
}

/// Interaction payloads carry the member's resolved permissions.
pub(crate) fn member_is_admin(member: &Member) -> bool {
    member.permissions.map(|p| p.administrator()).unwrap_or(false)
}

pub(crate) fn member_is_staff(ctx: Context<'_>, member: &Member, tier: StaffTier) -> bool {
    is_at_least(&ctx.data().settings, &member.roles, member_is_admin(member), tier)
}

/// Reject the invocation unless the author holds at least `tier`.
pub(crate) async fn require_staff(ctx: Context<'_>, tier: StaffTier) -> Result<(), Error> {
    let member = author_member(ctx).await?;
    if member_is_staff(ctx, &member, tier) {
        Ok(())
    } else {
        Err(Error::PermissionDenied(
            "you do not have permission to use this command".to_string(),
        ))
    }
}
