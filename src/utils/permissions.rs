use serenity::all::RoleId;

use crate::config::Settings;

/// Staff tiers, lowest to highest. Each tier implies the ones below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StaffTier {
    Helper,
    Moderator,
    Admin,
}

/// The highest configured staff tier these roles grant, if any.
/// Administrator permission always counts as the top tier.
pub fn staff_tier(settings: &Settings, roles: &[RoleId], is_admin: bool) -> Option<StaffTier> {
    if is_admin {
        return Some(StaffTier::Admin);
    }

    let has = |role_id: Option<u64>| {
        role_id
            .map(|id| roles.iter().any(|r| r.get() == id))
            .unwrap_or(false)
    };

    if has(settings.admin_role_id) {
        Some(StaffTier::Admin)
    } else if has(settings.moderator_role_id) {
        Some(StaffTier::Moderator)
    } else if has(settings.helper_role_id) {
        Some(StaffTier::Helper)
    } else {
        None
    }
}

pub fn is_at_least(
    settings: &Settings,
    roles: &[RoleId],
    is_admin: bool,
    tier: StaffTier,
) -> bool {
    staff_tier(settings, roles, is_admin).map(|t| t >= tier).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            discord_token: String::new(),
            database_url: String::new(),
            guild_id: 1,
            mute_role_id: 2,
            limbo_role_id: 3,
            helper_role_id: Some(10),
            moderator_role_id: Some(11),
            admin_role_id: Some(12),
            mod_log_channel_id: None,
            suggestion_channel_id: None,
            exceptions_channel_id: None,
            ticket_category_id: None,
            ticket_role_id: None,
            applications_channel_id: None,
        }
    }

    #[test]
    fn test_highest_tier_wins() {
        let s = settings();
        let roles = [RoleId::new(10), RoleId::new(11)];
        assert_eq!(staff_tier(&s, &roles, false), Some(StaffTier::Moderator));
        assert_eq!(staff_tier(&s, &[RoleId::new(12)], false), Some(StaffTier::Admin));
        assert_eq!(staff_tier(&s, &[RoleId::new(99)], false), None);
    }

    #[test]
    fn test_admin_permission_overrides_roles() {
        let s = settings();
        assert_eq!(staff_tier(&s, &[], true), Some(StaffTier::Admin));
    }

    #[test]
    fn test_is_at_least_respects_ordering() {
        let s = settings();
        let helper = [RoleId::new(10)];
        assert!(is_at_least(&s, &helper, false, StaffTier::Helper));
        assert!(!is_at_least(&s, &helper, false, StaffTier::Moderator));
        assert!(is_at_least(&s, &[RoleId::new(12)], false, StaffTier::Helper));
    }
}
