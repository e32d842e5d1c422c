use sqlx::SqlitePool;
use tracing::info;

use crate::db::models::{ActionKind, ModerationAction};
use crate::db::queries::actions;

/// A warning-count threshold and the action it triggers.
#[derive(Debug, Clone, Copy)]
pub struct EscalationTier {
    pub warning_count: i64,
    pub kind: ActionKind,
    /// Seconds; `None` means the action is permanent
    pub duration: Option<i64>,
}

/// Tiers are checked highest-count first and fire only on an exact match,
/// so removing an old warning later can re-trigger a tier when the count
/// climbs back to it.
#[derive(Debug, Clone)]
pub struct EscalationPolicy {
    tiers: Vec<EscalationTier>,
}

pub const ESCALATION_MODERATOR_ID: i64 = 0;

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(vec![
            EscalationTier { warning_count: 3, kind: ActionKind::Mute, duration: Some(3_600) },
            EscalationTier { warning_count: 6, kind: ActionKind::Mute, duration: Some(172_800) },
            EscalationTier { warning_count: 9, kind: ActionKind::Ban, duration: Some(2_592_000) },
        ])
    }
}

impl EscalationPolicy {
    pub fn new(mut tiers: Vec<EscalationTier>) -> Self {
        tiers.sort_by(|a, b| b.warning_count.cmp(&a.warning_count));
        Self { tiers }
    }

    /// The tier an active warning count lands on exactly, if any.
    pub fn evaluate(&self, warning_count: i64) -> Option<&EscalationTier> {
        self.tiers.iter().find(|tier| tier.warning_count == warning_count)
    }
}

/// What [`apply_warning`] recorded.
#[derive(Debug)]
pub struct EscalationResult {
    pub warning: ModerationAction,
    pub warning_count: i64,
    /// The follow-up action a tier produced, if the new count hit one
    pub escalation: Option<ModerationAction>,
}

/// Record a warning and, if the user's warning count lands exactly on a
/// policy tier, record the escalated action as well. The caller is
/// responsible for enforcing the escalation (role changes, bans) so a
/// gateway failure can never leave the ledger and policy out of step.
pub async fn apply_warning(
    pool: &SqlitePool,
    policy: &EscalationPolicy,
    user_id: i64,
    moderator_id: i64,
    reason: &str,
) -> Result<EscalationResult, sqlx::Error> {
    let warning =
        actions::create(pool, user_id, moderator_id, reason, ActionKind::Warn, None).await?;

    let warning_count = actions::count_of_kind(pool, user_id, ActionKind::Warn).await?;

    let escalation = match policy.evaluate(warning_count) {
        Some(tier) => {
            let escalated = actions::create(
                pool,
                user_id,
                ESCALATION_MODERATOR_ID,
                &format!("Automatic: reached {} warnings", warning_count),
                tier.kind,
                tier.duration,
            )
            .await?;
            info!(
                "User {} escalated to {} at {} warnings (action #{})",
                user_id,
                tier.kind.name(),
                warning_count,
                escalated.id
            );
            Some(escalated)
        }
        None => None,
    };

    Ok(EscalationResult { warning, warning_count, escalation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn test_default_tiers_exact_match_only() {
        let policy = EscalationPolicy::default();

        assert!(policy.evaluate(1).is_none());
        assert!(policy.evaluate(2).is_none());
        assert!(policy.evaluate(4).is_none());
        assert!(policy.evaluate(10).is_none());

        let tier = policy.evaluate(3).unwrap();
        assert_eq!(tier.kind, ActionKind::Mute);
        assert_eq!(tier.duration, Some(3_600));

        let tier = policy.evaluate(6).unwrap();
        assert_eq!(tier.kind, ActionKind::Mute);
        assert_eq!(tier.duration, Some(172_800));

        let tier = policy.evaluate(9).unwrap();
        assert_eq!(tier.kind, ActionKind::Ban);
        assert_eq!(tier.duration, Some(2_592_000));
    }

    #[test]
    fn test_duplicate_counts_resolve_highest_first() {
        let policy = EscalationPolicy::new(vec![
            EscalationTier { warning_count: 3, kind: ActionKind::Mute, duration: Some(60) },
            EscalationTier { warning_count: 3, kind: ActionKind::Ban, duration: None },
        ]);
        // Sorting is stable, so equal counts keep list order after the
        // descending sort; the first match wins
        let tier = policy.evaluate(3).unwrap();
        assert_eq!(tier.kind, ActionKind::Mute);
    }

    #[tokio::test]
    async fn test_third_warning_records_mute() {
        let pool = test_pool().await;
        let policy = EscalationPolicy::default();

        for n in 1..=2 {
            let result = apply_warning(&pool, &policy, 42, 1, "spam").await.unwrap();
            assert_eq!(result.warning_count, n);
            assert!(result.escalation.is_none());
        }

        let result = apply_warning(&pool, &policy, 42, 1, "spam").await.unwrap();
        assert_eq!(result.warning_count, 3);
        let escalation = result.escalation.unwrap();
        assert_eq!(escalation.kind, ActionKind::Mute);
        assert_eq!(escalation.moderator_id, ESCALATION_MODERATOR_ID);
        assert_eq!(escalation.expires_at, Some(escalation.created_at + 3_600));
    }

    #[tokio::test]
    async fn test_counts_are_per_user() {
        let pool = test_pool().await;
        let policy = EscalationPolicy::default();

        apply_warning(&pool, &policy, 1, 9, "a").await.unwrap();
        apply_warning(&pool, &policy, 1, 9, "b").await.unwrap();
        let other = apply_warning(&pool, &policy, 2, 9, "c").await.unwrap();
        assert_eq!(other.warning_count, 1);

        let result = apply_warning(&pool, &policy, 1, 9, "d").await.unwrap();
        assert_eq!(result.warning_count, 3);
        assert!(result.escalation.is_some());
    }

    #[tokio::test]
    async fn test_removed_warning_lets_tier_refire() {
        let pool = test_pool().await;
        let policy = EscalationPolicy::default();

        let mut last = None;
        for _ in 0..3 {
            last = Some(apply_warning(&pool, &policy, 5, 1, "x").await.unwrap());
        }
        assert!(last.as_ref().unwrap().escalation.is_some());

        // A moderator expunges one warning; the next one counts to exactly
        // 3 again and the tier fires a second time
        let removed = last.unwrap().warning.id;
        assert!(actions::delete(&pool, removed).await.unwrap());

        let result = apply_warning(&pool, &policy, 5, 1, "y").await.unwrap();
        assert_eq!(result.warning_count, 3);
        assert!(result.escalation.is_some());
    }
}
