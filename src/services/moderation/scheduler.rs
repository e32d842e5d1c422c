use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::bot::error::Error;
use crate::constants::timeouts::ACTION_SWEEP_INTERVAL;
use crate::db::models::{ActionKind, ModerationAction};
use crate::db::queries::actions;

/// The Discord side of undoing a timed action. Methods return whether the
/// reversal had any effect; a user who already left, lost the role, or was
/// manually unbanned yields `Ok(false)`, not an error.
#[async_trait]
pub trait ModerationGateway: Send + Sync {
    async fn remove_mute_role(&self, user_id: u64) -> Result<bool, Error>;
    async fn remove_limbo_role(&self, user_id: u64) -> Result<bool, Error>;
    async fn unban(&self, user_id: u64) -> Result<bool, Error>;
    /// Best-effort DM; closed DMs are not an error
    async fn notify_user(&self, user_id: u64, message: &str);
    async fn log_expiry(&self, action: &ModerationAction);
}

/// Start the expiry sweep background task.
pub fn spawn_action_sweeper(pool: SqlitePool, gateway: Arc<dyn ModerationGateway>) {
    tokio::spawn(async move {
        let mut ticker = interval(ACTION_SWEEP_INTERVAL);

        loop {
            ticker.tick().await;

            if let Err(e) = sweep(&pool, gateway.as_ref(), Utc::now().timestamp()).await {
                error!("Error sweeping expired actions: {:?}", e);
            }
        }
    });
}

/// Undo every action whose expiry has passed and mark it resolved. An
/// action is marked resolved even when its reversal fails; a mute whose
/// role removal errored would otherwise be retried every sweep forever.
pub async fn sweep(
    pool: &SqlitePool,
    gateway: &dyn ModerationGateway,
    now: i64,
) -> Result<(), Error> {
    for action in actions::due(pool, now).await? {
        let user_id = action.user_id as u64;

        let undone = match action.kind {
            ActionKind::Mute => gateway.remove_mute_role(user_id).await,
            ActionKind::Limbo => gateway.remove_limbo_role(user_id).await,
            ActionKind::Ban => gateway.unban(user_id).await,
            ActionKind::Warn | ActionKind::Kick => {
                // These never carry an expiry; an action row saying
                // otherwise is corrupt, so retire it without a reversal
                warn!("Action #{} is a {} with an expiry, resolving as-is", action.id, action.kind.name());
                Ok(false)
            }
        };

        match undone {
            Ok(true) => {
                info!("Action #{} ({}) on user {} expired and was undone", action.id, action.kind.name(), user_id);
                gateway
                    .notify_user(user_id, &format!("Your {} has expired.", action.kind.name()))
                    .await;
                gateway.log_expiry(&action).await;
            }
            Ok(false) => {
                info!("Action #{} ({}) on user {} expired; nothing left to undo", action.id, action.kind.name(), user_id);
            }
            Err(e) => {
                error!("Failed to undo action #{} on user {}: {:?}", action.id, user_id, e);
            }
        }

        actions::mark_resolved(pool, action.id).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockGateway {
        unmutes: Mutex<Vec<u64>>,
        unlimbos: Mutex<Vec<u64>>,
        unbans: Mutex<Vec<u64>>,
        notifications: AtomicUsize,
        fail_unmute: bool,
        known_bans: Vec<u64>,
    }

    #[async_trait]
    impl ModerationGateway for MockGateway {
        async fn remove_mute_role(&self, user_id: u64) -> Result<bool, Error> {
            if self.fail_unmute {
                return Err(Error::custom("missing permissions"));
            }
            self.unmutes.lock().unwrap().push(user_id);
            Ok(true)
        }

        async fn remove_limbo_role(&self, user_id: u64) -> Result<bool, Error> {
            self.unlimbos.lock().unwrap().push(user_id);
            Ok(true)
        }

        async fn unban(&self, user_id: u64) -> Result<bool, Error> {
            if !self.known_bans.contains(&user_id) {
                return Ok(false);
            }
            self.unbans.lock().unwrap().push(user_id);
            Ok(true)
        }

        async fn notify_user(&self, _user_id: u64, _message: &str) {
            self.notifications.fetch_add(1, Ordering::SeqCst);
        }

        async fn log_expiry(&self, _action: &ModerationAction) {}
    }

    #[tokio::test]
    async fn test_sweep_undoes_due_mute_once() {
        let pool = test_pool().await;
        let gateway = MockGateway { known_bans: vec![], ..Default::default() };

        actions::create_at(&pool, 42, 1, "afk", ActionKind::Mute, Some(600), 1_000)
            .await
            .unwrap();

        // Not yet due
        sweep(&pool, &gateway, 1_500).await.unwrap();
        assert!(gateway.unmutes.lock().unwrap().is_empty());

        sweep(&pool, &gateway, 1_600).await.unwrap();
        assert_eq!(*gateway.unmutes.lock().unwrap(), vec![42]);
        assert_eq!(gateway.notifications.load(Ordering::SeqCst), 1);

        // Resolved actions never come back
        sweep(&pool, &gateway, 9_999).await.unwrap();
        assert_eq!(gateway.unmutes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_resolves_even_when_reversal_fails() {
        let pool = test_pool().await;
        let gateway = MockGateway { fail_unmute: true, ..Default::default() };

        let action = actions::create_at(&pool, 7, 1, "x", ActionKind::Mute, Some(10), 0)
            .await
            .unwrap();

        sweep(&pool, &gateway, 100).await.unwrap();

        let stored = actions::get(&pool, action.id).await.unwrap().unwrap();
        assert!(stored.resolved);
        assert_eq!(gateway.notifications.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sweep_handles_missing_ban_quietly() {
        let pool = test_pool().await;
        let gateway = MockGateway::default();

        // Banned user was manually unbanned in the meantime
        let action = actions::create_at(&pool, 9, 1, "raid", ActionKind::Ban, Some(60), 0)
            .await
            .unwrap();

        sweep(&pool, &gateway, 100).await.unwrap();

        assert!(gateway.unbans.lock().unwrap().is_empty());
        assert!(actions::get(&pool, action.id).await.unwrap().unwrap().resolved);
    }

    #[tokio::test]
    async fn test_sweep_removes_limbo_role() {
        let pool = test_pool().await;
        let gateway = MockGateway::default();

        actions::create_at(&pool, 12, 1, "cooldown", ActionKind::Limbo, Some(30), 0)
            .await
            .unwrap();
        sweep(&pool, &gateway, 31).await.unwrap();

        assert_eq!(*gateway.unlimbos.lock().unwrap(), vec![12]);
    }

    #[tokio::test]
    async fn test_permanent_actions_never_sweep() {
        let pool = test_pool().await;
        let gateway = MockGateway::default();

        actions::create_at(&pool, 3, 1, "perm", ActionKind::Ban, None, 0).await.unwrap();
        sweep(&pool, &gateway, i64::MAX).await.unwrap();

        assert!(gateway.unbans.lock().unwrap().is_empty());
    }
}
