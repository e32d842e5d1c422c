use std::sync::Arc;

use chrono::Utc;
use serenity::all::{ChannelId, CreateMessage, Http, UserId};
use sqlx::SqlitePool;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::bot::error::Error;
use crate::constants::embeds;
use crate::constants::timeouts::{TICKET_RESPONSE_TIMEOUT_SECONDS, TICKET_SWEEP_INTERVAL};
use crate::db::models::{Ticket, TicketState};
use crate::db::queries::tickets;

/// Advance a ticket when someone speaks in its channel. Opener messages
/// move Created to AwaitingStaff; staff messages move AwaitingStaff to
/// Open. Anything else leaves the state alone.
pub async fn advance_on_message(
    pool: &SqlitePool,
    ticket: &Ticket,
    author_id: u64,
    author_is_staff: bool,
) -> Result<Option<TicketState>, sqlx::Error> {
    let next = match ticket.state {
        TicketState::Created if author_id == ticket.user_id as u64 => TicketState::AwaitingStaff,
        TicketState::AwaitingStaff if author_is_staff => TicketState::Open,
        _ => return Ok(None),
    };

    tickets::set_state(pool, ticket.id, next).await?;
    info!("Ticket #{} moved to {:?}", ticket.id, next);
    Ok(Some(next))
}

/// Close a ticket. The channel itself is deleted by the caller so command
/// responses can still go out first.
pub async fn close(pool: &SqlitePool, ticket: &Ticket) -> Result<(), Error> {
    if ticket.state == TicketState::Closed {
        return Ok(());
    }
    tickets::set_state(pool, ticket.id, TicketState::Closed).await?;
    info!("Ticket #{} closed", ticket.id);
    Ok(())
}

/// Start the stale-ticket sweep background task. Tickets whose opener
/// never wrote anything get their channel deleted after the grace period.
pub fn spawn_ticket_sweeper(http: Arc<Http>, pool: SqlitePool) {
    tokio::spawn(async move {
        let mut ticker = interval(TICKET_SWEEP_INTERVAL);

        loop {
            ticker.tick().await;

            if let Err(e) = sweep_stale(&http, &pool, Utc::now().timestamp()).await {
                error!("Error sweeping stale tickets: {:?}", e);
            }
        }
    });
}

async fn sweep_stale(http: &Http, pool: &SqlitePool, now: i64) -> Result<(), Error> {
    for ticket in tickets::all(pool).await? {
        if !ticket.is_stale(now, TICKET_RESPONSE_TIMEOUT_SECONDS) {
            continue;
        }

        match ChannelId::new(ticket.channel_id as u64).delete(http).await {
            Ok(_) => info!("Deleted unanswered ticket #{}", ticket.id),
            Err(e) => warn!("Failed to delete channel for ticket #{}: {:?}", ticket.id, e),
        }

        notify_opener(http, ticket.user_id as u64).await;
        tickets::delete(pool, ticket.id).await?;
    }

    Ok(())
}

/// Let the opener know their ticket timed out. Closed DMs are not an error.
async fn notify_opener(http: &Http, user_id: u64) {
    let embed = embeds::info_embed().title("Ticket Closed").description(
        "Your ticket was closed because nothing was written in it for 10 minutes. \
         Feel free to open a new one whenever you are ready.",
    );

    match UserId::new(user_id).create_dm_channel(http).await {
        Ok(dm) => {
            if let Err(e) = dm.send_message(http, CreateMessage::new().embed(embed)).await {
                debug!("Could not DM ticket opener {}: {:?}", user_id, e);
            }
        }
        Err(e) => {
            debug!("Could not open DM channel for user {}: {:?}", user_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_lifecycle_is_linear() {
        let pool = test_pool().await;
        let ticket = tickets::create(&pool, 42, 900).await.unwrap();
        assert_eq!(ticket.state, TicketState::Created);

        // Staff talking first changes nothing
        assert!(advance_on_message(&pool, &ticket, 7, true).await.unwrap().is_none());

        let next = advance_on_message(&pool, &ticket, 42, false).await.unwrap();
        assert_eq!(next, Some(TicketState::AwaitingStaff));

        let ticket = tickets::get(&pool, ticket.id).await.unwrap().unwrap();
        // The opener talking again does not advance further
        assert!(advance_on_message(&pool, &ticket, 42, false).await.unwrap().is_none());

        let next = advance_on_message(&pool, &ticket, 7, true).await.unwrap();
        assert_eq!(next, Some(TicketState::Open));

        let ticket = tickets::get(&pool, ticket.id).await.unwrap().unwrap();
        assert!(advance_on_message(&pool, &ticket, 7, true).await.unwrap().is_none());
        assert!(advance_on_message(&pool, &ticket, 42, false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let pool = test_pool().await;
        let ticket = tickets::create(&pool, 42, 900).await.unwrap();

        close(&pool, &ticket).await.unwrap();
        let closed = tickets::get(&pool, ticket.id).await.unwrap().unwrap();
        assert_eq!(closed.state, TicketState::Closed);

        close(&pool, &closed).await.unwrap();
    }
}
