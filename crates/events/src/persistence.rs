//! Durable event persistence service.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! broadcast channel and appends every received [`DomainEvent`] to the
//! `session_events` table. It runs as a long-lived background task and
//! exits when the bus is dropped.

use podium_core::types::DbId;
use podium_db::repositories::SessionEventRepo;
use podium_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::DomainEvent;

/// Background service that persists domain events to the database.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop until the channel is closed.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<DomainEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to persist event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    async fn persist(pool: &DbPool, event: &DomainEvent) -> Result<DbId, sqlx::Error> {
        SessionEventRepo::insert(
            pool,
            &event.event_type,
            event.session_id,
            event.actor_user_id,
            &event.payload,
        )
        .await
    }
}
