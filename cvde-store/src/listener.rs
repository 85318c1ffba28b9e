use std::time::Duration;

use sqlx::postgres::PgListener;
use sqlx::{Pool, Postgres};
use tokio::sync::broadcast;
use tracing::{info, warn};

use cvde_shared::OrderChangedEvent;

/// Notification channel raised by the `exam_orders` trigger.
pub const ORDER_CHANNEL: &str = "exam_orders_changed";

/// Forwards Postgres notifications about exam-order changes into the
/// process-local broadcast feed. Intended to run as a background task for
/// the lifetime of the server; the connection is re-established after
/// transient failures.
pub async fn forward_order_changes(
    pool: Pool<Postgres>,
    feed: broadcast::Sender<OrderChangedEvent>,
) {
    loop {
        match PgListener::connect_with(&pool).await {
            Ok(mut listener) => match listener.listen(ORDER_CHANNEL).await {
                Ok(()) => {
                    info!("Listening for order changes on '{}'", ORDER_CHANNEL);
                    relay(&mut listener, &feed).await;
                }
                Err(e) => warn!("Failed to listen on '{}': {}", ORDER_CHANNEL, e),
            },
            Err(e) => warn!("Could not connect order-change listener: {}", e),
        }

        tokio::time::sleep(Duration::from_secs(5)).await;
    }
}

/// Receives notifications until the connection drops.
async fn relay(listener: &mut PgListener, feed: &broadcast::Sender<OrderChangedEvent>) {
    loop {
        match listener.recv().await {
            Ok(notification) => {
                match serde_json::from_str::<OrderChangedEvent>(notification.payload()) {
                    // Send only fails when no subscriber is connected.
                    Ok(event) => {
                        let _ = feed.send(event);
                    }
                    Err(e) => warn!("Ignoring malformed order-change payload: {}", e),
                }
            }
            Err(e) => {
                warn!("Order-change listener disconnected: {}", e);
                return;
            }
        }
    }
}
