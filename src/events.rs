//! Lifecycle events emitted after a transition commits.
//!
//! Event delivery is best-effort: a full channel or missing consumer is a
//! logged warning, never an error for the committing caller.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::WorkOrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    WorkOrderCreated {
        work_order_id: Uuid,
        wo_number: String,
    },
    WorkOrderStatusChanged {
        work_order_id: Uuid,
        old_status: WorkOrderStatus,
        new_status: WorkOrderStatus,
    },
    WorkOrderDeleted(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each committed event. Runs until the
/// sender side is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::WorkOrderCreated {
                work_order_id,
                wo_number,
            } => {
                info!(%work_order_id, %wo_number, "work order created");
            }
            Event::WorkOrderStatusChanged {
                work_order_id,
                old_status,
                new_status,
            } => {
                info!(%work_order_id, %old_status, %new_status, "work order status changed");
            }
            Event::WorkOrderDeleted(id) => {
                info!(work_order_id = %id, "work order deleted");
            }
        }
    }
    warn!("event channel closed; event processor exiting");
}
