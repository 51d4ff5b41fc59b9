use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Domain events emitted after each committed mutation.
///
/// Events are strictly post-commit notifications: a failed send never rolls
/// anything back, and consumers must tolerate at-most-once delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Materials catalog events
    BahanCreated(i64),
    BahanUpdated(i64),
    BahanDeleted(i64),

    // Ledger events
    StockAdjusted {
        location_id: i64,
        bahan_id: i64,
        previous_quantity: Decimal,
        new_quantity: Decimal,
        movement_id: Uuid,
    },

    // Transfer request events
    TransferRequestCreated(i64),
    TransferRequestApproved(i64),
    TransferRequestRejected(i64),
    TransferRequestFulfilled(i64),

    // Outgoing goods events
    BarangKeluarCreated(i64),
    BarangKeluarDispatched(i64),
    BarangKeluarReceived {
        barang_keluar_id: i64,
        permintaan_id: i64,
    },
    BarangKeluarCancelled(i64),

    // Incoming goods events
    BarangMasukRecorded {
        barang_masuk_id: i64,
        bahan_id: i64,
        jumlah: Decimal,
    },

    // Stock opname events
    OpnameFinalized {
        session_id: Uuid,
        location_id: i64,
        adjusted_items: usize,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Builds an event channel sized from configuration, returning the sender
/// half and the receiver to hand to [`process_events`].
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. The API layer replaces this
/// with its own consumer when it needs push notifications.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::StockAdjusted {
                location_id,
                bahan_id,
                previous_quantity,
                new_quantity,
                ..
            } => {
                debug!(
                    location_id,
                    bahan_id,
                    %previous_quantity,
                    %new_quantity,
                    "stock adjusted"
                );
            }
            other => debug!(event = ?other, "domain event"),
        }
    }

    info!("Event processing loop stopped");
}
