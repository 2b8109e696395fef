// src/subscription/hub.rs
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

use super::registry::{Channel, SubscriptionHandle};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
    pub channel: Channel,
    pub payload: serde_json::Value,
}

/// Pushes a computed payload to one specific consumer.
pub trait Broadcaster: Send + Sync {
    /// Returns false when the consumer is gone.
    fn deliver(&self, handle: &SubscriptionHandle, delivery: Delivery) -> bool;
}

/// In-process outlets, one unbounded queue per subscription handle.
#[derive(Default)]
pub struct ChannelHub {
    outlets: Mutex<HashMap<SubscriptionHandle, mpsc::UnboundedSender<Delivery>>>,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, handle: SubscriptionHandle) -> mpsc::UnboundedReceiver<Delivery> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outlets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(handle, tx);
        rx
    }

    pub fn close(&self, handle: &SubscriptionHandle) {
        self.outlets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(handle);
    }
}

impl Broadcaster for ChannelHub {
    fn deliver(&self, handle: &SubscriptionHandle, delivery: Delivery) -> bool {
        let mut outlets = self.outlets.lock().unwrap_or_else(|e| e.into_inner());
        let sent = match outlets.get(handle) {
            Some(tx) => tx.send(delivery).is_ok(),
            None => return false,
        };
        if !sent {
            outlets.remove(handle);
        }
        sent
    }
}
