// src/subscription/registry.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;
use tokio::sync::broadcast;
use uuid::Uuid;

const NEW_SUBSCRIBER_CAPACITY: usize = 64;

/// Output channels consumers can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    AvailableContexts,
    CurrentContext,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::AvailableContexts, Channel::CurrentContext];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::AvailableContexts => "available-contexts",
            Channel::CurrentContext => "current-context",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown channel '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionHandle(pub Uuid);

impl SubscriptionHandle {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One consumer's interest in a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub handle: SubscriptionHandle,
    pub params: serde_json::Value,
}

pub struct SubscriptionRegistry {
    channels: RwLock<HashMap<Channel, Vec<Subscription>>>,
    new_subscribers: broadcast::Sender<Channel>,
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        let (new_subscribers, _) = broadcast::channel(NEW_SUBSCRIBER_CAPACITY);
        Self {
            channels: RwLock::new(HashMap::new()),
            new_subscribers,
        }
    }

    /// Stream of channel names that just gained a subscriber.
    pub fn subscribe_new(&self) -> broadcast::Receiver<Channel> {
        self.new_subscribers.subscribe()
    }

    pub fn subscribe(&self, channel: Channel, params: serde_json::Value) -> SubscriptionHandle {
        let handle = SubscriptionHandle::generate();
        self.subscribe_as(handle, channel, params);
        handle
    }

    /// Like [`SubscriptionRegistry::subscribe`] with a handle chosen by the
    /// caller, so a delivery outlet can be opened before the first dispatch.
    pub fn subscribe_as(
        &self,
        handle: SubscriptionHandle,
        channel: Channel,
        params: serde_json::Value,
    ) {
        {
            let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
            channels
                .entry(channel)
                .or_default()
                .push(Subscription { handle, params });
        }
        let _ = self.new_subscribers.send(channel);
    }

    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        let mut removed = false;
        for subscriptions in channels.values_mut() {
            let before = subscriptions.len();
            subscriptions.retain(|s| &s.handle != handle);
            removed |= subscriptions.len() != before;
        }
        channels.retain(|_, subscriptions| !subscriptions.is_empty());
        removed
    }

    pub fn has_subscribers(&self, channel: Channel) -> bool {
        self.channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&channel)
            .map(|subs| !subs.is_empty())
            .unwrap_or(false)
    }

    /// Subscriptions of a channel in the order they were made.
    pub fn get_subscriptions(&self, channel: Channel) -> Vec<Subscription> {
        self.channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&channel)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn channel_names_round_trip() {
        for channel in Channel::ALL {
            assert_eq!(channel.as_str().parse::<Channel>().unwrap(), channel);
        }
        assert!("nope".parse::<Channel>().is_err());
    }

    #[test]
    fn keeps_order_and_duplicates() {
        let registry = SubscriptionRegistry::new();
        assert!(!registry.has_subscribers(Channel::AvailableContexts));

        let first = registry.subscribe(Channel::AvailableContexts, json!({ "search": "prod" }));
        let second = registry.subscribe(Channel::AvailableContexts, json!({ "search": "dev" }));
        let third = registry.subscribe(Channel::AvailableContexts, json!({ "search": "prod" }));

        let subs = registry.get_subscriptions(Channel::AvailableContexts);
        let handles: Vec<_> = subs.iter().map(|s| s.handle).collect();
        assert_eq!(handles, vec![first, second, third]);
        assert_eq!(subs[0].params, subs[2].params);
        assert!(!registry.has_subscribers(Channel::CurrentContext));
    }

    #[test]
    fn unsubscribe_removes_only_that_handle() {
        let registry = SubscriptionRegistry::new();
        let a = registry.subscribe(Channel::CurrentContext, json!(null));
        let b = registry.subscribe(Channel::CurrentContext, json!(null));

        assert!(registry.unsubscribe(&a));
        assert!(!registry.unsubscribe(&a));
        let subs = registry.get_subscriptions(Channel::CurrentContext);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].handle, b);

        registry.unsubscribe(&b);
        assert!(!registry.has_subscribers(Channel::CurrentContext));
    }

    #[tokio::test]
    async fn subscribing_announces_channel() {
        let registry = SubscriptionRegistry::new();
        let mut rx = registry.subscribe_new();
        registry.subscribe(Channel::CurrentContext, json!(null));
        assert_eq!(rx.recv().await.unwrap(), Channel::CurrentContext);
    }
}
