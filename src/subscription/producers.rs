// src/subscription/producers.rs
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::hub::{Broadcaster, Delivery};
use super::registry::{Channel, Subscription};
use crate::app::ContextManager;
use crate::types::ContextSummary;

/// Computes and delivers one channel's payload for its current subscribers.
#[async_trait]
pub trait ChannelProducer: Send + Sync {
    async fn produce(&self, subscriptions: &[Subscription]);
}

#[derive(Debug, Default, Deserialize)]
struct AvailableContextsParams {
    search: Option<String>,
}

fn filter_contexts(contexts: &[ContextSummary], params: &serde_json::Value) -> Vec<ContextSummary> {
    let params: AvailableContextsParams =
        serde_json::from_value(params.clone()).unwrap_or_default();
    match params.search.filter(|s| !s.is_empty()) {
        Some(search) => contexts
            .iter()
            .filter(|c| c.name.contains(&search))
            .cloned()
            .collect(),
        None => contexts.to_vec(),
    }
}

pub struct AvailableContextsProducer {
    manager: Arc<ContextManager>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl AvailableContextsProducer {
    pub fn new(manager: Arc<ContextManager>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            manager,
            broadcaster,
        }
    }
}

#[async_trait]
impl ChannelProducer for AvailableContextsProducer {
    async fn produce(&self, subscriptions: &[Subscription]) {
        let contexts = self.manager.available_contexts().await;
        for subscription in subscriptions {
            let payload = serde_json::to_value(filter_contexts(&contexts, &subscription.params))
                .unwrap_or(serde_json::Value::Null);
            self.broadcaster.deliver(
                &subscription.handle,
                Delivery {
                    channel: Channel::AvailableContexts,
                    payload,
                },
            );
        }
    }
}

pub struct CurrentContextProducer {
    manager: Arc<ContextManager>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl CurrentContextProducer {
    pub fn new(manager: Arc<ContextManager>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            manager,
            broadcaster,
        }
    }
}

#[async_trait]
impl ChannelProducer for CurrentContextProducer {
    async fn produce(&self, subscriptions: &[Subscription]) {
        let payload = serde_json::to_value(self.manager.current_context_summary().await)
            .unwrap_or(serde_json::Value::Null);
        for subscription in subscriptions {
            self.broadcaster.deliver(
                &subscription.handle,
                Delivery {
                    channel: Channel::CurrentContext,
                    payload: payload.clone(),
                },
            );
        }
    }
}
