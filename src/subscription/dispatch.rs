// src/subscription/dispatch.rs
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::producers::ChannelProducer;
use super::registry::{Channel, SubscriptionRegistry};
use crate::app::ContextManager;
use crate::utils::logging::Logger;

#[derive(Error, Debug, PartialEq)]
pub enum DispatchError {
    #[error("No producer registered for channel '{0}'")]
    UnregisteredChannel(Channel),
}

/// Channels recomputed after every document change.
const CHANGE_DRIVEN: [Channel; 2] = [Channel::AvailableContexts, Channel::CurrentContext];

/// Fans change events and new subscriptions out to channel producers.
pub struct Dispatcher {
    registry: Arc<SubscriptionRegistry>,
    producers: HashMap<Channel, Arc<dyn ChannelProducer>>,
    logger: Arc<dyn Logger>,
}

impl Dispatcher {
    pub fn new(registry: Arc<SubscriptionRegistry>, logger: Arc<dyn Logger>) -> Self {
        Self {
            registry,
            producers: HashMap::new(),
            logger,
        }
    }

    pub fn with_producer(mut self, channel: Channel, producer: Arc<dyn ChannelProducer>) -> Self {
        self.producers.insert(channel, producer);
        self
    }

    /// Every well-known channel must have a producer.
    pub fn validate(&self) -> Result<(), DispatchError> {
        match Channel::ALL
            .iter()
            .find(|c| !self.producers.contains_key(*c))
        {
            Some(channel) => Err(DispatchError::UnregisteredChannel(*channel)),
            None => Ok(()),
        }
    }

    pub async fn dispatch(&self, channel: Channel) {
        if !self.registry.has_subscribers(channel) {
            return;
        }
        let subscriptions = self.registry.get_subscriptions(channel);
        let producer = match self.producers.get(&channel) {
            Some(producer) => producer,
            None => {
                self.logger.log(&format!(
                    "Error: {}",
                    DispatchError::UnregisteredChannel(channel)
                ));
                return;
            }
        };
        self.logger.debug_log(&format!(
            "Dispatching '{}' to {} subscriber(s)",
            channel,
            subscriptions.len()
        ));
        producer.produce(&subscriptions).await;
    }

    pub async fn dispatch_by_channel_name(&self, name: &str) {
        match name.parse::<Channel>() {
            Ok(channel) => self.dispatch(channel).await,
            Err(e) => self.logger.log(&format!("Error: {}", e)),
        }
    }

    /// Validates the producer table and spawns the two listener tasks.
    ///
    /// Both receivers are created before this returns, so no event raised
    /// after `start` is missed.
    pub fn start(
        self: Arc<Self>,
        manager: &ContextManager,
    ) -> Result<Vec<JoinHandle<()>>, DispatchError> {
        self.validate()?;

        let mut changes = manager.subscribe_changes();
        let mut new_subscribers = self.registry.subscribe_new();

        let on_change = {
            let dispatcher = Arc::clone(&self);
            tokio::spawn(async move {
                loop {
                    match changes.recv().await {
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            dispatcher
                                .logger
                                .debug_log(&format!("Skipped {} change events", skipped));
                        }
                        Err(RecvError::Closed) => break,
                    }
                    for channel in CHANGE_DRIVEN {
                        dispatcher.dispatch(channel).await;
                    }
                }
            })
        };

        let on_subscribe = {
            let dispatcher = Arc::clone(&self);
            tokio::spawn(async move {
                loop {
                    match new_subscribers.recv().await {
                        Ok(channel) => dispatcher.dispatch(channel).await,
                        Err(RecvError::Lagged(skipped)) => {
                            dispatcher.logger.debug_log(&format!(
                                "Skipped {} subscription events, refreshing all channels",
                                skipped
                            ));
                            for channel in Channel::ALL {
                                dispatcher.dispatch(channel).await;
                            }
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            })
        };

        Ok(vec![on_change, on_subscribe])
    }
}
