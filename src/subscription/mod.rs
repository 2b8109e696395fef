// src/subscription/mod.rs
mod dispatch;
mod hub;
mod producers;
mod registry;

pub use dispatch::{DispatchError, Dispatcher};
pub use hub::{Broadcaster, ChannelHub, Delivery};
pub use producers::{AvailableContextsProducer, ChannelProducer, CurrentContextProducer};
pub use registry::{Channel, Subscription, SubscriptionHandle, SubscriptionRegistry};
