//! Remote receiver input

pub mod receiver;

pub use receiver::{InputDispatcher, RemoteReceiver, SubscriptionId, Target};
