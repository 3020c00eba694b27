mod subscriber;

pub use subscriber::{AdminSubscriberAPI, NewSubscriber, StoreError, Subscriber, SubscriberAPI};
