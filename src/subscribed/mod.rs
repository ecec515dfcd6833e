//! Which event types are subscribed for an application.

pub mod processor;

pub use processor::{Event, EventsResponse, Processor};
