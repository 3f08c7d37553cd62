pub mod carrier;
pub mod client;
pub mod message;
pub mod product;
pub mod relation;
pub mod shipment;

pub use message::{Notification, NotificationKind, WebSocketMessage};
