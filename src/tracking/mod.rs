pub mod projection;
pub mod status;

pub use projection::{annotate, project, ProjectionParams, TrackedShipment};
pub use status::{derive_status, Status};
