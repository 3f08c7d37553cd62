pub mod dashboard_service;
pub mod deletion_service;
pub mod shipment_service;

pub use dashboard_service::{DashboardService, DashboardView};
pub use deletion_service::DeletionService;
pub use shipment_service::ShipmentService;
