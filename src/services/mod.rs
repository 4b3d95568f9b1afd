pub mod dashboard;
pub mod devices;
pub mod finance;

pub use dashboard::{DashboardService, DashboardSnapshot, DateRange};
pub use devices::DeviceService;
