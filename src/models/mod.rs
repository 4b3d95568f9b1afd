pub mod device;
pub mod finance;
pub mod user;

pub use device::{DeviceRequest, DeviceSummaryEntry, PendingDeviceApproval};
pub use finance::{CogsSoldSummary, DailyFinancialRow, Totals, Trend};
pub use user::User;
