//! Device-approval types.
//!
//! A restricted-role login from an unrecognized browser/terminal is held
//! until an admin approves the device; these types carry the pending
//! state on the client and the admin-visible request list.

use serde::{Deserialize, Serialize};

/// A login attempt blocked because this device is not yet authorized
/// for the account. Replaced on every new login attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PendingDeviceApproval {
    #[serde(default, alias = "ipAddress", alias = "ip_address")]
    pub ip: String,

    #[serde(default, alias = "userAgent")]
    pub user_agent: String,

    #[serde(default)]
    pub message: String,

    #[serde(default, alias = "requestId")]
    pub request_id: Option<String>,

    #[serde(default, alias = "emailSent")]
    pub email_sent: bool,
}

/// A pending approval entry as listed for admins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceRequest {
    #[serde(alias = "_id", alias = "requestId")]
    pub id: String,

    #[serde(default, alias = "userEmail", alias = "user_email")]
    pub user: String,

    #[serde(default, alias = "ipAddress", alias = "ip_address")]
    pub ip: String,

    #[serde(default, alias = "userAgent")]
    pub user_agent: String,

    #[serde(default, alias = "createdAt")]
    pub created_at: String,
}

/// Per-user roll-up of already-approved devices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceSummaryEntry {
    #[serde(default, alias = "userEmail", alias = "user_email")]
    pub user: String,

    #[serde(default, alias = "deviceCount", alias = "device_count")]
    pub approved_devices: u32,

    #[serde(default, alias = "lastSeen")]
    pub last_seen: Option<String>,
}
