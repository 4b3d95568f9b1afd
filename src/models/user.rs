//! The authenticated user profile as the rest of the crate sees it.
//!
//! Field-name variance from the backend is absorbed here with serde
//! aliases; nothing outside the API boundary reads raw payload keys.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(alias = "_id", alias = "userId")]
    pub id: String,

    #[serde(default, alias = "fullName", alias = "full_name")]
    pub name: String,

    pub email: String,

    #[serde(default)]
    pub role: String,

    #[serde(default, alias = "adminLevel")]
    pub admin_level: i32,

    #[serde(default, alias = "deviceApproved")]
    pub device_approved: bool,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin") || self.admin_level > 0
    }
}
