mod dashboard;
mod devices;
mod init;
mod login;
mod logout;
mod whoami;

pub use dashboard::cmd_dashboard;
pub use devices::cmd_devices;
pub use init::cmd_init;
pub use login::cmd_login;
pub use logout::cmd_logout;
pub use whoami::cmd_whoami;
