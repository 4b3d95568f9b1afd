//! Current-user command handler

use crate::App;
use crate::clients::backend::ApiError;

pub async fn cmd_whoami(app: &App) -> anyhow::Result<()> {
    match app.session.fetch_current_user().await {
        Ok(user) => {
            println!("{} <{}>", user.name, user.email);
            println!(
                "  Role: {} | Admin level: {} | Device approved: {}",
                user.role,
                user.admin_level,
                if user.device_approved { "yes" } else { "no" }
            );
            Ok(())
        }
        Err(ApiError::NotLoggedIn) => {
            println!("Not logged in. Run: aquadesk login <email>");
            Ok(())
        }
        Err(ApiError::Unauthorized) => {
            println!("Your session is no longer valid; you have been logged out.");
            println!("Run: aquadesk login <email>");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
