//! Logout command handler

use crate::App;

pub async fn cmd_logout(app: &App) -> anyhow::Result<()> {
    if !app.session.is_logged_in().await {
        println!("Not logged in.");
        return Ok(());
    }

    app.session.logout().await;
    println!("Logged out.");
    Ok(())
}
