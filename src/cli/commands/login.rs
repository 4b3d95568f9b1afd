//! Login command handler

use std::io::Write;

use crate::App;
use crate::clients::backend::ApiError;
use crate::session::LoginOutcome;

pub async fn cmd_login(app: &App, email: &str, password: Option<String>) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };

    match app.session.login(email, &password).await {
        Ok(LoginOutcome::Success { user }) => {
            let name = if user.name.is_empty() { &user.email } else { &user.name };
            println!("Logged in as {} [{}]", name, user.role);
            if !user.device_approved {
                println!("Note: this device is provisionally approved for your role.");
            }
            Ok(())
        }
        Ok(LoginOutcome::DevicePending(pending)) => {
            println!("This device is not yet approved for your account.");
            println!("An administrator has to approve it before you can log in.");
            println!();
            println!("  IP:         {}", pending.ip);
            println!("  Device:     {}", pending.user_agent);
            if let Some(id) = &pending.request_id {
                println!("  Request id: {id}");
            }
            if pending.email_sent {
                println!();
                println!("An approval code was emailed to the account owner;");
                println!("an admin can apply it with: aquadesk devices approve-code <code>");
            }
            Ok(())
        }
        Err(ApiError::Rejected { message, .. }) => {
            // Wrong credentials / validation failure: retype and retry.
            anyhow::bail!("Login failed: {message}")
        }
        Err(e) => Err(e.into()),
    }
}

fn prompt_password() -> anyhow::Result<String> {
    print!("Password: ");
    std::io::stdout().flush()?;

    let mut password = String::new();
    std::io::stdin().read_line(&mut password)?;
    Ok(password.trim_end_matches(['\r', '\n']).to_string())
}
