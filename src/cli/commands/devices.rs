//! Device-approval command handlers (admin)

use crate::App;
use crate::cli::DeviceCommands;

pub async fn cmd_devices(app: &App, command: DeviceCommands) -> anyhow::Result<()> {
    match command {
        DeviceCommands::List => {
            let requests = app.devices.list().await?;
            if requests.is_empty() {
                println!("No pending device requests.");
                return Ok(());
            }

            println!("Pending device requests ({} total)", requests.len());
            println!("{:-<70}", "");
            for request in requests {
                println!("{}  {}", request.id, request.user);
                println!(
                    "  IP: {} | Device: {} | Requested: {}",
                    request.ip, request.user_agent, request.created_at
                );
            }
        }
        DeviceCommands::Approve { id } => {
            app.devices.approve(&id).await?;
            println!("Approved device request {id}.");
        }
        DeviceCommands::ApproveCode { code } => {
            app.devices.approve_by_code(&code).await?;
            println!("Device approved by code.");
        }
        DeviceCommands::Reject { id } => {
            app.devices.reject(&id).await?;
            println!("Rejected device request {id}.");
        }
        DeviceCommands::Summary => {
            let entries = app.devices.summary().await?;
            if entries.is_empty() {
                println!("No approved devices.");
                return Ok(());
            }

            println!("{:<35} {:>8}  last seen", "user", "devices");
            for entry in entries {
                println!(
                    "{:<35} {:>8}  {}",
                    entry.user,
                    entry.approved_devices,
                    entry.last_seen.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}
