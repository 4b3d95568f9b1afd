//! Create-default-config command handler

use crate::config::Config;

pub fn cmd_init() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("Created config.toml with defaults.");
        println!("Set [api] base_url to your POS backend before logging in.");
    } else {
        println!("config.toml already exists; leaving it alone.");
    }
    Ok(())
}
