//! About command

use anyhow::Result;
use pluginctl_manager::PluginManager;

pub fn run() -> Result<()> {
    println!("{}", PluginManager::about());
    Ok(())
}
