//! Info command

use anyhow::Result;

use super::Context;
use crate::cli::InfoArgs;
use crate::output;

pub fn run(args: InfoArgs, ctx: &Context) -> Result<()> {
    let manager = ctx.open_manager()?;
    let info = manager.info();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    output::header(&format!("pluginctl {}", info.version));
    output::kv("Config home", &info.home.display().to_string());
    output::kv("Plugins", &info.plugins_dir.display().to_string());
    output::kv("Repositories file", &info.registry_path.display().to_string());
    output::kv("Index file", &info.index_path.display().to_string());
    output::kv("Edition", &info.edition);
    output::kv("Entry module", &info.entry_module);
    output::kv("Registered repositories", &info.repositories.to_string());
    output::kv("Installed plugins", &info.installed.to_string());
    Ok(())
}
