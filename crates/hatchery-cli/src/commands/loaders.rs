//! `hatchery loaders`: show the extension table.

use std::path::Path;

use anyhow::Result;
use hatchery_config::Config;

use crate::config_bridge::build_manager;
use crate::theme::Theme;

/// Print every bound extension with the loader type serving it.
pub(crate) fn list_loaders(cfg: &Config, cwd: &Path) -> Result<()> {
    let manager = build_manager(cfg, cwd)?;
    let registry = manager.registry();

    println!("{}", Theme::header("Registered loaders"));
    for ext in registry.extensions() {
        let kind = registry
            .kind_for(ext.as_str())
            .map_or("<unbound>", |kind| kind.short_name());
        println!("  .{:<12} {kind}", ext.as_str());
    }

    let ignored: Vec<String> = manager
        .dispatcher()
        .ignored()
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect();
    if !ignored.is_empty() {
        println!("\n{}", Theme::dimmed(&format!("Ignored: {}", ignored.join(", "))));
    }
    Ok(())
}
