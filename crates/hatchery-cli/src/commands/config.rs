//! `hatchery config show` and `hatchery config paths`.

use std::path::Path;

use anyhow::{Context, Result};
use hatchery_config::{ResolvedConfig, ShowFormat, env};

use crate::theme::Theme;

/// Print the merged configuration, each field tagged with the layer that set it.
pub(crate) fn show_config(resolved: &ResolvedConfig, format: &str) -> Result<()> {
    let format = if format.eq_ignore_ascii_case("json") {
        ShowFormat::Json
    } else {
        ShowFormat::Toml
    };

    let rendered = resolved
        .show(format)
        .context("cannot render resolved configuration")?;
    println!("{rendered}");
    Ok(())
}

/// List the config files consulted, lowest precedence first, and the env fallbacks.
pub(crate) fn show_paths() {
    let home = directories::BaseDirs::new().map(|d| d.home_dir().display().to_string());
    let cwd = std::env::current_dir()
        .ok()
        .map(|p| p.display().to_string());

    println!("{}", Theme::header("Config layers (lowest precedence first)"));
    let candidates = ResolvedConfig::config_paths(home.as_deref(), cwd.as_deref());
    for (index, candidate) in candidates.iter().enumerate() {
        let marker = if Path::new(candidate).is_file() {
            "present"
        } else {
            "absent"
        };
        println!(
            "  {}. {candidate} {}",
            index.saturating_add(1),
            Theme::dimmed(&format!("({marker})"))
        );
    }

    println!("\n{}", Theme::header("Environment fallbacks"));
    for var in env::supported_vars() {
        println!("  {var}");
    }
}
