//! `hatchery scan`: load every plugin in a directory and report.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use hatchery_config::Config;
use hatchery_plugins::{IgnoredExtensions, ScanReport};
use tracing::info;

use crate::config_bridge::build_manager;
use crate::theme::Theme;

/// Load the plugin directory and print what happened.
///
/// `dir` overrides `plugins.directory`; relative paths resolve against `cwd`.
/// Fails when any claimed artifact did not load.
pub(crate) fn run_scan(cfg: &Config, cwd: &Path, dir: Option<PathBuf>) -> Result<()> {
    let dir = dir.map_or_else(|| cfg.plugins.resolved_directory(cwd), |d| cwd.join(d));
    let manager = build_manager(cfg, cwd)?;

    info!(dir = %dir.display(), host = %manager.host().working_dir().display(), "Scanning plugin directory");
    let report = manager.load_plugins(&dir)?;
    print_report(&dir, &report, manager.dispatcher().ignored());

    let failed = report.failed.len();
    for plugin in &report.loaded {
        let _ = manager.unload_plugin(plugin.name());
    }
    if failed > 0 {
        bail!("{failed} plugin(s) failed to load");
    }
    Ok(())
}

fn print_report(dir: &Path, report: &ScanReport, ignored: &IgnoredExtensions) {
    println!("{}", Theme::header(&format!("Plugins in {}", dir.display())));

    for plugin in &report.loaded {
        println!(
            "  {}  {}",
            Theme::success(plugin.name()),
            Theme::dimmed(&plugin.storage_dir().display().to_string())
        );
    }
    for failure in &report.failed {
        println!(
            "  {}",
            Theme::error(&format!("{}: {}", failure.path.display(), failure.error))
        );
    }
    for path in &report.skipped {
        println!("  {}", unclaimed_line(path, ignored));
    }

    println!(
        "\n{} loaded, {} skipped, {} failed",
        report.loaded.len(),
        report.skipped.len(),
        report.failed.len()
    );
}

/// Ignorable paths went by silently; the rest raised a warning.
fn unclaimed_line(path: &Path, ignored: &IgnoredExtensions) -> String {
    let shown = path.display().to_string();
    if ignored.is_ignored(path) {
        Theme::skipped(&shown)
    } else {
        Theme::unclaimed(&shown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_succeeds_on_valid_manifests() {
        let tmp = tempfile::tempdir().unwrap();
        let plugins = tmp.path().join("plugins");
        std::fs::create_dir_all(&plugins).unwrap();
        std::fs::write(plugins.join("greeter.toml"), "[plugin]\nversion = \"1.0.0\"\n").unwrap();
        std::fs::write(plugins.join("lib.jar"), "").unwrap();

        run_scan(&Config::default(), tmp.path(), None).unwrap();
        assert!(tmp.path().join("plugins").join("greeter").is_dir());
    }

    #[test]
    fn scan_fails_on_broken_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let plugins = tmp.path().join("ext");
        std::fs::create_dir_all(&plugins).unwrap();
        std::fs::write(plugins.join("broken.toml"), "name = [").unwrap();

        let err = run_scan(&Config::default(), tmp.path(), Some("ext".into())).unwrap_err();
        assert!(err.to_string().contains("1 plugin(s) failed"));
    }

    #[test]
    fn unclaimed_paths_are_labelled_by_ignorability() {
        let ignored = IgnoredExtensions::default();
        let jar = unclaimed_line(Path::new("p/lib.jar"), &ignored);
        let txt = unclaimed_line(Path::new("p/notes.txt"), &ignored);
        let readme = unclaimed_line(Path::new("p/README"), &ignored);

        assert!(jar.contains("skipped") && jar.contains("lib.jar"));
        assert!(!jar.contains("no loader"));
        assert!(txt.contains("no loader") && txt.contains("notes.txt"));
        assert!(readme.contains("no loader"));
    }

    #[test]
    fn scan_fails_on_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(run_scan(&Config::default(), tmp.path(), Some("nope".into())).is_err());
    }
}
