//! `*.toml` descriptor loading end to end.

use hatchery_plugins::{ManifestLoader, PluginError};
use hatchery_test::PluginDirFixture;

#[test]
fn test_manifests_load_and_create_storage() {
    let fixture = PluginDirFixture::new();
    fixture.add_manifest(
        "greeter",
        "[plugin]\nversion = \"1.2.0\"\ndescription = \"Says hello\"\n",
    );
    fixture.add_manifest("renamed", "[plugin]\nname = \"indexer\"\n");
    fixture.add_file("archive.jar", "");

    let manager = fixture.manager();
    assert!(manager.register_loader::<ManifestLoader>());
    assert!(!manager.register_loader::<ManifestLoader>());

    let report = manager.load_plugins(&fixture.plugins_dir()).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.loaded_names(), vec!["greeter", "indexer"]);
    assert_eq!(report.skipped.len(), 1);

    let storage = fixture.working_dir().join("plugins");
    assert!(storage.join("greeter").is_dir());
    assert!(storage.join("indexer").is_dir());

    let mut names = manager.loader_for("toml").unwrap().loaded_plugins();
    names.sort();
    assert_eq!(names, vec!["greeter".to_owned(), "indexer".to_owned()]);

    let unloaded = manager.unload_plugin("indexer").unwrap();
    assert!(!unloaded.is_enabled());
}

#[test]
fn test_duplicate_and_malformed_manifests_fail_individually() {
    let fixture = PluginDirFixture::new();
    fixture.add_manifest("a", "[plugin]\nname = \"shared\"\n");
    let dup = fixture.add_manifest("b", "[plugin]\nname = \"shared\"\n");
    let bad = fixture.add_manifest("c", "[plugin]\ncolour = \"blue\"\n");
    let traversal = fixture.add_manifest("d", "[plugin]\nname = \"../escape\"\n");

    let manager = fixture.manager();
    assert!(manager.register_loader::<ManifestLoader>());

    let report = manager.load_plugins(&fixture.plugins_dir()).unwrap();
    assert_eq!(report.loaded_names(), vec!["shared"]);
    let failed: Vec<_> = report.failed.iter().map(|f| f.path.clone()).collect();
    assert_eq!(failed, vec![dup, bad, traversal]);
    assert!(
        report
            .failed
            .iter()
            .all(|f| matches!(f.error, PluginError::Load { .. }))
    );
    assert!(!fixture.working_dir().join("escape").exists());
}
