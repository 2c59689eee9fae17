//! End-to-end runs of the `build` pipeline with a stubbed external build.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

use podbuild_cli::builder::{BuildExecutor, PodfileRenderer};
use podbuild_cli::cli::BuildCommand;
use podbuild_cli::config::PodbuildConfig;
use podbuild_cli::constants::{
    ACKNOWLEDGEMENTS_FILE, PODBUILD_DIR, PREBUILT_INDEX_FILE, RESOLVED_GRAPH_FILE,
    RESTORE_MANIFEST_FILE,
};
use podbuild_cli::license::{self, LicenseEntry};
use podbuild_cli::manifest::{RestorableManifest, RestoreEntry};
use podbuild_cli::pod::{BuildVariant, PodName};
use podbuild_cli::source::FileGraphSource;

/// Stub executor recording every descriptor and returning a canned
/// acknowledgements list per build.
#[derive(Default)]
struct StubExecutor {
    descriptors: RefCell<Vec<String>>,
    acknowledgements: Vec<LicenseEntry>,
    fail: bool,
}

impl StubExecutor {
    fn with_acknowledgements(titles: &[&str]) -> Self {
        let mut list = vec![LicenseEntry::header()];
        list.extend(titles.iter().map(|title| LicenseEntry {
            title: (*title).to_string(),
            footer_text: format!("{title} license"),
            license: Some("MIT".to_string()),
        }));
        list.push(LicenseEntry::footer());
        Self {
            acknowledgements: list,
            ..Default::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

impl BuildExecutor for StubExecutor {
    fn build(&self, descriptor: &str, variant: BuildVariant) -> Result<Vec<LicenseEntry>> {
        if self.fail {
            anyhow::bail!("stub build failed for the {variant} group");
        }
        self.descriptors.borrow_mut().push(descriptor.to_string());
        Ok(self.acknowledgements.clone())
    }
}

fn run_build(project_root: &Path, pods: &[&str], executor: &dyn BuildExecutor) -> Result<()> {
    let command = BuildCommand {
        pods: pods.iter().map(|p| (*p).to_string()).collect(),
        update_sources: false,
        skip_prebuilt_update: false,
    };
    command.run(
        project_root,
        &PodbuildConfig::default(),
        &FileGraphSource::new(None),
        &PodfileRenderer,
        executor,
    )
}

fn write_graph(project_root: &Path, graph: serde_json::Value) {
    let dir = project_root.join(PODBUILD_DIR);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(RESOLVED_GRAPH_FILE), graph.to_string()).unwrap();
}

fn two_root_graph() -> serde_json::Value {
    serde_json::json!({
        "items": [
            { "name": "P", "version": "2.0.0", "variant": "release" },
            { "name": "Q", "version": "2.0.0", "variant": "release" }
        ],
        "sources": ["https://cdn.cocoapods.org/"],
        "targets": ["Pods-App"],
        "pods_by_target": { "App": ["P", "Q"] }
    })
}

#[test]
fn partial_rebuild_preserves_untouched_family_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    write_graph(dir.path(), two_root_graph());

    // previous run pinned Q at 1.4.0; the live graph now reports 2.0.0
    let previous = RestorableManifest {
        targets: BTreeMap::from([(
            "App".to_string(),
            vec![RestoreEntry {
                name: PodName::parse("Q"),
                version: Some("1.4.0".to_string()),
                variant: BuildVariant::Release,
                static_framework: false,
                swift_version: None,
            }],
        )]),
    };
    previous
        .save(&dir.path().join(RESTORE_MANIFEST_FILE))
        .unwrap();

    let executor = StubExecutor::with_acknowledgements(&["P"]);
    run_build(dir.path(), &["P"], &executor).unwrap();

    let manifest = RestorableManifest::load(&dir.path().join(RESTORE_MANIFEST_FILE))
        .unwrap()
        .unwrap();
    let q = manifest.entry(&PodName::parse("Q")).unwrap();
    assert_eq!(q.version.as_deref(), Some("1.4.0"));
    let p = manifest.entry(&PodName::parse("P")).unwrap();
    assert_eq!(p.version.as_deref(), Some("2.0.0"));
}

#[test]
fn star_builds_one_group_per_variant() {
    let dir = tempfile::tempdir().unwrap();
    write_graph(
        dir.path(),
        serde_json::json!({
            "items": [
                { "name": "A", "variant": "debug" },
                { "name": "B", "variant": "release" },
                { "name": "C", "variant": "release" }
            ],
            "targets": ["Pods-App"],
            "pods_by_target": { "App": ["A", "B", "C"] }
        }),
    );

    let executor = StubExecutor::with_acknowledgements(&[]);
    run_build(dir.path(), &["*"], &executor).unwrap();

    let descriptors = executor.descriptors.borrow();
    assert_eq!(descriptors.len(), 2);
    assert!(descriptors[0].contains("build_configuration 'debug'"));
    assert!(descriptors[1].contains("build_configuration 'release'"));
}

#[test]
fn acknowledgements_are_merged_and_garbage_collected() {
    let dir = tempfile::tempdir().unwrap();
    write_graph(dir.path(), two_root_graph());

    // previous side-manifest holds an entry for a pod no longer in the graph
    let previous = vec![
        LicenseEntry::header(),
        LicenseEntry {
            title: "Gone".to_string(),
            footer_text: "old license".to_string(),
            license: Some("MIT".to_string()),
        },
        LicenseEntry {
            title: "Q".to_string(),
            footer_text: "Q license".to_string(),
            license: Some("MIT".to_string()),
        },
        LicenseEntry::footer(),
    ];
    license::save(&dir.path().join(ACKNOWLEDGEMENTS_FILE), &previous).unwrap();

    let executor = StubExecutor::with_acknowledgements(&["P"]);
    run_build(dir.path(), &["P"], &executor).unwrap();

    let merged = license::load(&dir.path().join(ACKNOWLEDGEMENTS_FILE))
        .unwrap()
        .unwrap();
    let titles: Vec<&str> = merged.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Acknowledgements", "P", "Q", ""]);

    let markdown =
        std::fs::read_to_string(dir.path().join("acknowledgements.md")).unwrap();
    assert!(markdown.starts_with("# Acknowledgements"));
    assert!(markdown.contains("## P"));
}

#[test]
fn prebuilt_index_records_built_pods() {
    let dir = tempfile::tempdir().unwrap();
    write_graph(dir.path(), two_root_graph());

    let executor = StubExecutor::with_acknowledgements(&["P"]);
    run_build(dir.path(), &["P"], &executor).unwrap();

    let index_path = dir.path().join(PODBUILD_DIR).join(PREBUILT_INDEX_FILE);
    let content = std::fs::read_to_string(index_path).unwrap();
    assert!(content.contains("name = \"P\""));
    assert!(!content.contains("name = \"Q\""));
}

#[test]
fn failed_build_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_graph(dir.path(), two_root_graph());

    let executor = StubExecutor::failing();
    assert!(run_build(dir.path(), &["P"], &executor).is_err());

    assert!(!dir.path().join(RESTORE_MANIFEST_FILE).exists());
    assert!(!dir.path().join(ACKNOWLEDGEMENTS_FILE).exists());
    assert!(
        !dir.path()
            .join(PODBUILD_DIR)
            .join(PREBUILT_INDEX_FILE)
            .exists()
    );
}

#[test]
fn prebuilt_only_request_is_a_successful_noop() {
    let dir = tempfile::tempdir().unwrap();
    write_graph(
        dir.path(),
        serde_json::json!({
            "items": [
                { "name": "Vendored", "prebuilt": true },
                { "name": "P" }
            ],
            "targets": ["Pods-App"],
            "pods_by_target": { "App": ["Vendored", "P"] }
        }),
    );

    let executor = StubExecutor::with_acknowledgements(&[]);
    run_build(dir.path(), &["Vendored"], &executor).unwrap();

    assert!(executor.descriptors.borrow().is_empty());
    assert!(!dir.path().join(RESTORE_MANIFEST_FILE).exists());
}

#[test]
fn conflicting_selection_fails_before_building() {
    let dir = tempfile::tempdir().unwrap();
    write_graph(
        dir.path(),
        serde_json::json!({
            "items": [
                { "name": "X", "dependencies": ["Z"] },
                { "name": "Y", "dependencies": ["Z"] },
                { "name": "Z" }
            ],
            "targets": ["Pods-App"],
            "pods_by_target": { "App": ["X", "Y", "Z"] }
        }),
    );

    let executor = StubExecutor::with_acknowledgements(&[]);
    let err = run_build(dir.path(), &["X"], &executor).unwrap_err();
    assert!(err.to_string().contains("common dependencies"));
    assert!(executor.descriptors.borrow().is_empty());
}

/// The descriptor reaching the executor keeps dependencies before their
/// dependents, including the ones closure expansion pulled in.
#[test]
fn descriptor_orders_dependencies_first() {
    let dir = tempfile::tempdir().unwrap();
    write_graph(
        dir.path(),
        serde_json::json!({
            "items": [
                { "name": "App", "dependencies": ["Net"] },
                { "name": "Net" }
            ],
            "targets": ["Pods-App"],
            "pods_by_target": { "App": ["App", "Net"] }
        }),
    );

    let executor = StubExecutor::with_acknowledgements(&[]);
    run_build(dir.path(), &["App"], &executor).unwrap();

    let descriptors = executor.descriptors.borrow();
    let descriptor = &descriptors[0];
    let net = descriptor.find("pod 'Net'").unwrap();
    let app = descriptor.find("pod 'App'").unwrap();
    assert!(net < app);
}
