//! The `build` subcommand.
//!
//! Orchestrates one full run: resolve the graph, validate and plan, run the
//! external build per group, then — only after every group succeeded —
//! reconcile and atomically write the restorable manifest, the
//! acknowledgements side-manifest and the prebuilt index. A failure in any
//! group leaves every persisted file exactly as it was before the run.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

use crate::builder::{BuildExecutor, DescriptorRenderer, PodfileRenderer, ProcessBuildExecutor};
use crate::config::PodbuildConfig;
use crate::constants::{
    ACKNOWLEDGEMENTS_FILE, ACKNOWLEDGEMENTS_MARKDOWN_FILE, PODBUILD_DIR, PREBUILT_INDEX_FILE,
    RESTORE_MANIFEST_FILE,
};
use crate::license::{self, LicenseEntry};
use crate::manifest::{self, PrebuiltIndex, RestorableManifest};
use crate::pod::{self, DependencyItem};
use crate::resolver;
use crate::source::{FileGraphSource, GraphSource};
use crate::utils::fs::safe_write;

#[derive(Args)]
pub struct BuildCommand {
    /// Pod names to prebuild, or `*` for every buildable pod.
    #[arg(required = true, value_name = "POD")]
    pub pods: Vec<String>,

    /// Re-run the external resolver before planning.
    #[arg(long)]
    pub update_sources: bool,

    /// Skip updating the prebuilt index after a successful build.
    #[arg(long)]
    pub skip_prebuilt_update: bool,
}

impl BuildCommand {
    /// Execute with the default collaborators.
    pub fn execute(self, project_root: &Path) -> Result<()> {
        let config = PodbuildConfig::load(project_root)?;
        let source = FileGraphSource::new(config.resolve_command.clone());
        let executor = ProcessBuildExecutor::new(project_root, &config);
        self.run(project_root, &config, &source, &PodfileRenderer, &executor)
    }

    /// Execute with injected collaborators. Split out so tests can stub the
    /// resolver and the external build.
    pub fn run(
        &self,
        project_root: &Path,
        config: &PodbuildConfig,
        source: &dyn GraphSource,
        renderer: &dyn DescriptorRenderer,
        executor: &dyn BuildExecutor,
    ) -> Result<()> {
        let graph = source.resolve(project_root, self.update_sources)?;
        let buildable = graph.buildable_items();

        let Some(requested) = self.requested_roots(&buildable, &graph.items) else {
            println!("{}", "No pods to build, everything requested is prebuilt".yellow());
            return Ok(());
        };

        let plan = resolver::plan(&requested, &buildable, config)?;
        info!(
            groups = plan.groups.len(),
            pods = plan.updated.len(),
            "build plan resolved"
        );

        let mut collected: Vec<LicenseEntry> = Vec::new();
        for group in &plan.groups {
            info!(
                variant = %group.variant,
                pods = %group
                    .names()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                "building group"
            );
            let descriptor = renderer.render(group, &graph, config)?;
            collected.extend(executor.build(&descriptor, group.variant)?);
        }

        // every group succeeded; only now touch the persisted manifests
        self.write_manifests(project_root, config, &plan, &buildable, &graph, collected)?;

        println!("{}", "done!".green().bold());
        Ok(())
    }

    /// Expand `*`, deduplicate, and drop requests for pods that are already
    /// prebuilt. Returns `None` when nothing buildable remains.
    fn requested_roots(
        &self,
        buildable: &[DependencyItem],
        all_items: &[DependencyItem],
    ) -> Option<Vec<String>> {
        let buildable_roots = pod::root_names(buildable);

        let mut requested: Vec<String> = if self.pods.iter().any(|p| p == "*") {
            buildable_roots.clone()
        } else {
            let mut seen = std::collections::HashSet::new();
            self.pods
                .iter()
                .filter(|name| seen.insert((*name).clone()))
                .cloned()
                .collect()
        };

        requested.retain(|name| {
            if buildable_roots.contains(name) {
                return true;
            }
            let prebuilt_only = all_items.iter().any(|item| item.root() == name);
            if prebuilt_only {
                println!("{}", format!("'{name}' is already prebuilt, skipping").yellow());
                false
            } else {
                // unknown names stay in so validation reports them
                true
            }
        });

        if requested.is_empty() { None } else { Some(requested) }
    }

    fn write_manifests(
        &self,
        project_root: &Path,
        config: &PodbuildConfig,
        plan: &resolver::BuildPlan,
        buildable: &[DependencyItem],
        graph: &crate::source::ResolvedGraph,
        collected: Vec<LicenseEntry>,
    ) -> Result<()> {
        let restore_path = project_root.join(RESTORE_MANIFEST_FILE);
        let previous = RestorableManifest::load(&restore_path)?;
        let reconciled = manifest::reconcile(&plan.updated, buildable, previous.as_ref(), graph);
        reconciled.save(&restore_path)?;
        debug!(path = %restore_path.display(), "restorable manifest written");

        let ack_path = project_root.join(ACKNOWLEDGEMENTS_FILE);
        let previous_acks = license::load(&ack_path)?;
        let buildable_roots: BTreeSet<String> = pod::root_names(buildable).into_iter().collect();
        let merged = license::reconcile(
            collected,
            previous_acks,
            &buildable_roots,
            &config.skip_licenses,
        )?;
        license::save(&ack_path, &merged)?;
        safe_write(
            &project_root.join(ACKNOWLEDGEMENTS_MARKDOWN_FILE),
            &license::render_markdown(&merged),
        )?;
        debug!(path = %ack_path.display(), "acknowledgements written");

        if !self.skip_prebuilt_update {
            let index_path = project_root.join(PODBUILD_DIR).join(PREBUILT_INDEX_FILE);
            PrebuiltIndex::from_items(&plan.built_items()).save(&index_path)?;
            debug!(path = %index_path.display(), "prebuilt index written");
        }
        Ok(())
    }
}
