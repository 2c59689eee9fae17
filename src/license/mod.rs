//! Acknowledgements side-manifest reconciliation.
//!
//! Every build group's output carries an acknowledgements list of the form
//! `[header, *entries, footer]`. Across repeated partial rebuilds those
//! lists are merged into one persisted side-manifest: fresh entries win over
//! previous ones, duplicates collapse, entries are sorted by title,
//! skip-listed titles are dropped, and entries for pods no longer present in
//! the dependency graph are garbage-collected. The merge is idempotent and
//! bounded.
//!
//! Header and footer are sentinel records that must not carry a license
//! value; a sentinel with one indicates corrupted upstream data and aborts
//! the run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use crate::core::PodbuildError;
use crate::utils::fs::safe_write;

/// One acknowledgement record: a pod's license text, or a header/footer
/// sentinel (which has no `license` value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseEntry {
    pub title: String,
    #[serde(default)]
    pub footer_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

impl LicenseEntry {
    /// Default header sentinel, used when a build emitted no
    /// acknowledgements list of its own.
    pub fn header() -> Self {
        Self {
            title: "Acknowledgements".to_string(),
            footer_text: "This application makes use of the following third party libraries:"
                .to_string(),
            license: None,
        }
    }

    /// Default footer sentinel.
    pub fn footer() -> Self {
        Self {
            title: String::new(),
            footer_text: "Generated by podbuild".to_string(),
            license: None,
        }
    }
}

/// Split a `[header, *entries, footer]` list into its parts, checking the
/// sentinel invariant.
///
/// An empty list yields default sentinels and no entries so reconciliation
/// (and its garbage collection) still runs for builds that emitted nothing.
fn split_sentinels(
    mut list: Vec<LicenseEntry>,
) -> Result<(LicenseEntry, Vec<LicenseEntry>, LicenseEntry), PodbuildError> {
    if list.is_empty() {
        return Ok((LicenseEntry::header(), Vec::new(), LicenseEntry::footer()));
    }
    if list.len() < 2 {
        return Err(PodbuildError::MalformedSideManifest {
            reason: "expected both a header and a footer sentinel".to_string(),
        });
    }

    let footer = list.pop().expect("len checked above");
    let header = list.remove(0);

    if header.license.is_some() {
        return Err(PodbuildError::MalformedSideManifest {
            reason: "unexpected license found in header".to_string(),
        });
    }
    if footer.license.is_some() {
        return Err(PodbuildError::MalformedSideManifest {
            reason: "unexpected license found in footer".to_string(),
        });
    }

    Ok((header, list, footer))
}

/// Merge this run's freshly collected acknowledgements with the previously
/// persisted side-manifest.
///
/// `fresh` is the concatenation of every build group's list;
/// `buildable_roots` is the set of currently-known buildable root names used
/// for garbage collection; `skip_titles` is the configured skip-list.
pub fn reconcile(
    fresh: Vec<LicenseEntry>,
    previous: Option<Vec<LicenseEntry>>,
    buildable_roots: &BTreeSet<String>,
    skip_titles: &[String],
) -> Result<Vec<LicenseEntry>, PodbuildError> {
    let (header, fresh_entries, footer) = split_sentinels(fresh)?;

    let mut previous_entries = match previous {
        Some(mut list) if list.len() >= 2 => {
            // drop the persisted sentinels, keeping only the entries
            list.pop();
            list.remove(0);
            list
        }
        _ => Vec::new(),
    };

    // fresh entries win over previously persisted ones
    let fresh_titles: HashSet<&str> = fresh_entries.iter().map(|e| e.title.as_str()).collect();
    previous_entries.retain(|entry| !fresh_titles.contains(entry.title.as_str()));

    let mut merged = fresh_entries;
    merged.extend(previous_entries);

    let mut seen = HashSet::new();
    merged.retain(|entry| seen.insert(entry.title.clone()));
    merged.sort_by(|a, b| a.title.cmp(&b.title));
    merged.retain(|entry| !skip_titles.contains(&entry.title));
    merged.retain(|entry| buildable_roots.contains(&entry.title));

    let mut result = Vec::with_capacity(merged.len() + 2);
    result.push(header);
    result.extend(merged);
    result.push(footer);
    Ok(result)
}

/// Load the persisted side-manifest, if present.
pub fn load(path: &Path) -> Result<Option<Vec<LicenseEntry>>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read acknowledgements: {}", path.display()))?;
    let list = serde_json::from_str(&content)
        .with_context(|| format!("Invalid acknowledgements JSON: {}", path.display()))?;
    Ok(Some(list))
}

/// Persist the side-manifest atomically.
pub fn save(path: &Path, list: &[LicenseEntry]) -> Result<()> {
    let content = serde_json::to_string_pretty(list)?;
    safe_write(path, &content)
}

/// Render the side-manifest as markdown: the header as the document title,
/// one section per entry.
pub fn render_markdown(list: &[LicenseEntry]) -> String {
    let mut lines = Vec::new();
    let mut entries = list.iter();

    if let Some(header) = entries.next() {
        lines.push(format!("# {}", header.title));
        lines.push(header.footer_text.clone());
        lines.push(String::new());
    }

    let body: Vec<&LicenseEntry> = entries.collect();
    // the footer sentinel is not rendered
    for entry in body.iter().take(body.len().saturating_sub(1)) {
        lines.push(format!("## {}", entry.title));
        lines.push(entry.footer_text.clone());
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str) -> LicenseEntry {
        LicenseEntry {
            title: title.to_string(),
            footer_text: format!("{title} license text"),
            license: Some("MIT".to_string()),
        }
    }

    fn triple(titles: &[&str]) -> Vec<LicenseEntry> {
        let mut list = vec![LicenseEntry::header()];
        list.extend(titles.iter().map(|t| entry(t)));
        list.push(LicenseEntry::footer());
        list
    }

    fn roots(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn merges_and_sorts_by_title() {
        let merged = reconcile(triple(&["B", "A"]), None, &roots(&["A", "B"]), &[]).unwrap();
        let titles: Vec<&str> = merged.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Acknowledgements", "A", "B", ""]);
    }

    #[test]
    fn fresh_entries_win_over_previous() {
        let mut previous_a = entry("A");
        previous_a.footer_text = "stale text".to_string();
        let previous = vec![LicenseEntry::header(), previous_a, LicenseEntry::footer()];

        let merged = reconcile(triple(&["A"]), Some(previous), &roots(&["A"]), &[]).unwrap();
        assert_eq!(merged[1].footer_text, "A license text");
    }

    #[test]
    fn previous_entries_survive_a_partial_rebuild() {
        let previous = triple(&["Untouched"]);
        let merged = reconcile(
            triple(&["Rebuilt"]),
            Some(previous),
            &roots(&["Rebuilt", "Untouched"]),
            &[],
        )
        .unwrap();
        let titles: Vec<&str> = merged.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Acknowledgements", "Rebuilt", "Untouched", ""]);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let fresh = triple(&["B", "A"]);
        let once = reconcile(fresh.clone(), None, &roots(&["A", "B"]), &[]).unwrap();
        let twice = reconcile(fresh, Some(once.clone()), &roots(&["A", "B"]), &[]).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn skip_listed_titles_never_appear() {
        let merged = reconcile(
            triple(&["A", "B"]),
            None,
            &roots(&["A", "B"]),
            &["B".to_string()],
        )
        .unwrap();
        assert!(merged.iter().all(|e| e.title != "B"));
    }

    #[test]
    fn entries_for_removed_pods_are_garbage_collected() {
        let previous = triple(&["Gone"]);
        let merged = reconcile(triple(&["A"]), Some(previous), &roots(&["A"]), &[]).unwrap();
        assert!(merged.iter().all(|e| e.title != "Gone"));
    }

    #[test]
    fn header_with_license_is_malformed() {
        let mut list = triple(&["A"]);
        list[0].license = Some("MIT".to_string());
        let err = reconcile(list, None, &roots(&["A"]), &[]).unwrap_err();
        assert!(matches!(err, PodbuildError::MalformedSideManifest { .. }));
    }

    #[test]
    fn footer_with_license_is_malformed() {
        let mut list = triple(&["A"]);
        let last = list.len() - 1;
        list[last].license = Some("MIT".to_string());
        let err = reconcile(list, None, &roots(&["A"]), &[]).unwrap_err();
        assert!(matches!(err, PodbuildError::MalformedSideManifest { .. }));
    }

    #[test]
    fn empty_fresh_input_still_garbage_collects() {
        let previous = triple(&["Gone", "Kept"]);
        let merged = reconcile(Vec::new(), Some(previous), &roots(&["Kept"]), &[]).unwrap();
        let titles: Vec<&str> = merged.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Acknowledgements", "Kept", ""]);
    }

    #[test]
    fn markdown_renders_header_and_sections() {
        let merged = reconcile(triple(&["A"]), None, &roots(&["A"]), &[]).unwrap();
        let markdown = render_markdown(&merged);
        assert!(markdown.starts_with("# Acknowledgements"));
        assert!(markdown.contains("## A"));
        assert!(markdown.contains("A license text"));
        assert!(!markdown.contains("Generated by podbuild"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acknowledgements.json");
        let list = triple(&["A"]);
        save(&path, &list).unwrap();
        assert_eq!(load(&path).unwrap().unwrap(), list);
    }
}
