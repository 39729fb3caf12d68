//! Known-identity registry, loaded once at startup from a dataset
//! directory of per-person sample-image subfolders.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

/// Sample-image extensions counted per person (case-insensitive).
const SAMPLE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Mapping from person name to sample-image count. Read-only during a run;
/// names are held sorted so offset-based lookup is deterministic.
#[derive(Debug, Clone, Default)]
pub struct KnownIdentityRegistry {
    counts: BTreeMap<String, usize>,
    names: Vec<String>,
}

impl KnownIdentityRegistry {
    /// Load the registry from a directory of `<person>/<samples>` subfolders.
    /// A missing directory yields an empty registry (detection-only mode);
    /// persons with no usable samples are skipped.
    pub fn load(dir: &Path) -> io::Result<Self> {
        if !dir.exists() {
            tracing::info!(dir = %dir.display(), "no dataset directory; registry is empty");
            return Ok(Self::default());
        }

        let mut counts = BTreeMap::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let samples = count_samples(&entry.path())?;
            if samples == 0 {
                tracing::debug!(person = %name, "skipping person with no samples");
                continue;
            }
            tracing::info!(person = %name, samples, "loaded identity");
            counts.insert(name, samples);
        }

        Ok(Self::from_counts(counts))
    }

    /// Build a registry from in-memory entries. Names are sorted.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let counts = entries
            .into_iter()
            .map(|(name, count)| (name.into(), count))
            .collect();
        Self::from_counts(counts)
    }

    fn from_counts(counts: BTreeMap<String, usize>) -> Self {
        let names = counts.keys().cloned().collect();
        Self { counts, names }
    }

    /// Person names, sorted.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Sample-image count for a person.
    pub fn sample_count(&self, name: &str) -> Option<usize> {
        self.counts.get(name).copied()
    }

    /// Name selected by `offset mod len`. `None` when the registry is empty.
    pub fn name_for_offset(&self, offset: usize) -> Option<&str> {
        if self.names.is_empty() {
            return None;
        }
        Some(self.names[offset % self.names.len()].as_str())
    }
}

fn count_samples(dir: &Path) -> io::Result<usize> {
    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_sample = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                SAMPLE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false);
        if path.is_file() && is_sample {
            count += 1;
        }
    }
    Ok(count)
}
