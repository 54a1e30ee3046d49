//! Run options for a metadata load.

use std::path::{Path, PathBuf};

pub const DEFAULT_DOMAIN: &str = "vnfilm_ticketing";
pub const DEFAULT_METADATA_ROOT: &str = "metadata/domains";

/// What to load and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Domain directory name under the metadata root.
    pub domain: String,

    /// Directory holding one sub-directory per domain.
    pub metadata_root: PathBuf,

    /// Delete the domain's existing nodes before loading.
    pub clear: bool,

    /// Load and map only; never touch the database.
    pub dry_run: bool,
}

impl LoadOptions {
    /// Resolve a relative metadata root against `cwd`.
    pub fn resolve_root(mut self, cwd: &Path) -> Self {
        if self.metadata_root.is_relative() {
            self.metadata_root = cwd.join(&self.metadata_root);
        }
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            metadata_root: PathBuf::from(DEFAULT_METADATA_ROOT),
            clear: false,
            dry_run: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = LoadOptions::default();
        assert_eq!(opts.domain, "vnfilm_ticketing");
        assert_eq!(opts.metadata_root, PathBuf::from("metadata/domains"));
        assert!(!opts.clear);
        assert!(!opts.dry_run);
    }

    #[test]
    fn test_resolve_relative_root() {
        let opts = LoadOptions::default().resolve_root(Path::new("/srv/catalog"));
        assert_eq!(
            opts.metadata_root,
            PathBuf::from("/srv/catalog/metadata/domains")
        );
    }

    #[test]
    fn test_absolute_root_untouched() {
        let opts = LoadOptions {
            metadata_root: PathBuf::from("/data/meta"),
            ..Default::default()
        }
        .resolve_root(Path::new("/srv/catalog"));
        assert_eq!(opts.metadata_root, PathBuf::from("/data/meta"));
    }
}
