use std::path::{Path, PathBuf};

/// Maps dotted module references to source files.
///
/// Resolution is purely lexical: dots become path separators, the source
/// extension is appended, and the first existing candidate wins; the
/// importing file's directory is checked first, then the configured
/// search roots in order. A match inside a vendored tree is treated as
/// unresolved so the analysis never descends into library code.
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    base_dir: PathBuf,
    search_roots: Vec<PathBuf>,
    vendor_markers: Vec<String>,
    extension: String,
}

impl ModuleResolver {
    pub fn new(
        base_dir: &Path,
        search_roots: &[PathBuf],
        vendor_markers: &[String],
        extension: &str,
    ) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            search_roots: search_roots.to_vec(),
            vendor_markers: vendor_markers.to_vec(),
            extension: extension.to_string(),
        }
    }

    /// Resolve a dotted module reference to a file path, or None
    pub fn resolve(&self, module: &str) -> Option<PathBuf> {
        if module.is_empty() {
            return None;
        }

        let mut relative = PathBuf::new();
        for part in module.split('.') {
            relative.push(part);
        }
        let relative = relative.with_extension(&self.extension);

        let candidate = self.base_dir.join(&relative);
        if candidate.is_file() {
            return self.admit(candidate);
        }

        for root in &self.search_roots {
            let candidate = root.join(&relative);
            if candidate.is_file() {
                return self.admit(candidate);
            }
        }

        None
    }

    /// The first existing match decides; a vendored one is a miss
    fn admit(&self, path: PathBuf) -> Option<PathBuf> {
        if self.is_vendored(&path) {
            None
        } else {
            Some(path)
        }
    }

    fn is_vendored(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        self.vendor_markers.iter().any(|marker| text.contains(marker.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(base: &Path, roots: &[PathBuf]) -> ModuleResolver {
        ModuleResolver::new(
            base,
            roots,
            &["site-packages".to_string(), "dist-packages".to_string()],
            "py",
        )
    }

    #[test]
    fn test_dotted_module_maps_to_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("pkg");
        std::fs::create_dir(&pkg).unwrap();
        std::fs::write(pkg.join("mod.py"), "x = 1\n").unwrap();

        let resolved = resolver(dir.path(), &[]).resolve("pkg.mod");
        assert_eq!(resolved, Some(pkg.join("mod.py")));
    }

    #[test]
    fn test_base_directory_wins_over_search_roots() {
        let base = tempfile::tempdir().unwrap();
        let extra = tempfile::tempdir().unwrap();
        std::fs::write(base.path().join("util.py"), "a = 1\n").unwrap();
        std::fs::write(extra.path().join("util.py"), "b = 2\n").unwrap();

        let resolved =
            resolver(base.path(), &[extra.path().to_path_buf()]).resolve("util");
        assert_eq!(resolved, Some(base.path().join("util.py")));
    }

    #[test]
    fn test_search_roots_consulted_in_order() {
        let base = tempfile::tempdir().unwrap();
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("only.py"), "x = 1\n").unwrap();

        let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let resolved = resolver(base.path(), &roots).resolve("only");
        assert_eq!(resolved, Some(second.path().join("only.py")));
    }

    #[test]
    fn test_vendored_match_is_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let vendored = dir.path().join("site-packages");
        std::fs::create_dir(&vendored).unwrap();
        std::fs::write(vendored.join("requests.py"), "x = 1\n").unwrap();

        let resolved = resolver(dir.path(), &[vendored]).resolve("requests");
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_missing_module_is_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolver(dir.path(), &[]).resolve("ghost"), None);
    }
}
