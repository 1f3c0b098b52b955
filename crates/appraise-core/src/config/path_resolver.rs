use std::path::{Component, Path, PathBuf};

/// Resolves relative paths found in a config file against that file's directory.
#[derive(Clone, Debug)]
pub struct PathResolver {
    base_dir: PathBuf,
}

impl PathResolver {
    pub fn new(config_path: &Path) -> Self {
        let base_dir = config_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();
        Self { base_dir }
    }

    /// Absolute and blank values are returned unchanged.
    pub fn resolve(&self, raw: &str) -> String {
        if raw.trim().is_empty() {
            return raw.to_string();
        }
        let p = Path::new(raw);
        if p.is_absolute() {
            return raw.to_string();
        }
        self.join_clean(p).to_string_lossy().to_string()
    }

    pub fn resolve_in_place(&self, s: &mut String) {
        *s = self.resolve(s);
    }

    pub fn resolve_opt(&self, p: &mut Option<String>) {
        if let Some(s) = p.as_mut() {
            self.resolve_in_place(s);
        }
    }

    fn join_clean(&self, rel: &Path) -> PathBuf {
        let mut out = PathBuf::new();
        for c in self.base_dir.join(rel).components() {
            match c {
                Component::CurDir => {}
                Component::ParentDir => {
                    out.pop();
                }
                Component::RootDir | Component::Prefix(_) | Component::Normal(_) => {
                    out.push(c.as_os_str())
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_store_joins_config_dir() {
        let r = PathResolver::new(Path::new("/srv/appraise/appraise.yaml"));
        assert_eq!(r.resolve("data/evals.db"), "/srv/appraise/data/evals.db");
        assert_eq!(r.resolve("./evals.db"), "/srv/appraise/evals.db");
        assert_eq!(r.resolve("../shared/catalog.yaml"), "/srv/shared/catalog.yaml");
    }

    #[test]
    fn test_absolute_and_blank_untouched() {
        let r = PathResolver::new(Path::new("/srv/appraise/appraise.yaml"));
        assert_eq!(r.resolve("/var/lib/evals.db"), "/var/lib/evals.db");
        assert_eq!(r.resolve("  "), "  ");

        let mut none: Option<String> = None;
        r.resolve_opt(&mut none);
        assert!(none.is_none());
    }
}
