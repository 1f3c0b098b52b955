//! Grading context: immutable lookup tables from category keys to the rubric
//! text injected into prompts.

use crate::errors::{EvalError, Result};
use crate::model::Example;
use crate::prompt::PromptTemplate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("catalog.yaml");

/// Key that selects "no section" for optional categories.
pub const NOT_APPLICABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    Award,
    Tier,
    Wing,
    Squadron,
}

impl CategoryKind {
    pub const ALL: [CategoryKind; 4] = [
        CategoryKind::Award,
        CategoryKind::Tier,
        CategoryKind::Wing,
        CategoryKind::Squadron,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Award => "award",
            CategoryKind::Tier => "tier",
            CategoryKind::Wing => "wing",
            CategoryKind::Squadron => "squadron",
        }
    }

    /// Award is the only category every prompt must carry.
    pub fn is_required(&self) -> bool {
        matches!(self, CategoryKind::Award)
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved category: the key the caller chose and its descriptive text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    pub text: String,
}

impl Category {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingContext {
    pub award: Category,
    pub tier: Option<Category>,
    pub wing_priorities: Option<Category>,
    pub squadron_priorities: Option<Category>,
}

/// Caller-supplied category keys. `None` and `"N/A"` both mean "omit".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextKeys {
    pub award: String,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub wing: Option<String>,
    #[serde(default)]
    pub squadron: Option<String>,
}

impl ContextKeys {
    /// Overlays any keys set in `overrides` on top of `self`.
    pub fn merged(&self, overrides: &ContextKeys) -> ContextKeys {
        ContextKeys {
            award: if overrides.award.trim().is_empty() {
                self.award.clone()
            } else {
                overrides.award.clone()
            },
            tier: overrides.tier.clone().or_else(|| self.tier.clone()),
            wing: overrides.wing.clone().or_else(|| self.wing.clone()),
            squadron: overrides.squadron.clone().or_else(|| self.squadron.clone()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradingCatalog {
    pub persona: String,
    pub overview: String,
    pub rubric: String,
    #[serde(default)]
    awards: BTreeMap<String, String>,
    #[serde(default)]
    tiers: BTreeMap<String, String>,
    #[serde(default)]
    wings: BTreeMap<String, String>,
    #[serde(default)]
    squadrons: BTreeMap<String, String>,
    #[serde(default)]
    examples: Vec<Example>,
}

impl GradingCatalog {
    /// The catalog compiled into the library.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EvalError::config(format!("failed to read catalog {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let catalog: GradingCatalog = serde_yaml::from_str(raw)
            .map_err(|e| EvalError::config(format!("failed to parse catalog YAML: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        for (name, text) in [
            ("persona", &self.persona),
            ("overview", &self.overview),
            ("rubric", &self.rubric),
        ] {
            if text.trim().is_empty() {
                return Err(EvalError::config(format!("catalog {} is empty", name)));
            }
        }
        if self.awards.is_empty() {
            return Err(EvalError::config("catalog defines no awards"));
        }
        Ok(())
    }

    fn table(&self, kind: CategoryKind) -> &BTreeMap<String, String> {
        match kind {
            CategoryKind::Award => &self.awards,
            CategoryKind::Tier => &self.tiers,
            CategoryKind::Wing => &self.wings,
            CategoryKind::Squadron => &self.squadrons,
        }
    }

    /// Resolves one key. Optional categories map `"N/A"` to `None`.
    pub fn lookup(&self, kind: CategoryKind, key: &str) -> Result<Option<Category>> {
        if key == NOT_APPLICABLE && !kind.is_required() {
            return Ok(None);
        }
        match self.table(kind).get(key) {
            Some(text) => Ok(Some(Category::new(key, text.trim()))),
            None => Err(EvalError::UnknownCategory {
                kind,
                key: key.to_string(),
            }),
        }
    }

    fn lookup_opt(&self, kind: CategoryKind, key: Option<&str>) -> Result<Option<Category>> {
        match key {
            Some(k) => self.lookup(kind, k),
            None => Ok(None),
        }
    }

    pub fn context(&self, keys: &ContextKeys) -> Result<GradingContext> {
        let award = self
            .lookup(CategoryKind::Award, &keys.award)?
            .ok_or_else(|| EvalError::UnknownCategory {
                kind: CategoryKind::Award,
                key: keys.award.clone(),
            })?;
        Ok(GradingContext {
            award,
            tier: self.lookup_opt(CategoryKind::Tier, keys.tier.as_deref())?,
            wing_priorities: self.lookup_opt(CategoryKind::Wing, keys.wing.as_deref())?,
            squadron_priorities: self
                .lookup_opt(CategoryKind::Squadron, keys.squadron.as_deref())?,
        })
    }

    /// Known keys for a category, including `"N/A"` for optional ones.
    pub fn keys(&self, kind: CategoryKind) -> Vec<&str> {
        let mut keys: Vec<&str> = self.table(kind).keys().map(String::as_str).collect();
        if !kind.is_required() {
            keys.push(NOT_APPLICABLE);
        }
        keys
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn template(&self) -> PromptTemplate {
        PromptTemplate {
            persona: self.persona.trim().to_string(),
            overview: self.overview.trim().to_string(),
            rubric: self.rubric.trim().to_string(),
        }
    }
}
