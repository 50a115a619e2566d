//! Module classification
//!
//! Decides, for each imported root name, whether it belongs to the standard
//! library, to the script's own directory, or to a third-party package.
//! Classification depends only on the name, the script directory, and the
//! injected stdlib oracle: no network, no installed-package introspection.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::imports::ImportRecord;
use crate::stdlib::StdlibOracle;

/// Classification of a module based on its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Bundled with the interpreter (e.g. os, sys, json)
    Stdlib,
    /// A `.py` file or package sitting next to the script
    Local,
    /// Everything else: installable packages (e.g. httpx, rich)
    ThirdParty,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleKind::Stdlib => write!(f, "stdlib"),
            ModuleKind::Local => write!(f, "local"),
            ModuleKind::ThirdParty => write!(f, "third-party"),
        }
    }
}

/// Classify a single root name.
///
/// The standard-library check runs first: a module shadowed by a same-named
/// file next to the script still classifies as stdlib. Local means
/// `<root>.py` or `<root>/__init__.py` directly inside the script's
/// directory.
pub fn classify(root: &str, script_dir: Option<&Path>, oracle: &dyn StdlibOracle) -> ModuleKind {
    if oracle.is_stdlib(root) {
        return ModuleKind::Stdlib;
    }
    if let Some(dir) = script_dir {
        if dir.join(format!("{root}.py")).is_file() || dir.join(root).join("__init__.py").is_file()
        {
            return ModuleKind::Local;
        }
    }
    ModuleKind::ThirdParty
}

/// Imported module roots partitioned by [`ModuleKind`].
///
/// Each set is lexicographically sorted and deduplicated; a root appears in
/// exactly one set. Relative imports are dropped before classification and
/// never appear anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedModules {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stdlib: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub local: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub third_party: Vec<String>,
}

impl ClassifiedModules {
    pub fn is_empty(&self) -> bool {
        self.stdlib.is_empty() && self.local.is_empty() && self.third_party.is_empty()
    }

    /// Total number of classified roots.
    pub fn total(&self) -> usize {
        self.stdlib.len() + self.local.len() + self.third_party.len()
    }
}

/// Partition every non-relative root in `records`.
pub fn classify_all(
    records: &[ImportRecord],
    script_dir: Option<&Path>,
    oracle: &dyn StdlibOracle,
) -> ClassifiedModules {
    let roots: BTreeSet<&str> = records
        .iter()
        .filter(|record| !record.is_relative)
        .filter_map(|record| record.root.as_deref())
        .collect();

    let mut modules = ClassifiedModules::default();
    for root in roots {
        match classify(root, script_dir, oracle) {
            ModuleKind::Stdlib => modules.stdlib.push(root.to_string()),
            ModuleKind::Local => modules.local.push(root.to_string()),
            ModuleKind::ThirdParty => modules.third_party.push(root.to_string()),
        }
    }
    modules
}
