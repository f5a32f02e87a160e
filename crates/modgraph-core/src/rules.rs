//! Module rules: turning a declaration plus a target into a descriptor.
//!
//! [`ModuleRules`] is the seam: anything that can produce a
//! [`ModuleDescriptor`] for a [`TargetContext`]. The declarative
//! implementation is [`RuleFile`], read from a `<Name>.module.toml` file:
//!
//! ```toml
//! [module]
//! name = "Renderer"
//! kind = "engine"
//! public_dependencies = ["Core", "RHI"]
//!
//! [[when]]
//! build_editor = true
//! private_dependencies = ["UnrealEd"]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::condition::Condition;
use crate::descriptor::{ModuleDescriptor, ModuleDescriptorBuilder, ModuleKind};
use crate::target::TargetContext;
use crate::{Error, Result};

/// File name suffix identifying rule files during discovery.
pub const RULE_FILE_SUFFIX: &str = ".module.toml";

/// Produces a module's descriptor for a given target.
///
/// Implementations must be pure: the same target always yields the same
/// descriptor, and evaluation has no side effects.
pub trait ModuleRules: Send + Sync {
    fn name(&self) -> &str;

    fn describe(&self, target: &TargetContext) -> Result<ModuleDescriptor>;
}

/// A descriptor that is the same for every target.
impl ModuleRules for ModuleDescriptor {
    fn name(&self) -> &str {
        ModuleDescriptor::name(self)
    }

    fn describe(&self, _target: &TargetContext) -> Result<ModuleDescriptor> {
        Ok(self.clone())
    }
}

/// Lists that may appear both unconditionally and inside `[[when]]` blocks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Declarations {
    pub public_dependencies: Vec<String>,
    pub private_dependencies: Vec<String>,
    pub dynamically_loaded: Vec<String>,
    pub public_include_paths: Vec<String>,
    pub private_include_paths: Vec<String>,
    pub public_definitions: Vec<String>,
    pub private_definitions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleSection {
    pub name: String,
    #[serde(default)]
    pub kind: ModuleKind,
    #[serde(default)]
    pub circularly_referenced: Vec<String>,
    #[serde(flatten)]
    pub declarations: Declarations,
    /// Keys no other field claimed. Rejected after parsing.
    #[serde(flatten)]
    unknown: BTreeMap<String, toml::Value>,
}

/// Declarations applied only when `condition` holds for the target.
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionalBlock {
    #[serde(flatten)]
    pub condition: Condition,
    #[serde(flatten)]
    pub declarations: Declarations,
    #[serde(default)]
    pub remove_dependencies: Vec<String>,
    /// Keys no other field claimed. Rejected after parsing.
    #[serde(flatten)]
    unknown: BTreeMap<String, toml::Value>,
}

/// A parsed `<Name>.module.toml` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleFile {
    pub module: ModuleSection,
    #[serde(default)]
    pub when: Vec<ConditionalBlock>,
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl RuleFile {
    /// Parse rule file text that has no location on disk. Include paths are
    /// kept exactly as written.
    pub fn parse(text: &str) -> Result<Self> {
        let rules: Self = toml::from_str(text).map_err(|err| {
            Error::parse_failed(err.message().to_string())
                .with_operation("rules::parse")
                .set_source(err)
        })?;
        rules.reject_unknown_keys()?;
        Ok(rules)
    }

    /// A misspelled key would otherwise drop a condition and widen the block
    /// to every target.
    fn reject_unknown_keys(&self) -> Result<()> {
        let module_keys = self.module.unknown.keys().map(|key| (key, "[module]".to_string()));
        let block_keys = self.when.iter().enumerate().flat_map(|(index, block)| {
            block
                .unknown
                .keys()
                .map(move |key| (key, format!("[[when]] block {index}")))
        });

        match module_keys.chain(block_keys).next() {
            Some((key, section)) => Err(Error::parse_failed(format!(
                "unknown key `{key}` in {section} of module '{}'",
                self.module.name
            ))
            .with_operation("rules::parse")
            .with_context("module", self.module.name.clone())
            .with_context("key", key.clone())),
            None => Ok(()),
        }
    }

    /// Read and parse a rule file. Relative include paths are resolved
    /// against the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            Error::from(err)
                .with_operation("rules::from_path")
                .with_context("path", path.display().to_string())
        })?;
        let mut rules =
            Self::parse(&text).map_err(|err| err.with_context("path", path.display().to_string()))?;

        if let Some(stem) = file_module_name(path) {
            if stem != rules.module.name {
                warn!(
                    path = %path.display(),
                    module = %rules.module.name,
                    "rule file name does not match the module it declares"
                );
            }
        }

        rules.source = Some(path.to_path_buf());
        Ok(rules)
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn base_dir(&self) -> Option<&Path> {
        self.source.as_deref().and_then(Path::parent)
    }

    fn resolve_paths<'a>(&'a self, paths: &'a [String]) -> impl Iterator<Item = String> + 'a {
        paths.iter().map(move |path| match self.base_dir() {
            Some(base) if Path::new(path).is_relative() => base.join(path).display().to_string(),
            _ => path.clone(),
        })
    }

    fn apply(
        &self,
        builder: ModuleDescriptorBuilder,
        declarations: &Declarations,
    ) -> ModuleDescriptorBuilder {
        builder
            .public_dependencies(&declarations.public_dependencies)
            .private_dependencies(&declarations.private_dependencies)
            .dynamically_loaded(&declarations.dynamically_loaded)
            .public_include_paths(self.resolve_paths(&declarations.public_include_paths))
            .private_include_paths(self.resolve_paths(&declarations.private_include_paths))
            .public_definitions(&declarations.public_definitions)
            .private_definitions(&declarations.private_definitions)
    }
}

/// `Core.module.toml` declares `Core`.
fn file_module_name(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()?.strip_suffix(RULE_FILE_SUFFIX)
}

impl ModuleRules for RuleFile {
    fn name(&self) -> &str {
        &self.module.name
    }

    fn describe(&self, target: &TargetContext) -> Result<ModuleDescriptor> {
        let module = &self.module;
        let mut builder = ModuleDescriptor::builder(module.name.clone())
            .kind(module.kind)
            .circularly_referenced(&module.circularly_referenced);
        builder = self.apply(builder, &module.declarations);

        for (index, block) in self.when.iter().enumerate() {
            if !block.condition.matches(target) {
                continue;
            }
            debug!(module = %module.name, block = index, "conditional block applies");
            builder = self
                .apply(builder, &block.declarations)
                .remove_dependencies(&block.remove_dependencies);
        }

        builder.build().map_err(|err| {
            let err = err.with_operation("rules::describe");
            match &self.source {
                Some(path) => err.with_context("path", path.display().to_string()),
                None => err,
            }
        })
    }
}

/// Read every rule file in `paths`, optionally in parallel.
pub fn load_rule_files(paths: &[PathBuf], parallel: bool) -> Result<Vec<RuleFile>> {
    let start = Instant::now();
    let rules = if parallel {
        paths
            .par_iter()
            .map(|path| RuleFile::from_path(path))
            .collect::<Result<Vec<_>>>()?
    } else {
        paths
            .iter()
            .map(|path| RuleFile::from_path(path))
            .collect::<Result<Vec<_>>>()?
    };
    info!(
        "Loading rule files: {:.2}s ({} files)",
        start.elapsed().as_secs_f64(),
        rules.len()
    );
    Ok(rules)
}

/// Evaluate all `rules` against `target`. Descriptors come back sorted by
/// module name regardless of scheduling.
pub fn evaluate_all<R: ModuleRules>(
    rules: &[R],
    target: &TargetContext,
    parallel: bool,
) -> Result<Vec<ModuleDescriptor>> {
    let start = Instant::now();
    let mut descriptors = if parallel {
        rules
            .par_iter()
            .map(|rule| rule.describe(target))
            .collect::<Result<Vec<_>>>()?
    } else {
        rules
            .iter()
            .map(|rule| rule.describe(target))
            .collect::<Result<Vec<_>>>()?
    };
    descriptors.sort_by(|a, b| a.name().cmp(b.name()));
    info!(
        "Evaluating rules: {:.2}s ({} modules)",
        start.elapsed().as_secs_f64(),
        descriptors.len()
    );
    Ok(descriptors)
}
