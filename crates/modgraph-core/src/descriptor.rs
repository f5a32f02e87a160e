//! Module descriptors: the evaluated dependency declaration of one module.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};
use tracing::debug;

use crate::{Error, Result};

/// Where a module lives in the source tree.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum ModuleKind {
    #[default]
    Engine,
    Program,
    Plugin,
}

serde_via_str!(ModuleKind);

/// How one module refers to another.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, IntoStaticStr, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    /// Visible to dependents: propagates through the public compile environment.
    Public,
    /// Only visible while compiling the module itself.
    Private,
    /// Loaded at runtime; neither linked nor ordered against.
    Dynamic,
}

impl DependencyScope {
    /// Public and private edges constrain build and link order.
    pub fn is_static(&self) -> bool {
        !matches!(self, DependencyScope::Dynamic)
    }
}

/// Directed relation `from` requires `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub scope: DependencyScope,
}

/// The finalized dependency sets and compile settings of one module.
///
/// Built through [`ModuleDescriptorBuilder`], which enforces the invariants:
/// valid names, no self references, public and private sets disjoint, and no
/// dynamically loaded module also linked statically. Immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    name: String,
    kind: ModuleKind,
    public_dependencies: IndexSet<String>,
    private_dependencies: IndexSet<String>,
    dynamically_loaded: IndexSet<String>,
    circularly_referenced: IndexSet<String>,
    public_include_paths: IndexSet<String>,
    private_include_paths: IndexSet<String>,
    public_definitions: IndexSet<String>,
    private_definitions: IndexSet<String>,
}

impl ModuleDescriptor {
    pub fn builder(name: impl Into<String>) -> ModuleDescriptorBuilder {
        ModuleDescriptorBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    pub fn public_dependencies(&self) -> &IndexSet<String> {
        &self.public_dependencies
    }

    pub fn private_dependencies(&self) -> &IndexSet<String> {
        &self.private_dependencies
    }

    pub fn dynamically_loaded(&self) -> &IndexSet<String> {
        &self.dynamically_loaded
    }

    pub fn circularly_referenced(&self) -> &IndexSet<String> {
        &self.circularly_referenced
    }

    pub fn public_include_paths(&self) -> &IndexSet<String> {
        &self.public_include_paths
    }

    pub fn private_include_paths(&self) -> &IndexSet<String> {
        &self.private_include_paths
    }

    pub fn public_definitions(&self) -> &IndexSet<String> {
        &self.public_definitions
    }

    pub fn private_definitions(&self) -> &IndexSet<String> {
        &self.private_definitions
    }

    /// Every declared dependency with its scope: public, then private, then dynamic.
    pub fn dependencies(&self) -> impl Iterator<Item = (&str, DependencyScope)> + '_ {
        let public = self
            .public_dependencies
            .iter()
            .map(|name| (name.as_str(), DependencyScope::Public));
        let private = self
            .private_dependencies
            .iter()
            .map(|name| (name.as_str(), DependencyScope::Private));
        let dynamic = self
            .dynamically_loaded
            .iter()
            .map(|name| (name.as_str(), DependencyScope::Dynamic));
        public.chain(private).chain(dynamic)
    }

    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.dependencies()
            .map(|(to, scope)| DependencyEdge {
                from: self.name.clone(),
                to: to.to_string(),
                scope,
            })
            .collect()
    }

    /// Whether this module declared that its edge to `to` may close a cycle.
    pub fn allows_circular_reference(&self, to: &str) -> bool {
        self.circularly_referenced.contains(to)
    }
}

/// Names are identifiers: ASCII letters, digits and underscores.
pub fn is_valid_module_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Accumulates a module's declarations before validating them into a
/// [`ModuleDescriptor`].
#[derive(Debug, Clone, Default)]
pub struct ModuleDescriptorBuilder {
    name: String,
    kind: ModuleKind,
    public_dependencies: IndexSet<String>,
    private_dependencies: IndexSet<String>,
    dynamically_loaded: IndexSet<String>,
    circularly_referenced: IndexSet<String>,
    public_include_paths: IndexSet<String>,
    private_include_paths: IndexSet<String>,
    public_definitions: IndexSet<String>,
    private_definitions: IndexSet<String>,
}

fn extend<I, S>(set: &mut IndexSet<String>, items: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    set.extend(items.into_iter().map(Into::into));
}

impl ModuleDescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(mut self, kind: ModuleKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn public_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend(&mut self.public_dependencies, names);
        self
    }

    pub fn private_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend(&mut self.private_dependencies, names);
        self
    }

    pub fn dynamically_loaded<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend(&mut self.dynamically_loaded, names);
        self
    }

    pub fn circularly_referenced<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend(&mut self.circularly_referenced, names);
        self
    }

    pub fn public_include_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend(&mut self.public_include_paths, paths);
        self
    }

    pub fn private_include_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend(&mut self.private_include_paths, paths);
        self
    }

    pub fn public_definitions<I, S>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend(&mut self.public_definitions, definitions);
        self
    }

    pub fn private_definitions<I, S>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend(&mut self.private_definitions, definitions);
        self
    }

    /// Drop `names` from the public, private and dynamic sets.
    pub fn remove_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            self.public_dependencies.shift_remove(name);
            self.private_dependencies.shift_remove(name);
            self.dynamically_loaded.shift_remove(name);
        }
        self
    }

    /// Validate the declarations and freeze them.
    pub fn build(mut self) -> Result<ModuleDescriptor> {
        if !is_valid_module_name(&self.name) {
            return Err(Error::invalid_descriptor(
                self.name.clone(),
                format!("'{}' is not a valid module name", self.name),
            )
            .with_operation("descriptor::build"));
        }

        let declared = self
            .public_dependencies
            .iter()
            .chain(&self.private_dependencies)
            .chain(&self.dynamically_loaded)
            .chain(&self.circularly_referenced);
        for dependency in declared {
            if *dependency == self.name {
                return Err(Error::self_dependency(self.name.clone())
                    .with_operation("descriptor::build"));
            }
            if !is_valid_module_name(dependency) {
                return Err(Error::invalid_descriptor(
                    self.name.clone(),
                    format!("dependency '{}' is not a valid module name", dependency),
                )
                .with_context("dependency", dependency.clone())
                .with_operation("descriptor::build"));
            }
        }

        let public = &self.public_dependencies;
        self.private_dependencies.retain(|name| {
            let keep = !public.contains(name);
            if !keep {
                debug!(module = %self.name, dependency = %name, "private dependency already public");
            }
            keep
        });

        let overlap: Vec<&str> = self
            .dynamically_loaded
            .iter()
            .filter(|name| {
                self.public_dependencies.contains(*name) || self.private_dependencies.contains(*name)
            })
            .map(String::as_str)
            .collect();
        if !overlap.is_empty() {
            return Err(Error::invalid_descriptor(
                self.name.clone(),
                format!(
                    "dynamically loaded modules are also linked statically: {}",
                    overlap.join(", ")
                ),
            )
            .with_context("modules", overlap.join(","))
            .with_operation("descriptor::build"));
        }

        Ok(ModuleDescriptor {
            name: self.name,
            kind: self.kind,
            public_dependencies: self.public_dependencies,
            private_dependencies: self.private_dependencies,
            dynamically_loaded: self.dynamically_loaded,
            circularly_referenced: self.circularly_referenced,
            public_include_paths: self.public_include_paths,
            private_include_paths: self.private_include_paths,
            public_definitions: self.public_definitions,
            private_definitions: self.private_definitions,
        })
    }
}
