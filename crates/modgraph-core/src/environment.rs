//! Compile environment: the include paths and definitions a module is
//! compiled with once its dependencies' public interfaces are folded in.

use std::collections::VecDeque;

use indexmap::IndexSet;
use serde::Serialize;

use crate::Result;
use crate::descriptor::ModuleDescriptor;
use crate::graph::DependencyGraph;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileEnvironment {
    pub module: String,
    /// Modules whose public interface is visible, in discovery order.
    pub visible_modules: IndexSet<String>,
    pub include_paths: IndexSet<String>,
    pub definitions: IndexSet<String>,
}

impl DependencyGraph {
    /// Modules whose public interface `name` compiles against: its direct
    /// public and private dependencies, then the public dependencies of
    /// those, transitively. Private dependencies of dependencies stay hidden.
    pub fn public_closure(&self, name: &str) -> Result<IndexSet<String>> {
        let descriptor = self.expect_module(name)?;

        let mut visible: IndexSet<String> = IndexSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        let direct = descriptor
            .public_dependencies()
            .iter()
            .chain(descriptor.private_dependencies());
        for dependency in direct {
            if self.contains(dependency) && visible.insert(dependency.clone()) {
                queue.push_back(dependency);
            }
        }

        while let Some(current) = queue.pop_front() {
            let Some(module) = self.descriptor(current) else {
                continue;
            };
            for dependency in module.public_dependencies() {
                if dependency == name || !self.contains(dependency) {
                    continue;
                }
                if visible.insert(dependency.clone()) {
                    queue.push_back(dependency);
                }
            }
        }

        Ok(visible)
    }

    pub fn compile_environment(&self, name: &str) -> Result<CompileEnvironment> {
        let descriptor = self.expect_module(name)?;
        let visible_modules = self.public_closure(name)?;

        let mut include_paths: IndexSet<String> = descriptor
            .public_include_paths()
            .iter()
            .chain(descriptor.private_include_paths())
            .cloned()
            .collect();
        let mut definitions: IndexSet<String> = descriptor
            .public_definitions()
            .iter()
            .chain(descriptor.private_definitions())
            .cloned()
            .collect();

        for module in visible_modules.iter().filter_map(|m| self.descriptor(m)) {
            include_paths.extend(module.public_include_paths().iter().cloned());
            definitions.extend(module.public_definitions().iter().cloned());
        }

        Ok(CompileEnvironment {
            module: descriptor.name().to_string(),
            visible_modules,
            include_paths,
            definitions,
        })
    }
}

impl CompileEnvironment {
    /// Whether `module`'s public headers are on the include path.
    pub fn sees(&self, module: &ModuleDescriptor) -> bool {
        self.module == module.name() || self.visible_modules.contains(module.name())
    }
}
