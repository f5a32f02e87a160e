//! Rule file discovery for modgraph.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use ignore::WalkBuilder;
use tracing::{debug, info};

use modgraph_core::{Error, ErrorKind, RULE_FILE_SUFFIX, Result};

use crate::ModgraphOptions;

/// Build output and tooling directories never hold module rules.
fn should_skip_dir(name: &str) -> bool {
    matches!(
        name,
        "Binaries"
            | "Intermediate"
            | "Saved"
            | "DerivedDataCache"
            | "target"
            | "node_modules"
            | ".git"
    )
}

fn is_rule_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(RULE_FILE_SUFFIX))
}

/// Discover rule files.
///
/// Explicit `opts.files` come first, then every `*.module.toml` found under
/// `opts.dirs`. A path is only listed once.
pub fn discover_rule_files(opts: &ModgraphOptions) -> Result<Vec<PathBuf>> {
    let discovery_start = Instant::now();

    let mut seen = HashSet::new();
    let mut files = Vec::new();

    let mut add_path = |path: PathBuf| {
        if seen.insert(path.clone()) {
            files.push(path);
        }
    };

    for file in &opts.files {
        let path = PathBuf::from(file);
        if !path.is_file() {
            return Err(Error::file_not_found(file.as_str()).with_operation("discovery::files"));
        }
        add_path(path);
    }

    for dir in &opts.dirs {
        let mut walked = Vec::new();
        let mut builder = WalkBuilder::new(dir);
        builder
            .standard_filters(true)
            .follow_links(false)
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let Some(file_type) = entry.file_type() else {
                    return true;
                };
                if !file_type.is_dir() {
                    return true;
                }
                let Some(name) = entry.file_name().to_str() else {
                    return true;
                };
                !should_skip_dir(name)
            });

        for entry in builder.build() {
            let entry = entry.map_err(|err| {
                Error::new(ErrorKind::TraversalFailed, format!("failed to walk {dir}: {err}"))
                    .with_operation("discovery::walk")
                    .with_context("dir", dir.as_str())
                    .set_source(err)
            })?;

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            if is_rule_file(entry.path()) {
                walked.push(entry.into_path());
            }
        }

        // Walk order depends on the file system.
        walked.sort();
        debug!(dir = %dir, count = walked.len(), "walked directory");
        for path in walked {
            add_path(path);
        }
    }

    info!(
        "Rule discovery: {:.2}s ({} files)",
        discovery_start.elapsed().as_secs_f64(),
        files.len()
    );

    if files.is_empty() {
        return Err(Error::invalid_argument(
            "no rule files found; pass --file or a --dir containing *.module.toml files",
        )
        .with_operation("discovery::rule_files"));
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn options(dirs: Vec<String>, files: Vec<String>) -> ModgraphOptions {
        ModgraphOptions {
            dirs,
            files,
            ..ModgraphOptions::default()
        }
    }

    #[test]
    fn test_skips_build_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for sub in ["Source/Core", "Intermediate/Core", "Binaries", "Source/Engine"] {
            fs::create_dir_all(root.join(sub)).unwrap();
        }
        fs::write(root.join("Source/Core/Core.module.toml"), "").unwrap();
        fs::write(root.join("Source/Engine/Engine.module.toml"), "").unwrap();
        fs::write(root.join("Source/Engine/notes.toml"), "").unwrap();
        fs::write(root.join("Intermediate/Core/Core.module.toml"), "").unwrap();
        fs::write(root.join("Binaries/Stale.module.toml"), "").unwrap();

        let files =
            discover_rule_files(&options(vec![root.display().to_string()], Vec::new())).unwrap();
        assert_eq!(
            files,
            vec![
                root.join("Source/Core/Core.module.toml"),
                root.join("Source/Engine/Engine.module.toml"),
            ]
        );
    }

    #[test]
    fn test_explicit_files_first_without_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("A.module.toml"), "").unwrap();
        fs::write(root.join("B.module.toml"), "").unwrap();

        let explicit = root.join("B.module.toml");
        let files = discover_rule_files(&options(
            vec![root.display().to_string()],
            vec![explicit.display().to_string()],
        ))
        .unwrap();
        assert_eq!(files, vec![explicit, root.join("A.module.toml")]);
    }

    #[test]
    fn test_no_rule_files() {
        let dir = tempfile::tempdir().unwrap();
        let err =
            discover_rule_files(&options(vec![dir.path().display().to_string()], Vec::new()))
                .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = discover_rule_files(&options(Vec::new(), vec!["missing.module.toml".into()]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }
}
