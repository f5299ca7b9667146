//! Operation: display the locked dependency graph.

use nupak_core::LOCK_FILE;
use nupak_resolver::graph::DependencyGraph;
use nupak_util::errors::NupakError;

use crate::project::Project;

/// Options for `nupak tree`.
#[derive(Debug, Default)]
pub struct TreeOptions {
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show how a package is reached from the direct requirements.
    pub why: Option<String>,
    /// Show everything that depends on a package.
    pub invert: Option<String>,
}

/// Render the tree for the project's lock file.
pub fn tree(project: &Project, opts: &TreeOptions) -> miette::Result<String> {
    let lock = project.read_lock()?.ok_or_else(|| NupakError::LockFile {
        message: format!("No {LOCK_FILE} found; run `nupak lock` first"),
    })?;
    let direct: Vec<_> = project
        .requirements()
        .iter()
        .map(|r| r.name.clone())
        .collect();
    let graph = DependencyGraph::from_resolution(&lock.resolution, &direct);

    if let Some(target) = &opts.why {
        let Some(path) = graph.find_path(target) else {
            return Ok(format!("'{target}' is not reachable from {}\n", nupak_core::DEPENDENCIES_FILE));
        };
        let mut output = format!("Path to {target}:\n");
        for (i, node) in path.iter().enumerate() {
            output.push_str(&format!("{}{node}\n", "  ".repeat(i)));
        }
        return Ok(output);
    }

    if let Some(target) = &opts.invert {
        if graph.find(target).is_none() {
            return Ok(format!("'{target}' is not in {LOCK_FILE}\n"));
        }
        return Ok(graph.print_inverted_tree(target));
    }

    Ok(graph.print_tree(opts.depth))
}
