//! Dependency graph over a resolution, for tree output and `why` queries.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use nupak_core::name::{PackageKey, PackageName};
use nupak_core::range::VersionRange;
use nupak_core::resolution::PackageResolution;
use nupak_core::version::SemVer;

/// A resolved package in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub name: PackageName,
    pub version: SemVer,
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Packages as nodes, edges labelled with the declared range.
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, VersionRange>,
    index: HashMap<PackageKey, NodeIndex>,
    roots: Vec<NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph for `resolution`; `direct` names the tree roots, in
    /// the order they should print. Edges to unresolved packages are skipped.
    pub fn from_resolution(resolution: &PackageResolution, direct: &[PackageName]) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for (key, package) in resolution.iter() {
            let idx = graph.add_node(GraphNode {
                name: package.name.clone(),
                version: package.version.clone(),
            });
            index.insert(key.clone(), idx);
        }
        for (key, package) in resolution.iter() {
            let from = index[key];
            for (dependency, range) in &package.dependencies {
                if let Some(&to) = index.get(dependency.key()) {
                    if !graph.edges(from).any(|e| e.target() == to) {
                        graph.add_edge(from, to, range.clone());
                    }
                }
            }
        }

        let mut roots = Vec::new();
        for name in direct {
            if let Some(&idx) = index.get(name.key()) {
                if !roots.contains(&idx) {
                    roots.push(idx);
                }
            }
        }

        Self {
            graph,
            index,
            roots,
        }
    }

    /// Look up a node by any spelling of its name.
    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(&PackageKey::new(name)).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Direct dependencies of a node, by name.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &VersionRange)> {
        let mut deps: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect();
        deps.sort_by(|a, b| self.graph[a.0].name.cmp(&self.graph[b.0].name));
        deps
    }

    /// Packages that depend on this node, by name.
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &VersionRange)> {
        let mut deps: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.source(), e.weight()))
            .collect();
        deps.sort_by(|a, b| self.graph[a.0].name.cmp(&self.graph[b.0].name));
        deps
    }

    /// Render the tree below the direct requirements.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let mut visited = HashSet::new();
        let count = self.roots.len();
        for (i, &root) in self.roots.iter().enumerate() {
            self.print_subtree(&mut output, root, "", i == count - 1, 1, max_depth, &mut visited);
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if max_depth.is_some_and(|max| depth >= max) {
            return;
        }
        // Cycles print the repeated node once and stop.
        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, (child, _)) in deps.iter().enumerate() {
            self.print_subtree(
                output,
                *child,
                &child_prefix,
                i == count - 1,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// A chain of packages from a direct requirement down to `name`.
    pub fn find_path(&self, name: &str) -> Option<Vec<&GraphNode>> {
        let target = self.find(name)?;
        for &root in &self.roots {
            let mut path = Vec::new();
            let mut visited = HashSet::new();
            if self.dfs_path(root, target, &mut path, &mut visited) {
                return Some(path.iter().map(|&idx| &self.graph[idx]).collect());
            }
        }
        None
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for (child, _) in self.dependencies_of(current) {
            if self.dfs_path(child, target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Render everything that depends on `name`, transitively.
    pub fn print_inverted_tree(&self, name: &str) -> String {
        let mut output = String::new();
        let Some(idx) = self.find(name) else {
            return output;
        };
        output.push_str(&format!("{}\n", self.graph[idx]));

        let mut visited = HashSet::new();
        visited.insert(idx);
        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, (dep_idx, range)) in dependents.iter().enumerate() {
            self.print_inverted_subtree(&mut output, *dep_idx, range, "", i == count - 1, &mut visited);
        }
        output
    }

    fn print_inverted_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        range: &VersionRange,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        match range {
            VersionRange::NoRestriction => output.push_str(&format!("{prefix}{connector}{node}\n")),
            _ => output.push_str(&format!("{prefix}{connector}{node} ({range})\n")),
        }

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let dependents = self.dependents_of(idx);
        let count = dependents.len();
        for (i, (dep_idx, range)) in dependents.iter().enumerate() {
            self.print_inverted_subtree(output, *dep_idx, range, &child_prefix, i == count - 1, visited);
        }
        visited.remove(&idx);
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nupak_core::resolution::ResolvedPackage;
    use nupak_core::source::PackageSource;

    fn package(name: &str, version: &str, deps: &[(&str, &str)]) -> ResolvedPackage {
        ResolvedPackage {
            name: PackageName::new(name),
            version: SemVer::parse(version).unwrap(),
            source: PackageSource::nuget_org(),
            dependencies: deps
                .iter()
                .map(|(n, r)| (PackageName::new(*n), VersionRange::parse(r).unwrap()))
                .collect(),
        }
    }

    fn sample() -> DependencyGraph {
        let resolution: PackageResolution = vec![
            package(
                "Nancy.Bootstrappers.Windsor",
                "0.23",
                &[("Castle.Windsor", ">= 3.2.1"), ("Nancy", "0.23")],
            ),
            package("Nancy", "0.23", &[]),
            package("Castle.Windsor", "3.2.1", &[("castle.core", ">= 3.2.0")]),
            package("Castle.Core", "3.2.0", &[]),
        ]
        .into_iter()
        .collect();
        DependencyGraph::from_resolution(
            &resolution,
            &[PackageName::new("nancy.bootstrappers.windsor")],
        )
    }

    #[test]
    fn builds_nodes_and_edges() {
        let g = sample();
        assert_eq!(g.len(), 4);
        assert_eq!(g.roots().len(), 1);
        let windsor = g.find("CASTLE.WINDSOR").unwrap();
        assert_eq!(g.node(windsor).name.display(), "Castle.Windsor");
        assert_eq!(g.dependencies_of(windsor).len(), 1);
        assert_eq!(g.dependents_of(windsor).len(), 1);
    }

    #[test]
    fn tree_printing() {
        let tree = sample().print_tree(None);
        assert_eq!(
            tree,
            "└── Nancy.Bootstrappers.Windsor 0.23\n    \
             ├── Castle.Windsor 3.2.1\n    \
             │   └── Castle.Core 3.2.0\n    \
             └── Nancy 0.23\n"
        );
    }

    #[test]
    fn tree_depth_limit() {
        let tree = sample().print_tree(Some(1));
        assert_eq!(tree, "└── Nancy.Bootstrappers.Windsor 0.23\n");
    }

    #[test]
    fn path_to_transitive_dependency() {
        let g = sample();
        let path = g.find_path("castle.core").unwrap();
        let names: Vec<String> = path.iter().map(|n| n.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "Nancy.Bootstrappers.Windsor 0.23",
                "Castle.Windsor 3.2.1",
                "Castle.Core 3.2.0"
            ]
        );
        assert!(g.find_path("missing").is_none());
    }

    #[test]
    fn inverted_tree_shows_dependents() {
        let tree = sample().print_inverted_tree("Castle.Core");
        assert!(tree.starts_with("Castle.Core 3.2.0\n"));
        assert!(tree.contains("└── Castle.Windsor 3.2.1 (>= 3.2.0)"));
        assert!(tree.contains("Nancy.Bootstrappers.Windsor 0.23 (>= 3.2.1)"));
    }

    #[test]
    fn cycles_terminate() {
        let resolution: PackageResolution = vec![
            package("A", "1.0", &[("B", "")]),
            package("B", "1.0", &[("A", "")]),
        ]
        .into_iter()
        .collect();
        let g = DependencyGraph::from_resolution(&resolution, &[PackageName::new("A")]);
        let tree = g.print_tree(None);
        assert_eq!(tree.lines().count(), 3);
    }
}
