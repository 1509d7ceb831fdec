// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dependency ordering of loaded plugins.
//!
//! Uses Kahn's algorithm over an index-based adjacency list. Dependencies on
//! names absent from the input are treated as already satisfied. When the
//! sort stalls, the remaining graph is split into strongly connected
//! components and one member of each cyclic component (the latest in input
//! order) is excluded; the sort is then retried. Excluded plugins are then
//! offered back in input order and kept whenever the graph stays acyclic, so
//! no plugin is dropped that could have been scheduled. The result is
//! deterministic for a given input order and the function never panics.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

/// Anything that can be ordered by declared dependencies.
pub trait DependencyNode {
    fn name(&self) -> &str;
    fn dependencies(&self) -> &[String];
}

/// Order `plugins` so every dependency precedes its dependents.
///
/// Returns a sub-permutation of the input: only plugins excluded to break a
/// cycle are dropped.
pub fn resolve_dependencies<T: DependencyNode>(plugins: Vec<T>) -> Vec<T> {
    let graph = DependencyGraph::build(&plugins);
    let mut excluded = vec![false; plugins.len()];

    let order = loop {
        let order = graph.kahn(&excluded);
        let active = excluded.iter().filter(|e| !**e).count();
        if order.len() == active {
            break order;
        }

        let mut scheduled = vec![false; plugins.len()];
        for &i in &order {
            scheduled[i] = true;
        }
        let stalled: Vec<usize> = (0..plugins.len())
            .filter(|&i| !excluded[i] && !scheduled[i])
            .collect();

        let mut broke_cycle = false;
        for component in graph.cyclic_components(&stalled) {
            if let Some(&victim) = component.iter().max() {
                warn!(
                    plugin = %plugins[victim].name(),
                    cycle = ?component.iter().map(|&i| plugins[i].name()).collect::<Vec<_>>(),
                    "circular plugin dependency; excluding plugin"
                );
                excluded[victim] = true;
                broke_cycle = true;
            }
        }
        if !broke_cycle {
            // Unreachable for a well-formed graph; never loop forever.
            break order;
        }
    };

    let readmitted = graph.readmit(&mut excluded);
    for &i in &readmitted {
        debug!(plugin = %plugins[i].name(), "plugin re-admitted after cycle breaking");
    }
    let order = if readmitted.is_empty() { order } else { graph.kahn(&excluded) };

    let mut slots: Vec<Option<T>> = plugins.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}

/// Index-based adjacency: `deps[i]` holds the indices `i` depends on.
struct DependencyGraph {
    deps: Vec<BTreeSet<usize>>,
    dependents: Vec<Vec<usize>>,
}

impl DependencyGraph {
    fn build<T: DependencyNode>(plugins: &[T]) -> Self {
        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, plugin) in plugins.iter().enumerate() {
            by_name.entry(plugin.name()).or_default().push(i);
        }

        let mut deps = vec![BTreeSet::new(); plugins.len()];
        let mut dependents = vec![Vec::new(); plugins.len()];
        for (i, plugin) in plugins.iter().enumerate() {
            for dep in plugin.dependencies() {
                // Unknown names are satisfied by definition.
                for &j in by_name.get(dep.as_str()).into_iter().flatten() {
                    if deps[i].insert(j) {
                        dependents[j].push(i);
                    }
                }
            }
        }
        Self { deps, dependents }
    }

    /// Kahn's algorithm, always releasing the lowest ready index first.
    fn kahn(&self, excluded: &[bool]) -> Vec<usize> {
        let n = self.deps.len();
        let mut in_degree: Vec<usize> = (0..n)
            .map(|i| self.deps[i].iter().filter(|&&j| !excluded[j]).count())
            .collect();
        let mut ready: BTreeSet<usize> = (0..n)
            .filter(|&i| !excluded[i] && in_degree[i] == 0)
            .collect();

        let mut order = Vec::with_capacity(n);
        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &dependent in &self.dependents[i] {
                if excluded[dependent] {
                    continue;
                }
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }
        order
    }

    /// Offer each excluded index back, in input order, keeping it when the
    /// sort still schedules every active plugin. Returns the indices kept.
    fn readmit(&self, excluded: &mut [bool]) -> Vec<usize> {
        let mut readmitted = Vec::new();
        for i in 0..excluded.len() {
            if !excluded[i] {
                continue;
            }
            excluded[i] = false;
            let active = excluded.iter().filter(|e| !**e).count();
            if self.kahn(excluded).len() == active {
                readmitted.push(i);
            } else {
                excluded[i] = true;
            }
        }
        readmitted
    }

    /// Strongly connected components of the subgraph induced by `nodes` that
    /// contain a cycle (more than one member, or a self-dependency).
    fn cyclic_components(&self, nodes: &[usize]) -> Vec<Vec<usize>> {
        let mut tarjan = Tarjan::new(self, nodes);
        for &v in nodes {
            if tarjan.index[v].is_none() {
                tarjan.visit(v);
            }
        }
        tarjan
            .components
            .into_iter()
            .filter(|c| c.len() > 1 || self.deps[c[0]].contains(&c[0]))
            .collect()
    }
}

struct Tarjan<'a> {
    graph: &'a DependencyGraph,
    member: Vec<bool>,
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    components: Vec<Vec<usize>>,
}

impl<'a> Tarjan<'a> {
    fn new(graph: &'a DependencyGraph, nodes: &[usize]) -> Self {
        let n = graph.deps.len();
        let mut member = vec![false; n];
        for &v in nodes {
            member[v] = true;
        }
        Self {
            graph,
            member,
            index: vec![None; n],
            lowlink: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            next_index: 0,
            components: Vec::new(),
        }
    }

    fn visit(&mut self, v: usize) {
        self.index[v] = Some(self.next_index);
        self.lowlink[v] = self.next_index;
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack[v] = true;

        let graph = self.graph;
        for &w in &graph.deps[v] {
            if !self.member[w] {
                continue;
            }
            match self.index[w] {
                None => {
                    self.visit(w);
                    self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                }
                Some(w_index) if self.on_stack[w] => {
                    self.lowlink[v] = self.lowlink[v].min(w_index);
                }
                Some(_) => {}
            }
        }

        if Some(self.lowlink[v]) == self.index[v] {
            let mut component = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            component.sort_unstable();
            self.components.push(component);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Node {
        name: String,
        deps: Vec<String>,
    }

    impl DependencyNode for Node {
        fn name(&self) -> &str {
            &self.name
        }

        fn dependencies(&self) -> &[String] {
            &self.deps
        }
    }

    fn node(name: &str, deps: &[&str]) -> Node {
        Node {
            name: name.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn names(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    fn position(nodes: &[Node], name: &str) -> usize {
        nodes.iter().position(|n| n.name == name).unwrap()
    }

    #[test]
    fn empty_input() {
        assert!(resolve_dependencies(Vec::<Node>::new()).is_empty());
    }

    #[test]
    fn independent_plugins_keep_input_order() {
        let out = resolve_dependencies(vec![node("c", &[]), node("a", &[]), node("b", &[])]);
        assert_eq!(names(&out), vec!["c", "a", "b"]);
    }

    #[test]
    fn dependencies_come_first() {
        let out = resolve_dependencies(vec![
            node("bolt", &["ssh", "hiera"]),
            node("hiera", &["puppetdb"]),
            node("ssh", &[]),
            node("puppetdb", &[]),
        ]);
        assert_eq!(out.len(), 4);
        assert!(position(&out, "ssh") < position(&out, "bolt"));
        assert!(position(&out, "hiera") < position(&out, "bolt"));
        assert!(position(&out, "puppetdb") < position(&out, "hiera"));
    }

    #[test]
    fn missing_dependency_is_treated_as_satisfied() {
        let out = resolve_dependencies(vec![node("bolt", &["not-installed"]), node("ssh", &[])]);
        assert_eq!(names(&out), vec!["bolt", "ssh"]);
    }

    #[test]
    fn two_cycle_excludes_one_member() {
        let out = resolve_dependencies(vec![node("a", &["b"]), node("b", &["a"]), node("c", &[])]);
        assert_eq!(names(&out), vec!["a", "c"]);
    }

    #[test]
    fn chained_cycles_exclude_only_the_shared_member() {
        let out = resolve_dependencies(vec![
            node("a", &["b"]),
            node("b", &["a", "c"]),
            node("c", &["b"]),
        ]);
        assert_eq!(names(&out), vec!["a", "c"]);
    }

    #[test]
    fn self_dependency_is_excluded() {
        let out = resolve_dependencies(vec![node("loop", &["loop"]), node("ok", &[])]);
        assert_eq!(names(&out), vec!["ok"]);
    }

    #[test]
    fn dependents_of_a_cycle_are_still_scheduled() {
        let out = resolve_dependencies(vec![
            node("a", &["b"]),
            node("b", &["c"]),
            node("c", &["a"]),
            node("d", &["c"]),
        ]);
        assert_eq!(out.len(), 3);
        assert!(out.iter().any(|n| n.name == "d"));
        assert!(!out.iter().any(|n| n.name == "c"));
        assert!(position(&out, "b") < position(&out, "a"));
    }

    #[test]
    fn deterministic_for_same_input() {
        let input = vec![
            node("x", &["y"]),
            node("y", &["z"]),
            node("z", &["x"]),
            node("w", &[]),
        ];
        let first = resolve_dependencies(input.clone());
        let second = resolve_dependencies(input);
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn output_is_sub_permutation_respecting_edges(
            edges in proptest::collection::vec(proptest::collection::vec(0usize..8, 0..4), 1..8)
        ) {
            let count = edges.len();
            let input: Vec<Node> = edges
                .iter()
                .enumerate()
                .map(|(i, deps)| Node {
                    name: format!("p{i}"),
                    // Indices past the end name plugins that are not present.
                    deps: deps.iter().map(|d| format!("p{d}")).collect(),
                })
                .collect();

            let out = resolve_dependencies(input.clone());
            prop_assert!(out.len() <= count);

            let mut seen = std::collections::HashSet::new();
            for n in &out {
                prop_assert!(input.contains(n));
                prop_assert!(seen.insert(n.name.clone()));
            }

            for (pos, n) in out.iter().enumerate() {
                for dep in &n.deps {
                    if let Some(dep_pos) = out.iter().position(|m| &m.name == dep) {
                        prop_assert!(dep_pos < pos || dep == &n.name);
                    }
                }
            }
        }

        #[test]
        fn every_excluded_plugin_would_close_a_cycle(
            edges in proptest::collection::vec(proptest::collection::vec(0usize..6, 0..3), 1..6)
        ) {
            let input: Vec<Node> = edges
                .iter()
                .enumerate()
                .map(|(i, deps)| Node {
                    name: format!("p{i}"),
                    deps: deps.iter().map(|d| format!("p{d}")).collect(),
                })
                .collect();

            let out = resolve_dependencies(input.clone());
            for candidate in input.iter().filter(|n| !out.contains(n)) {
                let widened: Vec<Node> = input
                    .iter()
                    .filter(|n| out.contains(n) || *n == candidate)
                    .cloned()
                    .collect();
                let expected = widened.len();
                prop_assert!(resolve_dependencies(widened).len() < expected);
            }
        }
    }
}
