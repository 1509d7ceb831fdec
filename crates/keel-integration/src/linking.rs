// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-source node identity.
//!
//! Two records describe the same node when their ids match, or when the
//! hostnames in their URIs match (scheme, credentials, port, and path are
//! ignored). Comparisons are case-insensitive. Matching is closed
//! transitively through a disjoint-set, so the grouping does not depend on
//! input order.

use std::collections::{BTreeMap, HashMap};

use keel_core::Node;
use tracing::debug;

/// Source whose certificate and status fields win when it contributes.
pub const DEFAULT_AUTHORITATIVE_SOURCE: &str = "puppetserver";

#[derive(Debug, Clone)]
pub struct NodeLinkingService {
    authoritative_source: String,
}

impl Default for NodeLinkingService {
    fn default() -> Self {
        Self::new(DEFAULT_AUTHORITATIVE_SOURCE)
    }
}

impl NodeLinkingService {
    pub fn new(authoritative_source: impl Into<String>) -> Self {
        Self {
            authoritative_source: authoritative_source.into(),
        }
    }

    pub fn authoritative_source(&self) -> &str {
        &self.authoritative_source
    }

    /// Merge per-source records into one node per physical host.
    ///
    /// Output follows the position of each group's first record. Input
    /// records are never modified.
    pub fn link_nodes(&self, nodes: &[Node]) -> Vec<Node> {
        let mut sets = DisjointSet::new(nodes.len());
        let mut by_id: HashMap<String, usize> = HashMap::new();
        let mut by_host: HashMap<String, usize> = HashMap::new();

        for (index, node) in nodes.iter().enumerate() {
            let id = node.id.to_ascii_lowercase();
            if let Some(&other) = by_id.get(&id) {
                sets.union(index, other);
            } else {
                by_id.insert(id, index);
            }

            if let Some(host) = extract_hostname(&node.uri) {
                if let Some(&other) = by_host.get(&host) {
                    sets.union(index, other);
                } else {
                    by_host.insert(host, index);
                }
            }
        }

        let mut groups: BTreeMap<usize, Vec<&Node>> = BTreeMap::new();
        for (index, node) in nodes.iter().enumerate() {
            groups.entry(sets.find(index)).or_default().push(node);
        }

        let linked: Vec<Node> = groups.values().map(|members| self.merge(members)).collect();
        debug!(records = nodes.len(), nodes = linked.len(), "linked node records");
        linked
    }

    fn merge(&self, members: &[&Node]) -> Node {
        let mut merged = members[0].clone();

        let mut sources: Vec<String> = Vec::new();
        for member in members {
            if !sources.contains(&member.source) {
                sources.push(member.source.clone());
            }
        }
        merged.linked = sources.len() > 1;
        merged.sources = sources;
        merged.last_check_in = members.iter().filter_map(|m| m.last_check_in).max();
        merged.certificate_status = self.preferred(members, |m| m.certificate_status.as_ref());
        merged.status = self.preferred(members, |m| m.status.as_ref());
        merged
    }

    /// Field value from the authoritative source, else the first contributor
    /// that has one.
    fn preferred<F>(&self, members: &[&Node], field: F) -> Option<String>
    where
        F: Fn(&Node) -> Option<&String>,
    {
        members
            .iter()
            .filter(|m| m.source == self.authoritative_source)
            .find_map(|m| field(m))
            .or_else(|| members.iter().find_map(|m| field(m)))
            .cloned()
    }
}

/// Raw records whose name or id equals `identifier`, ignoring case.
pub fn find_matching_nodes(nodes: &[Node], identifier: &str) -> Vec<Node> {
    nodes
        .iter()
        .filter(|n| {
            n.name.eq_ignore_ascii_case(identifier) || n.id.eq_ignore_ascii_case(identifier)
        })
        .cloned()
        .collect()
}

/// Lowercased host part of a node URI.
///
/// Accepts bare hosts (`web01`), `host:port`, and full URIs with scheme,
/// user info, and path. Bracketed IPv6 literals lose their brackets.
pub fn extract_hostname(uri: &str) -> Option<String> {
    let rest = uri.trim();
    let rest = rest.split_once("://").map_or(rest, |(_, r)| r);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);

    let host = if let Some(bracketed) = host_port.strip_prefix('[') {
        bracketed.split_once(']').map_or(bracketed, |(h, _)| h)
    } else if host_port.matches(':').count() == 1 {
        host_port.split_once(':').map_or(host_port, |(h, _)| h)
    } else {
        // Unbracketed IPv6 or no port.
        host_port
    };

    let host = host.trim_end_matches('.').to_ascii_lowercase();
    (!host.is_empty()).then_some(host)
}

/// Union-find over input positions; the root of a set is its lowest index.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[high] = low;
        }
    }
}
