use crate::node::{NodeDetail, NodeId, TrackedNode};
use crate::store::ShadowStore;

pub const DEFAULT_SEARCH_MIN_LEN: usize = 2;

fn matches(node: &TrackedNode, query: &str) -> bool {
    if node.tag_name.contains(query) {
        return true;
    }
    if node.detail == NodeDetail::Empty {
        return false;
    }
    serde_json::to_string(&node.detail)
        .map(|json| json.contains(query))
        .unwrap_or(false)
}

impl ShadowStore {
    /// Nodes whose tag name or serialized detail contains `query`, in display
    /// order. Queries shorter than `min_len` characters match nothing.
    pub fn search(&self, query: &str, min_len: usize) -> Vec<NodeId> {
        if query.chars().count() < min_len {
            return Vec::new();
        }
        self.preorder()
            .into_iter()
            .filter(|id| self.nodes.get(id).is_some_and(|n| matches(n, query)))
            .collect()
    }
}

/// Position within a result list; `next`/`prev` wrap around.
#[derive(Debug, Clone, Default)]
pub struct SearchCursor {
    query: String,
    results: Vec<NodeId>,
    position: Option<usize>,
}

impl SearchCursor {
    pub fn new(store: &ShadowStore, query: &str, min_len: usize) -> Self {
        Self {
            query: query.to_string(),
            results: store.search(query, min_len),
            position: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[NodeId] {
        &self.results
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn next(&mut self) -> Option<NodeId> {
        if self.results.is_empty() {
            return None;
        }
        let index = match self.position {
            Some(p) if p + 1 < self.results.len() => p + 1,
            _ => 0,
        };
        self.position = Some(index);
        Some(self.results[index])
    }

    pub fn prev(&mut self) -> Option<NodeId> {
        if self.results.is_empty() {
            return None;
        }
        let index = match self.position {
            Some(p) if p > 0 => p - 1,
            _ => self.results.len() - 1,
        };
        self.position = Some(index);
        Some(self.results[index])
    }
}
