use crate::node::{NodeId, NodeKind};
use crate::store::ShadowStore;
use serde::{Deserialize, Serialize};

/// Which node types the tree view shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Visibility {
    pub component: bool,
    pub element: bool,
    pub block: bool,
    pub iteration: bool,
    pub slot: bool,
    pub text: bool,
    pub anchor: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            component: true,
            element: true,
            block: true,
            iteration: true,
            slot: true,
            text: true,
            anchor: false,
        }
    }
}

impl Visibility {
    pub fn is_visible(&self, kind: NodeKind) -> bool {
        match kind {
            NodeKind::Component => self.component,
            NodeKind::Element => self.element,
            NodeKind::Block => self.block,
            NodeKind::Iteration => self.iteration,
            NodeKind::Slot => self.slot,
            NodeKind::Text => self.text,
            NodeKind::Anchor => self.anchor,
        }
    }

    pub fn set(&mut self, kind: NodeKind, visible: bool) {
        let flag = match kind {
            NodeKind::Component => &mut self.component,
            NodeKind::Element => &mut self.element,
            NodeKind::Block => &mut self.block,
            NodeKind::Iteration => &mut self.iteration,
            NodeKind::Slot => &mut self.slot,
            NodeKind::Text => &mut self.text,
            NodeKind::Anchor => &mut self.anchor,
        };
        *flag = visible;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Enter,
    ArrowRight,
    ArrowLeft,
    ArrowDown,
    ArrowUp,
}

impl ShadowStore {
    /// Visible nodes that can take keyboard selection. Text and anchors never do.
    fn interactable(&self, list: &[NodeId]) -> Vec<NodeId> {
        list.iter()
            .copied()
            .filter(|id| {
                self.nodes.get(id).is_some_and(|n| {
                    self.visibility.is_visible(n.kind)
                        && !matches!(n.kind, NodeKind::Text | NodeKind::Anchor)
                })
            })
            .collect()
    }

    fn sibling_list(&self, id: NodeId) -> Vec<NodeId> {
        match self.parent(id) {
            Some(parent) => self.interactable(self.children(parent)),
            None => self.interactable(&self.roots),
        }
    }

    /// Applies a navigation key to the current selection and returns the node
    /// selected afterwards. Does nothing without a selection.
    pub fn navigate(&mut self, key: NavKey) -> Option<NodeId> {
        let id = self.selected?;
        let node = self.nodes.get(&id)?;

        let next = match key {
            NavKey::Enter => {
                self.toggle_collapse(id);
                id
            }
            NavKey::ArrowRight => {
                self.set_collapsed(id, false);
                id
            }
            NavKey::ArrowLeft => {
                self.set_collapsed(id, true);
                id
            }
            NavKey::ArrowDown => {
                let children = self.interactable(&node.children);
                if node.collapsed || children.is_empty() {
                    self.next_in_document(id).unwrap_or(id)
                } else {
                    children[0]
                }
            }
            NavKey::ArrowUp => {
                let siblings = self.sibling_list(id);
                match siblings.iter().position(|&s| s == id) {
                    Some(index) if index > 0 => siblings[index - 1],
                    _ => node.parent.unwrap_or(id),
                }
            }
        };

        if next != id {
            self.select(Some(next));
        }
        Some(next)
    }

    /// Next sibling of `id`, or of the closest ancestor that has one.
    fn next_in_document(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(cur) = current {
            let siblings = self.sibling_list(cur);
            let next = match siblings.iter().position(|&s| s == cur) {
                Some(index) => siblings.get(index + 1).copied(),
                // A node that cannot take focus itself continues at the first sibling.
                None => siblings.first().copied(),
            };
            if next.is_some() {
                return next;
            }
            current = self.parent(cur);
        }
        None
    }
}
