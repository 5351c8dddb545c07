use serde::Serialize;
use sonar_core::{NodeId, ShadowStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Top,
    Mount,
    Patch,
    Detach,
}

/// One timed call in the profile tree. Times are milliseconds on the
/// tracker's clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileFrame {
    #[serde(rename = "type")]
    pub kind: FrameKind,
    pub node: Option<NodeId>,
    pub start: f64,
    pub end: Option<f64>,
    pub duration: Option<f64>,
    pub children: Vec<ProfileFrame>,
}

impl ProfileFrame {
    fn new(kind: FrameKind, node: Option<NodeId>, start: f64) -> Self {
        Self {
            kind,
            node,
            start,
            end: None,
            duration: None,
            children: Vec::new(),
        }
    }

    /// Copies the frame tree, looking every node reference up in `store`.
    pub fn resolve(&self, store: &ShadowStore) -> ResolvedFrame {
        let node = match self.kind {
            FrameKind::Top => None,
            _ => Some(
                self.node
                    .and_then(|id| store.get(id))
                    .map(|node| FrameNode {
                        id: Some(node.id),
                        kind: node.kind.as_str().to_string(),
                        tag_name: node.tag_name.clone(),
                    })
                    .unwrap_or_else(FrameNode::unknown),
            ),
        };
        ResolvedFrame {
            kind: self.kind,
            node,
            start: self.start,
            end: self.end,
            duration: self.duration,
            children: self.children.iter().map(|c| c.resolve(store)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameNode {
    pub id: Option<NodeId>,
    #[serde(rename = "type")]
    pub kind: String,
    pub tag_name: String,
}

impl FrameNode {
    pub fn unknown() -> Self {
        Self {
            id: None,
            kind: "Unknown".to_string(),
            tag_name: "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFrame {
    #[serde(rename = "type")]
    pub kind: FrameKind,
    pub node: Option<FrameNode>,
    pub start: f64,
    pub end: Option<f64>,
    pub duration: Option<f64>,
    pub children: Vec<ResolvedFrame>,
}

/// Nested call-frame recorder.
///
/// The open frame is addressed by `path`, the child indices leading from the
/// top frame to it. An empty path with a top frame means the top is current.
#[derive(Debug, Default)]
pub struct Profiler {
    top: Option<ProfileFrame>,
    path: Vec<usize>,
    running: bool,
}

impl Profiler {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn top(&self) -> Option<&ProfileFrame> {
        self.top.as_ref()
    }

    /// Discards any previous profile and opens a fresh top frame.
    pub fn start(&mut self, now: f64) {
        self.top = Some(ProfileFrame::new(FrameKind::Top, None, now));
        self.path.clear();
        self.running = true;
    }

    pub fn stop(&mut self, now: f64) {
        if !self.running {
            return;
        }
        self.running = false;
        self.path.clear();
        if let Some(top) = self.top.as_mut() {
            top.end = Some(now);
            top.duration = children_span(&top.children);
        }
    }

    pub fn clear(&mut self) {
        self.top = None;
        self.path.clear();
        self.running = false;
    }

    pub(crate) fn enter(&mut self, kind: FrameKind, node: Option<NodeId>, now: f64) {
        let Some(current) = self.current_mut() else {
            return;
        };
        current.children.push(ProfileFrame::new(kind, node, now));
        let index = current.children.len() - 1;
        self.path.push(index);
    }

    /// Closes the innermost open frame. Returns false when none was open.
    pub(crate) fn exit(&mut self, now: f64) -> bool {
        if self.path.is_empty() {
            return false;
        }
        if let Some(frame) = self.current_mut() {
            frame.end = Some(now);
            frame.duration = Some(now - frame.start);
        }
        self.path.pop();
        if let Some(top) = self.top.as_mut() {
            top.duration = children_span(&top.children);
        }
        true
    }

    fn current_mut(&mut self) -> Option<&mut ProfileFrame> {
        let mut frame = self.top.as_mut()?;
        for &index in &self.path {
            frame = frame.children.get_mut(index)?;
        }
        Some(frame)
    }
}

/// End of the last child minus start of the first.
fn children_span(children: &[ProfileFrame]) -> Option<f64> {
    let first = children.first()?;
    let end = children.last()?.end?;
    Some(end - first.start)
}
