use sonar_core::{NodeId, NodeKind, Rect};
use sonar_listener::Tracker;

/// Draws the hover box over the inspected page.
pub trait HighlightSink {
    fn show(&mut self, rect: Rect, label: &str);
    fn hide(&mut self);
}

/// Layout box of a tracked node: an element's own rect, otherwise the union
/// of its children's boxes.
pub fn bounding_rect(tracker: &Tracker, id: NodeId) -> Option<Rect> {
    let node = tracker.store().get(id)?;
    if node.kind == NodeKind::Element {
        return tracker.dom_node(id).and_then(|dom| dom.layout_rect());
    }
    node.children
        .iter()
        .filter_map(|&child| bounding_rect(tracker, child))
        .reduce(|acc, rect| acc.union(&rect))
}
