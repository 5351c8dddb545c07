use sonar_core::{
    NavKey, NodeData, NodeDetail, NodeId, NodeKind, SearchCursor, ShadowStore, StoreOptions,
    TextDetail,
};
use sonar_scheduler::ManualClock;
use std::rc::Rc;

fn node(id: u64, kind: NodeKind, tag: &str) -> NodeData {
    NodeData::new(NodeId(id), kind, tag)
}

/// App
/// ├── div (2)
/// │   ├── "hello" (3, text)
/// │   └── span (4)
/// └── Counter (5)
///     └── button (6)
/// footer (7) as a second root
fn build_tree() -> ShadowStore {
    let mut store = ShadowStore::new(StoreOptions::default(), Rc::new(ManualClock::new()));
    store.insert(node(1, NodeKind::Component, "App"), None, None);
    store.insert(node(2, NodeKind::Element, "div"), Some(NodeId(1)), None);
    store.insert(
        node(3, NodeKind::Text, "#text").with_detail(NodeDetail::Text(TextDetail {
            node_value: Some("hello world".into()),
        })),
        Some(NodeId(2)),
        None,
    );
    store.insert(node(4, NodeKind::Element, "span"), Some(NodeId(2)), None);
    store.insert(node(5, NodeKind::Component, "Counter"), Some(NodeId(1)), None);
    store.insert(node(6, NodeKind::Element, "button"), Some(NodeId(5)), None);
    store.insert(node(7, NodeKind::Element, "footer"), None, None);
    store
}

#[test]
fn test_navigation_without_selection_is_noop() {
    let mut store = build_tree();
    assert_eq!(store.navigate(NavKey::ArrowDown), None);
}

#[test]
fn test_arrow_down_on_collapsed_moves_to_sibling() {
    let mut store = build_tree();
    store.select(Some(NodeId(2)));

    // div is collapsed, so down goes to its next sibling.
    assert_eq!(store.navigate(NavKey::ArrowDown), Some(NodeId(5)));
}

#[test]
fn test_arrow_down_enters_expanded_children_skipping_text() {
    let mut store = build_tree();
    store.select(Some(NodeId(2)));
    store.navigate(NavKey::ArrowRight);

    assert_eq!(store.navigate(NavKey::ArrowDown), Some(NodeId(4)));
}

#[test]
fn test_arrow_down_climbs_to_ancestor_sibling() {
    let mut store = build_tree();
    store.select(Some(NodeId(6)));

    // button has no next sibling, nor does Counter; App's next root is footer.
    assert_eq!(store.navigate(NavKey::ArrowDown), Some(NodeId(7)));
    // footer is last: stays.
    assert_eq!(store.navigate(NavKey::ArrowDown), Some(NodeId(7)));
}

#[test]
fn test_arrow_up_goes_to_previous_sibling_or_parent() {
    let mut store = build_tree();
    store.select(Some(NodeId(5)));
    assert_eq!(store.navigate(NavKey::ArrowUp), Some(NodeId(2)));
    assert_eq!(store.navigate(NavKey::ArrowUp), Some(NodeId(1)));
    // Root with no previous sibling stays.
    assert_eq!(store.navigate(NavKey::ArrowUp), Some(NodeId(1)));
}

#[test]
fn test_enter_toggles_and_left_collapses() {
    let mut store = build_tree();
    store.select(Some(NodeId(7)));
    store.navigate(NavKey::Enter);
    assert!(!store.get(NodeId(7)).unwrap().collapsed);
    store.navigate(NavKey::ArrowLeft);
    assert!(store.get(NodeId(7)).unwrap().collapsed);
}

#[test]
fn test_hidden_kinds_are_skipped() {
    let mut store = build_tree();
    store.set_visible(NodeKind::Component, false);
    store.select(Some(NodeId(2)));

    // Counter is hidden, so there is no next interactable sibling under App;
    // App itself is hidden too, so the walk ends at footer.
    assert_eq!(store.navigate(NavKey::ArrowDown), Some(NodeId(7)));
}

#[test]
fn test_search_matches_tag_and_detail() {
    let store = build_tree();

    assert_eq!(store.search("butt", 2), vec![NodeId(6)]);
    assert_eq!(store.search("hello", 2), vec![NodeId(3)]);
    // Too short.
    assert!(store.search("d", 2).is_empty());
}

#[test]
fn test_search_cursor_wraps() {
    let store = build_tree();
    let mut cursor = SearchCursor::new(&store, "o", 1);
    // "footer", "button", "Counter" and the text node all contain "o".
    let results = cursor.results().to_vec();
    assert_eq!(results, vec![NodeId(3), NodeId(5), NodeId(6), NodeId(7)]);

    assert_eq!(cursor.next(), Some(NodeId(3)));
    assert_eq!(cursor.prev(), Some(NodeId(7)));
    assert_eq!(cursor.next(), Some(NodeId(3)));
    assert_eq!(cursor.next(), Some(NodeId(5)));
}
