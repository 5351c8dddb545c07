use sonar_core::StoreEvent;
use sonar_listener::{BlockDescriptor, BlockType, FrameKind, FrameNode, Tracker, TrackerOptions};
use sonar_scheduler::ManualClock;
use std::cell::Cell;
use std::rc::Rc;

fn tracker() -> (Tracker, Rc<ManualClock>) {
    let clock = Rc::new(ManualClock::new());
    (Tracker::new(TrackerOptions::default(), clock.clone()), clock)
}

fn if_block() -> BlockDescriptor {
    BlockDescriptor::new(BlockType::Other("if".to_string()))
}

#[test]
fn test_bracket_is_passthrough_when_stopped() {
    let (mut tracker, _clock) = tracker();
    let block = tracker.register_block(if_block());
    let out = tracker.mount_block(&block, None, None, |_| "mounted");
    assert_eq!(out, "mounted");
    assert!(tracker.profile().is_none());
    assert!(!tracker.is_profiling());
}

#[test]
fn test_mount_patch_detach_timing() {
    let (mut tracker, clock) = tracker();
    let block = tracker.register_block(if_block());

    clock.set(10.0);
    tracker.start_profiler();

    clock.set(12.0);
    tracker.mount_block(&block, None, None, |_| clock.advance(3.0));
    clock.set(20.0);
    tracker.patch_block(&block, None, |_| clock.advance(2.0));
    clock.set(30.0);
    tracker.detach_block(&block, |_| clock.advance(1.0));
    clock.set(40.0);
    tracker.stop_profiler();

    let top = tracker.profile().unwrap();
    assert_eq!(top.kind, FrameKind::Top);
    assert_eq!(top.start, 10.0);
    assert_eq!(top.end, Some(40.0));
    assert_eq!(top.duration, Some(19.0));

    let kinds: Vec<_> = top.children.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![FrameKind::Mount, FrameKind::Patch, FrameKind::Detach]);
    assert!(top.children.iter().all(|f| f.children.is_empty()));
    assert!(top.children.iter().all(|f| f.node == Some(block.node_id())));

    let durations: Vec<_> = top.children.iter().map(|f| f.duration).collect();
    assert_eq!(durations, vec![Some(3.0), Some(2.0), Some(1.0)]);
}

#[test]
fn test_nested_mounts_nest_frames() {
    let (mut tracker, clock) = tracker();
    let outer = tracker.register_block(if_block());
    let inner = tracker.register_block(if_block());

    tracker.start_profiler();
    tracker.mount_block(&outer, None, None, |t| {
        clock.advance(1.0);
        t.mount_block(&inner, None, None, |_| clock.advance(4.0));
        clock.advance(1.0);
    });

    let top = tracker.profile().unwrap();
    assert_eq!(top.children.len(), 1);
    let outer_frame = &top.children[0];
    assert_eq!(outer_frame.duration, Some(6.0));
    assert_eq!(outer_frame.children.len(), 1);
    assert_eq!(outer_frame.children[0].node, Some(inner.node_id()));
    assert_eq!(outer_frame.children[0].duration, Some(4.0));
    assert_eq!(top.duration, Some(6.0));
}

#[test]
fn test_frames_resolve_lazily() {
    let (mut tracker, _clock) = tracker();
    let block = tracker.register_block(if_block());

    tracker.start_profiler();
    tracker.mount_block(&block, None, None, |_| {});

    let resolved = tracker.resolved_profile().unwrap();
    assert!(resolved.node.is_none());
    let node = resolved.children[0].node.clone().unwrap();
    assert_eq!(node.id, Some(block.node_id()));
    assert_eq!(node.tag_name, "if");
    assert_eq!(node.kind, "block");

    tracker.detach_block(&block, |_| {});
    let resolved = tracker.resolved_profile().unwrap();
    assert_eq!(resolved.children[0].node, Some(FrameNode::unknown()));
    assert_eq!(resolved.children[1].node, Some(FrameNode::unknown()));
}

#[test]
fn test_start_discards_previous_profile() {
    let (mut tracker, _clock) = tracker();
    let block = tracker.register_block(if_block());

    tracker.start_profiler();
    tracker.mount_block(&block, None, None, |_| {});
    tracker.stop_profiler();
    assert_eq!(tracker.profile().unwrap().children.len(), 1);

    tracker.start_profiler();
    assert!(tracker.profile().unwrap().children.is_empty());
    tracker.clear_profile();
    assert!(tracker.profile().is_none());
}

#[test]
fn test_closed_frames_republish() {
    let (mut tracker, _clock) = tracker();
    let published = Rc::new(Cell::new(0));
    let count = published.clone();
    tracker.store_mut().subscribe(move |event| {
        if matches!(event, StoreEvent::ProfileUpdated) {
            count.set(count.get() + 1);
        }
    });

    let block = tracker.register_block(if_block());
    tracker.mount_block(&block, None, None, |_| {});
    assert_eq!(published.get(), 0);

    tracker.start_profiler();
    tracker.patch_block(&block, None, |_| {});
    tracker.patch_block(&block, None, |_| {});
    assert_eq!(published.get(), 2);
}

#[test]
fn test_stop_inside_bracket_is_safe() {
    let (mut tracker, _clock) = tracker();
    let block = tracker.register_block(if_block());

    tracker.start_profiler();
    tracker.mount_block(&block, None, None, |t| t.stop_profiler());

    let top = tracker.profile().unwrap();
    assert_eq!(top.children.len(), 1);
    assert!(top.children[0].end.is_none());
    assert!(!tracker.is_profiling());
}
