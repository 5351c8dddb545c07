//! Block interceptor: the host wraps every block mount, patch and detach in
//! these calls so the tracker can mirror the block tree and time it.

use crate::profiler::FrameKind;
use crate::tracker::{Entry, Handle, Tracker};
use crate::version::SemVer;
use sonar_core::{ComponentHandle, DomHandle, HandleKey, HostValue, NodeId, NodeKind};
use sonar_scheduler::Scheduler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockType {
    /// Pending branch of an await block.
    Pending,
    Then,
    Catch,
    Slot,
    Component,
    Each,
    Other(String),
}

impl BlockType {
    pub fn parse(name: &str) -> Self {
        match name {
            "pending" => BlockType::Pending,
            "then" => BlockType::Then,
            "catch" => BlockType::Catch,
            "slot" => BlockType::Slot,
            "component" => BlockType::Component,
            "each" => BlockType::Each,
            other => BlockType::Other(other.to_string()),
        }
    }

    pub fn tag_name(&self) -> &str {
        match self {
            BlockType::Pending => "await",
            BlockType::Then => "then",
            BlockType::Catch => "catch",
            BlockType::Slot => "slot",
            BlockType::Component => "component",
            BlockType::Each => "each",
            BlockType::Other(name) => name,
        }
    }
}

/// What the framework reports when it creates a block.
#[derive(Debug, Clone)]
pub struct BlockDescriptor {
    pub block_type: BlockType,
    /// Loop identity shared by all iterations of one `each` block.
    pub group_id: String,
    pub ctx: HostValue,
    pub source: String,
    /// Render fragment, for `component` blocks.
    pub fragment: Option<HandleKey>,
    pub version: Option<String>,
}

impl BlockDescriptor {
    pub fn new(block_type: BlockType) -> Self {
        Self {
            block_type,
            group_id: String::new(),
            ctx: HostValue::Undefined,
            source: String::new(),
            fragment: None,
            version: None,
        }
    }
}

/// A registered block. The host keeps it next to the block and passes it to
/// every interceptor call.
#[derive(Debug, Clone)]
pub struct BlockRegistration {
    node_id: NodeId,
    descriptor: BlockDescriptor,
}

impl BlockRegistration {
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn block_type(&self) -> &BlockType {
        &self.descriptor.block_type
    }
}

impl Tracker {
    /// Associates a component instance with its block, which may already be
    /// mounted as an `Unknown` placeholder.
    pub fn register_component(&mut self, component: ComponentHandle, tag_name: impl Into<String>) {
        let tag_name = tag_name.into();
        let Some(fragment) = component.fragment() else {
            tracing::debug!("Component {} has no fragment, not tracked", tag_name);
            return;
        };

        match self.placeholders.remove(&fragment) {
            Some(id) => {
                if let Some(entry) = self.entries.get_mut(&id) {
                    entry.handle = Handle::Component(component);
                    entry.tag_name = tag_name;
                }
                self.emit_update(id);
            }
            None => {
                self.pending_components.insert(fragment, (component, tag_name));
            }
        }
    }

    pub fn register_block(&mut self, descriptor: BlockDescriptor) -> BlockRegistration {
        if self.version.is_none() {
            if let Some(version) = &descriptor.version {
                let version = SemVer::parse(version);
                tracing::info!("Framework version {}", version);
                self.version = Some(version);
            }
        }
        BlockRegistration {
            node_id: self.allocate_id(),
            descriptor,
        }
    }

    /// Adds the block under the DOM `target` (or its enclosing block), then
    /// runs the real mount with the block as the current parent context.
    pub fn mount_block<R>(
        &mut self,
        block: &BlockRegistration,
        target: Option<&DomHandle>,
        anchor: Option<&DomHandle>,
        mount: impl FnOnce(&mut Tracker) -> R,
    ) -> R {
        let id = block.node_id;
        let desc = &block.descriptor;
        let parent_block = self.current_block;
        let mut entry = Entry {
            kind: NodeKind::Block,
            tag_name: desc.block_type.tag_name().to_string(),
            handle: Handle::Block {
                ctx: desc.ctx.clone(),
                source: desc.source.clone(),
            },
            parent_block,
        };

        match &desc.block_type {
            BlockType::Then | BlockType::Catch if entry.parent_block.is_none() => {
                entry.parent_block = self.last_promise_parent;
            }
            BlockType::Slot => entry.kind = NodeKind::Slot,
            BlockType::Component => {
                entry.kind = NodeKind::Component;
                match desc.fragment.and_then(|f| self.pending_components.remove(&f)) {
                    Some((component, tag_name)) => {
                        entry.handle = Handle::Component(component);
                        entry.tag_name = tag_name;
                    }
                    None => {
                        entry.handle = Handle::Placeholder;
                        entry.tag_name = "Unknown".to_string();
                        if let Some(fragment) = desc.fragment {
                            self.placeholders.insert(fragment, id);
                        }
                    }
                }
                self.scheduler.schedule_microtask(Box::new(move |tracker: &mut Tracker| {
                    tracker.recheck_bound(id);
                }));
            }
            _ => {}
        }

        let target = target.and_then(|t| self.node_of(t));
        let anchor = anchor.map(HandleKey::of);

        if desc.block_type == BlockType::Each {
            let group = self.each_group(parent_block, &desc.group_id, &desc.source, target, anchor);
            entry.kind = NodeKind::Iteration;
            entry.parent_block = Some(group);
            self.add_node(id, entry, Some(group), anchor);
        } else {
            self.add_node(id, entry, target, anchor);
        }

        self.current_block = Some(id);
        let out = self.profiled(FrameKind::Mount, Some(id), mount);
        self.current_block = parent_block;
        out
    }

    /// Refreshes the block's context and detail, then runs the real patch
    /// with the block as the current parent context.
    pub fn patch_block<R>(
        &mut self,
        block: &BlockRegistration,
        ctx: Option<HostValue>,
        patch: impl FnOnce(&mut Tracker) -> R,
    ) -> R {
        let parent_block = self.current_block;
        let current = self.entries.contains_key(&block.node_id).then_some(block.node_id);

        if let Some(id) = current {
            if let (Some(ctx), Some(entry)) = (ctx, self.entries.get_mut(&id)) {
                if let Handle::Block { ctx: stored, .. } = &mut entry.handle {
                    *stored = ctx;
                }
            }
            self.emit_update(id);
        }

        self.current_block = current;
        let out = self.profiled(FrameKind::Patch, current, patch);
        self.current_block = parent_block;
        out
    }

    /// Removes the block, then runs the real detach.
    pub fn detach_block<R>(
        &mut self,
        block: &BlockRegistration,
        detach: impl FnOnce(&mut Tracker) -> R,
    ) -> R {
        let id = block.node_id;
        if let Some(entry) = self.entries.get(&id) {
            if block.descriptor.block_type == BlockType::Pending {
                self.last_promise_parent = entry.parent_block;
            }
            self.remove_node(id);
        } else {
            tracing::trace!("Detach of untracked block {}", id);
        }
        self.profiled(FrameKind::Detach, Some(id), detach)
    }

    /// Shared group node for the iterations of one loop, created on first use.
    fn each_group(
        &mut self,
        parent_block: Option<NodeId>,
        group_id: &str,
        source: &str,
        target: Option<NodeId>,
        anchor: Option<HandleKey>,
    ) -> NodeId {
        let key = (parent_block, group_id.to_string());
        if let Some(&group) = self.each_groups.get(&key) {
            if self.entries.contains_key(&group) {
                return group;
            }
        }

        let group = self.allocate_id();
        let entry = Entry {
            kind: NodeKind::Block,
            tag_name: "each".to_string(),
            handle: Handle::Block {
                ctx: HostValue::empty_object(),
                source: source.to_string(),
            },
            parent_block,
        };
        self.each_groups.insert(key, group);
        self.add_node(group, entry, target, anchor);
        group
    }

    /// Bound props are only wired after mount returns.
    fn recheck_bound(&mut self, id: NodeId) {
        let has_bound = self
            .component(id)
            .and_then(|component| component.internals())
            .is_some_and(|internals| !internals.bound.is_empty());
        if has_bound {
            self.emit_update(id);
        }
    }
}
