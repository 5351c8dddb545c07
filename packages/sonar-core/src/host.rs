//! The surface the inspected framework and page expose to the tracker.
//!
//! Everything here is implemented by the host adapter. The tracker only holds
//! these handles; it never mutates the page except through
//! [`ComponentInstance::inject_state`].

use crate::value::HostValue;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use thiserror::Error;

/// Identity of a host object, used to de-duplicate observations coming from
/// different event sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleKey(usize);

impl HandleKey {
    pub fn of<T: ?Sized>(handle: &Rc<T>) -> Self {
        HandleKey(Rc::as_ptr(handle) as *const () as usize)
    }

    pub fn from_raw(raw: usize) -> Self {
        HandleKey(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomNodeKind {
    Element,
    Text,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let top = self.top.min(other.top);
        let left = self.left.min(other.left);
        let bottom = self.bottom().max(other.bottom());
        let right = self.right().max(other.right());
        Rect {
            top,
            left,
            width: right - left,
            height: bottom - top,
        }
    }
}

pub trait DomNode {
    fn kind(&self) -> DomNodeKind;
    /// Node name, e.g. `DIV` or `#text`.
    fn node_name(&self) -> String;
    fn node_value(&self) -> Option<String>;
    fn child_nodes(&self) -> Vec<DomHandle>;
    fn attributes(&self) -> Vec<(String, String)>;
    /// Page-relative layout box including margins, if the node is laid out.
    fn layout_rect(&self) -> Option<Rect> {
        None
    }
}

pub type DomHandle = Rc<dyn DomNode>;

/// Internal state of a live component instance.
#[derive(Debug, Clone, Default)]
pub struct ComponentInternals {
    pub props: Vec<String>,
    pub bound: Vec<String>,
    /// Event name to handler sources registered on the component.
    pub callbacks: Vec<(String, Vec<String>)>,
    pub ctx: HostValue,
}

pub trait ComponentInstance {
    /// Identity of the component's render fragment. Blocks of type
    /// `component` are reported with the same identity.
    fn fragment(&self) -> Option<HandleKey>;
    /// `None` once the instance has been torn down.
    fn internals(&self) -> Option<ComponentInternals>;
    /// The framework's own state accessor; `None` when unsupported.
    fn capture_state(&self) -> Option<HostValue>;
    fn inject_state(&self, key: &str, value: HostValue) -> Result<(), EvalError>;
}

pub type ComponentHandle = Rc<dyn ComponentInstance>;

/// Evaluates source text in the inspected page's context.
///
/// This is arbitrary code execution against the page; callers gate it behind
/// an explicit capability.
pub trait Evaluator {
    fn eval(&self, source: &str) -> Result<HostValue, EvalError>;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The evaluated code threw; carries the exception text.
    #[error("{0}")]
    Exception(String),
    #[error("syntax error: {0}")]
    Syntax(String),
}

impl EvalError {
    /// First line of the message, which is what an edit field shows.
    pub fn first_line(&self) -> String {
        let text = self.to_string();
        text.lines().next().unwrap_or_default().to_string()
    }
}

/// A document the listener can be attached to.
pub trait DocumentRoot {
    fn frames(&self) -> Vec<FrameHandle>;
}

pub type DocumentHandle = Rc<dyn DocumentRoot>;

/// A child frame of an attached document.
pub trait FrameWindow {
    /// `None` until the frame's document is ready.
    fn document(&self) -> Option<DocumentHandle>;
}

pub type FrameHandle = Rc<dyn FrameWindow>;
