#![allow(dead_code)]

use sonar_core::{
    ComponentInstance, ComponentInternals, DocumentHandle, DocumentRoot, DomHandle, DomNode,
    DomNodeKind, EvalError, FrameHandle, FrameWindow, HandleKey, HostValue, Rect,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub struct FakeNode {
    kind: DomNodeKind,
    name: String,
    value: RefCell<Option<String>>,
    children: RefCell<Vec<DomHandle>>,
    attributes: RefCell<Vec<(String, String)>>,
    rect: Cell<Option<Rect>>,
}

impl FakeNode {
    fn new(kind: DomNodeKind, name: &str, value: Option<&str>) -> Rc<Self> {
        Rc::new(Self {
            kind,
            name: name.to_string(),
            value: RefCell::new(value.map(str::to_string)),
            children: RefCell::new(Vec::new()),
            attributes: RefCell::new(Vec::new()),
            rect: Cell::new(None),
        })
    }

    pub fn append(&self, child: &Rc<FakeNode>) {
        self.children.borrow_mut().push(child.clone());
    }

    pub fn set_value(&self, value: &str) {
        *self.value.borrow_mut() = Some(value.to_string());
    }

    pub fn set_attribute(&self, key: &str, value: &str) {
        self.attributes
            .borrow_mut()
            .push((key.to_string(), value.to_string()));
    }

    pub fn set_rect(&self, rect: Rect) {
        self.rect.set(Some(rect));
    }
}

impl DomNode for FakeNode {
    fn kind(&self) -> DomNodeKind {
        self.kind
    }

    fn node_name(&self) -> String {
        self.name.clone()
    }

    fn node_value(&self) -> Option<String> {
        self.value.borrow().clone()
    }

    fn child_nodes(&self) -> Vec<DomHandle> {
        self.children.borrow().clone()
    }

    fn attributes(&self) -> Vec<(String, String)> {
        self.attributes.borrow().clone()
    }

    fn layout_rect(&self) -> Option<Rect> {
        self.rect.get()
    }
}

pub fn element(name: &str) -> Rc<FakeNode> {
    FakeNode::new(DomNodeKind::Element, &name.to_uppercase(), None)
}

pub fn text(value: &str) -> Rc<FakeNode> {
    FakeNode::new(DomNodeKind::Text, "#text", Some(value))
}

pub fn dom(node: &Rc<FakeNode>) -> DomHandle {
    node.clone()
}

pub struct FakeComponent {
    fragment: HandleKey,
    pub internals: RefCell<Option<ComponentInternals>>,
    pub state: RefCell<Option<HostValue>>,
    pub injected: RefCell<Vec<(String, String)>>,
    pub fail_with: RefCell<Option<String>>,
}

impl FakeComponent {
    pub fn new(fragment: usize, ctx: HostValue) -> Rc<Self> {
        Rc::new(Self {
            fragment: HandleKey::from_raw(fragment),
            internals: RefCell::new(Some(ComponentInternals {
                ctx,
                ..ComponentInternals::default()
            })),
            state: RefCell::new(None),
            injected: RefCell::new(Vec::new()),
            fail_with: RefCell::new(None),
        })
    }

    pub fn fragment_key(&self) -> HandleKey {
        self.fragment
    }

    pub fn with_internals(&self, f: impl FnOnce(&mut ComponentInternals)) {
        if let Some(internals) = self.internals.borrow_mut().as_mut() {
            f(internals);
        }
    }
}

impl ComponentInstance for FakeComponent {
    fn fragment(&self) -> Option<HandleKey> {
        Some(self.fragment)
    }

    fn internals(&self) -> Option<ComponentInternals> {
        self.internals.borrow().clone()
    }

    fn capture_state(&self) -> Option<HostValue> {
        self.state.borrow().clone()
    }

    fn inject_state(&self, key: &str, value: HostValue) -> Result<(), EvalError> {
        if let Some(message) = self.fail_with.borrow().clone() {
            return Err(EvalError::Exception(message));
        }
        let shown = match &value {
            HostValue::String(s) => s.clone(),
            HostValue::Number(n) => n.to_string(),
            other => format!("{:?}", other),
        };
        self.injected.borrow_mut().push((key.to_string(), shown));
        self.with_internals(|internals| internals.ctx.set(key, value));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeDocument {
    pub frames: Vec<FrameHandle>,
}

impl DocumentRoot for FakeDocument {
    fn frames(&self) -> Vec<FrameHandle> {
        self.frames.clone()
    }
}

pub fn document(frames: Vec<FrameHandle>) -> DocumentHandle {
    Rc::new(FakeDocument { frames })
}

#[derive(Default)]
pub struct FakeFrame {
    pub document: RefCell<Option<DocumentHandle>>,
}

impl FrameWindow for FakeFrame {
    fn document(&self) -> Option<DocumentHandle> {
        self.document.borrow().clone()
    }
}

pub fn to_host(value: &serde_json::Value) -> HostValue {
    use serde_json::Value;
    match value {
        Value::Null => HostValue::Null,
        Value::Bool(b) => HostValue::Bool(*b),
        Value::Number(n) => HostValue::Number(n.as_f64().unwrap_or_default()),
        Value::String(s) => HostValue::string(s.clone()),
        Value::Array(items) => HostValue::array(items.iter().map(to_host).collect()),
        Value::Object(map) => HostValue::object(map.iter().map(|(k, v)| (k.clone(), to_host(v)))),
    }
}

/// Evaluates JSON literals; `throw <message>` raises.
pub struct JsonEvaluator {
    pub seen: Rc<RefCell<Vec<String>>>,
}

impl sonar_core::Evaluator for JsonEvaluator {
    fn eval(&self, source: &str) -> Result<HostValue, EvalError> {
        self.seen.borrow_mut().push(source.to_string());
        if let Some(message) = source.strip_prefix("throw ") {
            return Err(EvalError::Exception(message.to_string()));
        }
        let value: serde_json::Value =
            serde_json::from_str(source).map_err(|e| EvalError::Syntax(e.to_string()))?;
        Ok(to_host(&value))
    }
}

/// Records every highlight: `Some(rect)` for show, `None` for hide.
pub struct RecordingHighlight {
    pub calls: Rc<RefCell<Vec<Option<Rect>>>>,
}

impl sonar_devtools::HighlightSink for RecordingHighlight {
    fn show(&mut self, rect: Rect, _label: &str) {
        self.calls.borrow_mut().push(Some(rect));
    }

    fn hide(&mut self) {
        self.calls.borrow_mut().push(None);
    }
}
