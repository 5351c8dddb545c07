use std::cell::RefCell;
use std::rc::Rc;

/// A framework-side value as the host hands it to us.
///
/// Objects and arrays are shared and mutable, so a value graph can contain
/// cycles and repeated references. Identity of a shared container is the
/// address of its allocation, see [`HostValue::identity`].
#[derive(Clone, Debug, Default)]
pub enum HostValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Function(Rc<HostFunction>),
    Symbol(String),
    Array(Rc<RefCell<Vec<HostValue>>>),
    Object(Rc<RefCell<Vec<(String, HostValue)>>>),
    /// The page's global object.
    Global,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostFunction {
    pub name: String,
    pub source: String,
}

impl HostValue {
    pub fn string(s: impl Into<String>) -> Self {
        HostValue::String(s.into())
    }

    pub fn function(name: impl Into<String>, source: impl Into<String>) -> Self {
        HostValue::Function(Rc::new(HostFunction {
            name: name.into(),
            source: source.into(),
        }))
    }

    pub fn array(items: Vec<HostValue>) -> Self {
        HostValue::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, HostValue)>) -> Self {
        HostValue::Object(Rc::new(RefCell::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    pub fn empty_object() -> Self {
        HostValue::Object(Rc::new(RefCell::new(Vec::new())))
    }

    /// Address of the shared container, `None` for plain values.
    pub fn identity(&self) -> Option<usize> {
        match self {
            HostValue::Array(items) => Some(Rc::as_ptr(items) as *const () as usize),
            HostValue::Object(entries) => Some(Rc::as_ptr(entries) as *const () as usize),
            _ => None,
        }
    }

    /// Sets `key` on an object, replacing an existing entry. No-op on non-objects.
    pub fn set(&self, key: &str, value: HostValue) {
        if let HostValue::Object(entries) = self {
            let mut entries = entries.borrow_mut();
            match entries.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key.to_string(), value)),
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<HostValue> {
        match self {
            HostValue::Object(entries) => entries
                .borrow()
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, HostValue::Undefined)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}
