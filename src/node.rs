//! The node sum type: every value accepted as element content.

use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use kstring::KString;

use crate::element::Element;
use crate::escape::SafeHtml;

/// The capability of handing out raw, pre-escaped markup. The output
/// of `raw_html` is inserted into the render stream unescaped; the
/// implementor vouches for its safety. Any host type may implement
/// this.
pub trait RawHtml {
    fn raw_html(&self) -> SafeHtml;
}

impl RawHtml for SafeHtml {
    fn raw_html(&self) -> SafeHtml {
        self.clone()
    }
}

/// A deferred child computation. The three shapes replace runtime
/// arity inspection: the call site picks how much context the thunk
/// receives. Thunks are re-invoked on every render; a returned
/// `Node::Thunk` is chased until a non-thunk node results.
#[derive(Clone)]
pub enum Thunk {
    /// No context.
    Zero(Arc<dyn Fn() -> Result<Node>>),
    /// Receives the enclosing element.
    One(Arc<dyn Fn(&Element) -> Result<Node>>),
    /// Receives the enclosing element and its parent, if any.
    Two(Arc<dyn Fn(&Element, Option<&Element>) -> Result<Node>>),
}

impl Thunk {
    /// One invocation step; does not chase chains.
    pub fn invoke(
        &self,
        element: Option<&Element>,
        parent: Option<&Element>,
    ) -> Result<Node> {
        match self {
            Thunk::Zero(f) => f(),
            Thunk::One(f) => {
                let el = element
                    .ok_or_else(|| anyhow!("thunk needs an enclosing element"))?;
                f(el)
            }
            Thunk::Two(f) => {
                let el = element
                    .ok_or_else(|| anyhow!("thunk needs an enclosing element"))?;
                f(el, parent)
            }
        }
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thunk::Zero(_) => f.write_str("Thunk::Zero(..)"),
            Thunk::One(_) => f.write_str("Thunk::One(..)"),
            Thunk::Two(_) => f.write_str("Thunk::Two(..)"),
        }
    }
}

/// Element content. `None` renders as nothing (the conditional-child
/// escape hatch), `Bool` as the literal words `true`/`false`, `Seq`
/// flattens recursively at resolution time, `Raw` bypasses escaping,
/// `Thunk` defers computation until the render reaches it.
#[derive(Clone)]
pub enum Node {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(KString),
    Element(Element),
    Raw(Arc<dyn RawHtml>),
    Seq(Vec<Node>),
    Thunk(Thunk),
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::None => f.write_str("Node::None"),
            Node::Bool(b) => write!(f, "Node::Bool({b})"),
            Node::Int(i) => write!(f, "Node::Int({i})"),
            Node::Float(v) => write!(f, "Node::Float({v})"),
            Node::Text(s) => write!(f, "Node::Text({s:?})"),
            Node::Element(e) => write!(f, "Node::Element({e:?})"),
            Node::Raw(r) => write!(f, "Node::Raw({:?})", r.raw_html().as_str()),
            Node::Seq(v) => write!(f, "Node::Seq({v:?})"),
            Node::Thunk(t) => write!(f, "Node::Thunk({t:?})"),
        }
    }
}

/// A text child; escaped at render.
pub fn text(s: impl Into<KString>) -> Node {
    Node::Text(s.into())
}

/// A raw markup child; inserted verbatim.
pub fn raw(s: impl Into<SafeHtml>) -> Node {
    Node::Raw(Arc::new(s.into()))
}

/// A child backed by any `RawHtml` implementor; `raw_html` is called
/// at render time, once per render.
pub fn raw_source(source: impl RawHtml + 'static) -> Node {
    Node::Raw(Arc::new(source))
}

/// A context-free deferred child.
pub fn thunk(f: impl Fn() -> Result<Node> + 'static) -> Node {
    Node::Thunk(Thunk::Zero(Arc::new(f)))
}

/// A deferred child receiving its enclosing element.
pub fn thunk_self(f: impl Fn(&Element) -> Result<Node> + 'static) -> Node {
    Node::Thunk(Thunk::One(Arc::new(f)))
}

/// A deferred child receiving its enclosing element and that
/// element's parent.
pub fn thunk_scoped(
    f: impl Fn(&Element, Option<&Element>) -> Result<Node> + 'static,
) -> Node {
    Node::Thunk(Thunk::Two(Arc::new(f)))
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(KString::from_ref(s))
    }
}
impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(KString::from_string(s))
    }
}
impl From<KString> for Node {
    fn from(s: KString) -> Self {
        Node::Text(s)
    }
}
impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}
impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::Int(i)
    }
}
impl From<i32> for Node {
    fn from(i: i32) -> Self {
        Node::Int(i as i64)
    }
}
impl From<u32> for Node {
    fn from(i: u32) -> Self {
        Node::Int(i as i64)
    }
}
impl From<f64> for Node {
    fn from(v: f64) -> Self {
        Node::Float(v)
    }
}
impl From<f32> for Node {
    fn from(v: f32) -> Self {
        Node::Float(v as f64)
    }
}
impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}
impl From<SafeHtml> for Node {
    fn from(s: SafeHtml) -> Self {
        Node::Raw(Arc::new(s))
    }
}
impl From<Vec<Node>> for Node {
    fn from(v: Vec<Node>) -> Self {
        Node::Seq(v)
    }
}
impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Node::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_option_conversion() {
        assert!(matches!(Node::from(None::<&str>), Node::None));
        assert!(matches!(Node::from(Some("x")), Node::Text(_)));
    }

    #[test]
    fn t_thunk_without_element_fails() {
        let t = Thunk::One(Arc::new(|el: &Element| Ok(text(el.tag().clone()))));
        assert!(t.invoke(None, None).is_err());
    }

    #[test]
    fn t_thunk_zero_invokes() {
        let t = Thunk::Zero(Arc::new(|| Ok(text("hi"))));
        match t.invoke(None, None).unwrap() {
            Node::Text(s) => assert_eq!(s.as_str(), "hi"),
            other => panic!("unexpected node: {other:?}"),
        }
    }
}
