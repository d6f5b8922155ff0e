//! The tree walker: resolution of a node tree into an ordered
//! sequence of escaped fragments.
//!
//! One pull-based iterator serves both renderers. With `call_thunks`
//! on, thunks are invoked where the walk reaches them and their
//! subtree becomes one fragment; with it off, thunks are handed out
//! as `Fragment::Deferred` for a second pass, so a caller can ship
//! the opening tag and static prefix before any deferred child code
//! runs.

use anyhow::Result;
use kstring::KString;

use crate::element::Element;
use crate::escape::{escape_str, fmt_float, SafeHtml};
use crate::node::{Node, Thunk};
use crate::render::Renderer;

/// Where in the tree a node sits: the enclosing element and that
/// element's parent. This is what 1- and 2-argument thunks receive.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'t> {
    pub element: Option<&'t Element>,
    pub parent: Option<&'t Element>,
}

impl<'t> Scope<'t> {
    pub fn detached() -> Scope<'t> {
        Scope {
            element: None,
            parent: None,
        }
    }

    /// The scope of children of `element`, which itself sits in
    /// `self`.
    fn within(self, element: &'t Element) -> Scope<'t> {
        Scope {
            element: Some(element),
            parent: self.element,
        }
    }
}

/// One piece of resolved output, in strict document order.
#[derive(Debug)]
pub enum Fragment<'t> {
    /// Safe text, ready for concatenation or transmission.
    Text(SafeHtml),
    /// A thunk left un-invoked (deferred pass only), together with
    /// the scope it will be invoked in.
    Deferred(Deferred<'t>),
}

/// A thunk carried out of a deferred-mode walk; `resolve` is the
/// second pass.
#[derive(Debug, Clone)]
pub struct Deferred<'t> {
    pub thunk: Thunk,
    pub scope: Scope<'t>,
}

impl<'t> Deferred<'t> {
    pub fn resolve(&self, renderer: &Renderer) -> Result<String> {
        renderer.render_thunk(&self.thunk, self.scope)
    }
}

enum Frame<'t> {
    /// A node to resolve, in the given scope.
    Node(&'t Node, Scope<'t>),
    /// An element to open; the scope is the one the element sits in.
    Element(&'t Element, Scope<'t>),
    /// Children of an element being walked; the scope is already the
    /// inner one.
    Children(&'t Element, usize, Scope<'t>),
    /// A nested sequence being flattened.
    Seq(&'t [Node], usize, Scope<'t>),
    Close(&'t KString),
}

/// The walker itself. Yields fragments in document order; the first
/// error aborts the walk.
pub struct Resolver<'t> {
    renderer: &'t Renderer,
    call_thunks: bool,
    stack: Vec<Frame<'t>>,
}

impl<'t> Resolver<'t> {
    pub(crate) fn for_element(
        renderer: &'t Renderer,
        element: &'t Element,
        parent: Option<&'t Element>,
        call_thunks: bool,
    ) -> Resolver<'t> {
        let scope = Scope {
            element: parent,
            parent: None,
        };
        Resolver {
            renderer,
            call_thunks,
            stack: vec![Frame::Element(element, scope)],
        }
    }

    pub(crate) fn for_node(
        renderer: &'t Renderer,
        node: &'t Node,
        scope: Scope<'t>,
        call_thunks: bool,
    ) -> Resolver<'t> {
        Resolver {
            renderer,
            call_thunks,
            stack: vec![Frame::Node(node, scope)],
        }
    }
}

impl<'t> Iterator for Resolver<'t> {
    type Item = Result<Fragment<'t>>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Node(node, scope) => match node {
                    // A None child produces nothing at all; this is
                    // the conditional-child contract.
                    Node::None => continue,
                    Node::Text(s) => {
                        return Some(Ok(Fragment::Text(escape_str(s.as_str()))))
                    }
                    Node::Int(i) => {
                        return Some(Ok(Fragment::Text(SafeHtml::from(i.to_string()))))
                    }
                    Node::Float(v) => {
                        let s = fmt_float(*v, self.renderer.float_precision());
                        return Some(Ok(Fragment::Text(SafeHtml::from(s))));
                    }
                    // The literal words, not the bare-attribute
                    // collapsing used on the attribute side.
                    Node::Bool(b) => {
                        let s = if *b { "true" } else { "false" };
                        return Some(Ok(Fragment::Text(SafeHtml::from(s))));
                    }
                    Node::Element(e) => {
                        self.stack.push(Frame::Element(e, scope));
                        continue;
                    }
                    Node::Raw(r) => return Some(Ok(Fragment::Text(r.raw_html()))),
                    Node::Seq(v) => {
                        self.stack.push(Frame::Seq(v, 0, scope));
                        continue;
                    }
                    Node::Thunk(t) => {
                        if !self.call_thunks {
                            return Some(Ok(Fragment::Deferred(Deferred {
                                thunk: t.clone(),
                                scope,
                            })));
                        }
                        match self.renderer.render_thunk(t, scope) {
                            Ok(s) => {
                                return Some(Ok(Fragment::Text(SafeHtml::from(s))))
                            }
                            Err(e) => {
                                self.stack.clear();
                                return Some(Err(e));
                            }
                        }
                    }
                },
                Frame::Element(e, scope) => {
                    let open = self.renderer.open_tag(e);
                    if e.is_void() {
                        // Enforced at construction: no children to
                        // walk, one self-closing fragment.
                        return Some(Ok(Fragment::Text(SafeHtml::from(open))));
                    }
                    self.stack.push(Frame::Close(e.tag()));
                    self.stack.push(Frame::Children(e, 0, scope.within(e)));
                    return Some(Ok(Fragment::Text(SafeHtml::from(open))));
                }
                Frame::Children(e, i, scope) => {
                    if let Some(child) = e.children().get(i) {
                        self.stack.push(Frame::Children(e, i + 1, scope));
                        self.stack.push(Frame::Node(child, scope));
                    }
                    continue;
                }
                Frame::Seq(nodes, i, scope) => {
                    if let Some(node) = nodes.get(i) {
                        self.stack.push(Frame::Seq(nodes, i + 1, scope));
                        self.stack.push(Frame::Node(node, scope));
                    }
                    continue;
                }
                Frame::Close(tag) => {
                    return Some(Ok(Fragment::Text(SafeHtml::from(format!("</{tag}>")))));
                }
            }
        }
        None
    }
}
