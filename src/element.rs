//! Elements: a tag, a void flag, resolved attributes in render
//! order, and an ordered, append-only list of child nodes.

use anyhow::{bail, Result};
use kstring::KString;

use crate::attr::{resolve_attr_value, AttrDecl, AttrString, AttrValue};
use crate::error::HtmlError;
use crate::meta;
use crate::node::Node;

/// Inputs accepted as an attribute set by the element constructors:
/// `()`, a single declaration, or arrays/vectors of `att`/`opt_att`
/// results.
pub trait ToAttrs {
    fn to_attrs(self) -> Vec<AttrDecl>;
}

impl ToAttrs for () {
    fn to_attrs(self) -> Vec<AttrDecl> {
        Vec::new()
    }
}
impl ToAttrs for AttrDecl {
    fn to_attrs(self) -> Vec<AttrDecl> {
        vec![self]
    }
}
impl ToAttrs for Option<AttrDecl> {
    fn to_attrs(self) -> Vec<AttrDecl> {
        self.into_iter().collect()
    }
}
impl<const N: usize> ToAttrs for [Option<AttrDecl>; N] {
    fn to_attrs(self) -> Vec<AttrDecl> {
        self.into_iter().flatten().collect()
    }
}
impl ToAttrs for Vec<AttrDecl> {
    fn to_attrs(self) -> Vec<AttrDecl> {
        self
    }
}
impl ToAttrs for Vec<Option<AttrDecl>> {
    fn to_attrs(self) -> Vec<AttrDecl> {
        self.into_iter().flatten().collect()
    }
}

/// Inputs accepted as children by the constructors and by `append`.
///
/// A single node appends one child; an array or vector argument is
/// flattened exactly one level, its items becoming independent
/// children. `Node::Seq` values inside are *not* flattened here —
/// that happens lazily during resolution.
pub trait ToChildren {
    fn to_children(self) -> Vec<Node>;
}

impl ToChildren for () {
    fn to_children(self) -> Vec<Node> {
        Vec::new()
    }
}
impl ToChildren for Node {
    fn to_children(self) -> Vec<Node> {
        vec![self]
    }
}
impl ToChildren for Element {
    fn to_children(self) -> Vec<Node> {
        vec![Node::Element(self)]
    }
}
impl ToChildren for &str {
    fn to_children(self) -> Vec<Node> {
        vec![Node::from(self)]
    }
}
impl<const N: usize> ToChildren for [Node; N] {
    fn to_children(self) -> Vec<Node> {
        self.into()
    }
}
impl ToChildren for Vec<Node> {
    fn to_children(self) -> Vec<Node> {
        self
    }
}

/// The composite node. Identity (tag, void-ness) is fixed at
/// construction; children may be appended until the element is
/// rendered. Rendering never mutates, so one tree can be rendered
/// any number of times.
#[derive(Debug, Clone)]
pub struct Element {
    tag: KString,
    void: bool,
    attrs: Vec<(KString, AttrString)>,
    children: Vec<Node>,
}

impl Element {
    /// An empty element; void-ness comes from the metadata table,
    /// unknown tags are non-void custom elements.
    pub fn new(tag: impl Into<KString>) -> Element {
        let tag = tag.into();
        let void = meta::tag_is_void(&tag);
        Element {
            tag,
            void,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A custom element with an explicit void flag.
    pub fn custom(tag: impl Into<KString>, void: bool) -> Element {
        Element {
            tag: tag.into(),
            void,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The general constructor behind the per-tag functions.
    pub fn with(
        tag: impl Into<KString>,
        attrs: impl ToAttrs,
        children: impl ToChildren,
    ) -> Result<Element> {
        let mut el = Element::new(tag);
        el.set_attrs(attrs)?;
        el.append(children)?;
        Ok(el)
    }

    pub fn tag(&self) -> &KString {
        &self.tag
    }

    pub fn is_void(&self) -> bool {
        self.void
    }

    /// Resolved attributes in render order.
    pub fn attrs(&self) -> &[(KString, AttrString)] {
        &self.attrs
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn set_attrs(&mut self, attrs: impl ToAttrs) -> Result<()> {
        for decl in attrs.to_attrs() {
            self.set_attr(decl)?;
        }
        Ok(())
    }

    /// Resolve one declaration into the attribute map. This is the
    /// only path by which attributes enter an element, whichever
    /// input shape they came from.
    ///
    /// `class` and `style` merge (space- and `; `-joined), `id`
    /// overrides, any other repeated name is an error. Output order
    /// is class first, then id, then the rest in first-declaration
    /// order.
    pub fn set_attr(&mut self, decl: AttrDecl) -> Result<()> {
        let AttrDecl { name, value } = decl;
        let resolved = match resolve_attr_value(value) {
            Some(r) => r,
            None => return Ok(()),
        };
        if name == "class" {
            if !self.merge_existing(&name, &resolved, " ") {
                self.attrs.insert(0, (name, resolved));
            }
        } else if name == "style" {
            if !self.merge_existing(&name, &resolved, "; ") {
                self.attrs.push((name, resolved));
            }
        } else if name == "id" {
            match self.attrs.iter().position(|(n, _)| n.as_str() == "id") {
                Some(i) => self.attrs[i].1 = resolved,
                None => {
                    let after_class = self
                        .attrs
                        .first()
                        .map(|(n, _)| n.as_str() == "class")
                        .unwrap_or(false);
                    let pos = if after_class { 1 } else { 0 };
                    self.attrs.insert(pos, (name, resolved));
                }
            }
        } else {
            if self.attrs.iter().any(|(n, _)| *n == name) {
                bail!(HtmlError::DuplicateAttribute {
                    tag: self.tag.clone(),
                    name,
                });
            }
            self.attrs.push((name, resolved));
        }
        Ok(())
    }

    fn merge_existing(&mut self, name: &KString, new: &AttrString, sep: &str) -> bool {
        match self.attrs.iter().position(|(n, _)| n == &*name) {
            Some(i) => {
                let merged = merge_attr_strings(&self.attrs[i].1, new, sep);
                self.attrs[i].1 = merged;
                true
            }
            None => false,
        }
    }

    /// Constructor shorthand for `id`; same resolution path as any
    /// other declaration.
    pub fn id(mut self, value: impl Into<AttrValue>) -> Result<Element> {
        self.set_attr(AttrDecl {
            name: KString::from_static("id"),
            value: value.into(),
        })?;
        Ok(self)
    }

    /// Constructor shorthand for `class`; merges with any class
    /// already declared.
    pub fn class(mut self, value: impl Into<AttrValue>) -> Result<Element> {
        self.set_attr(AttrDecl {
            name: KString::from_static("class"),
            value: value.into(),
        })?;
        Ok(self)
    }

    /// Append children. Fails on void elements.
    pub fn append(&mut self, children: impl ToChildren) -> Result<&mut Element> {
        let nodes = children.to_children();
        if self.void && !nodes.is_empty() {
            bail!(HtmlError::VoidElementChildren {
                tag: self.tag.clone(),
            });
        }
        self.children.extend(nodes);
        Ok(self)
    }
}

fn merge_attr_strings(old: &AttrString, new: &AttrString, sep: &str) -> AttrString {
    match (old, new) {
        (AttrString::Bare, AttrString::Bare) => AttrString::Bare,
        (AttrString::Bare, AttrString::Value(b)) => AttrString::Value(b.clone()),
        (AttrString::Value(a), AttrString::Bare) => AttrString::Value(a.clone()),
        (AttrString::Value(a), AttrString::Value(b)) => {
            AttrString::Value(KString::from_string(format!("{a}{sep}{b}")))
        }
    }
}
