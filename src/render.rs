//! Rendering: eager concatenation to a string, or a lazy fragment
//! stream for incremental transmission.

use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Result;
use kstring::KString;

use crate::attr::AttrString;
use crate::element::Element;
use crate::escape::{escape_into, DEFAULT_FLOAT_PRECISION};
use crate::node::{Node, Thunk};
use crate::resolve::{Fragment, Resolver, Scope};

/// Default bound of the attribute-fragment cache, matching the
/// memoization bound of the source ecosystem.
pub const DEFAULT_ATTR_CACHE_CAPACITY: usize = 500;

/// Bounded memoization of serialized `name="escaped"` attribute
/// fragments, keyed by name and escaped value. Pure memoization: a
/// hit and a miss produce identical output. Insertion stops at
/// capacity.
struct AttrCache {
    capacity: usize,
    map: HashMap<(KString, KString), KString>,
}

impl AttrCache {
    fn new(capacity: usize) -> AttrCache {
        AttrCache {
            capacity,
            map: HashMap::new(),
        }
    }
}

/// Serialization settings plus per-instance scratch state. Renders
/// are stateless and deterministic with respect to output; the cache
/// only short-circuits repeated attribute serialization.
pub struct Renderer {
    float_precision: u32,
    attr_cache: RefCell<AttrCache>,
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new()
    }
}

impl Renderer {
    pub fn new() -> Renderer {
        Renderer {
            float_precision: DEFAULT_FLOAT_PRECISION,
            attr_cache: RefCell::new(AttrCache::new(DEFAULT_ATTR_CACHE_CAPACITY)),
        }
    }

    /// Decimal places for float children (default
    /// `DEFAULT_FLOAT_PRECISION`).
    pub fn with_float_precision(mut self, precision: u32) -> Renderer {
        self.float_precision = precision;
        self
    }

    pub fn with_attr_cache_capacity(self, capacity: usize) -> Renderer {
        Renderer {
            attr_cache: RefCell::new(AttrCache::new(capacity)),
            ..self
        }
    }

    pub(crate) fn float_precision(&self) -> u32 {
        self.float_precision
    }

    /// The two-pass core: walk `element`, yielding fragments. With
    /// `call_thunks` off, thunks come out as `Fragment::Deferred`
    /// for a later pass.
    pub fn resolve<'t>(&'t self, element: &'t Element, call_thunks: bool) -> Resolver<'t> {
        Resolver::for_element(self, element, None, call_thunks)
    }

    pub fn resolve_with_parent<'t>(
        &'t self,
        element: &'t Element,
        parent: Option<&'t Element>,
        call_thunks: bool,
    ) -> Resolver<'t> {
        Resolver::for_element(self, element, parent, call_thunks)
    }

    /// Eager render of the whole tree, thunks included.
    pub fn render(&self, element: &Element) -> Result<String> {
        self.render_with_parent(element, None)
    }

    pub fn render_with_parent(
        &self,
        element: &Element,
        parent: Option<&Element>,
    ) -> Result<String> {
        collect_eager(Resolver::for_element(self, element, parent, true))
    }

    /// Render a bare node (or sequence of nodes) outside any
    /// element.
    pub fn render_node(&self, node: &Node) -> Result<String> {
        self.render_node_scoped(node, Scope::detached())
    }

    pub(crate) fn render_node_scoped(&self, node: &Node, scope: Scope<'_>) -> Result<String> {
        collect_eager(Resolver::for_node(self, node, scope, true))
    }

    /// Invoke a thunk (chasing chains) and render the resulting
    /// subtree. Used for every thunk the eager walk reaches, and for
    /// pass two of the deferred mode.
    pub(crate) fn render_thunk(&self, thunk: &Thunk, scope: Scope<'_>) -> Result<String> {
        log::trace!(
            "invoking thunk in <{}>",
            scope.element.map(|e| e.tag().as_str()).unwrap_or("-")
        );
        let mut current = thunk.clone();
        let node = loop {
            match current.invoke(scope.element, scope.parent)? {
                Node::Thunk(next) => current = next,
                other => break other,
            }
        };
        self.render_node_scoped(&node, scope)
    }

    /// Lazy single-pass fragment stream in strict document order; a
    /// consumer may transmit early fragments before later ones are
    /// computed. The tree cannot be mutated while the stream borrows
    /// it.
    pub fn stream<'t>(&'t self, element: &'t Element) -> FragmentStream<'t> {
        FragmentStream {
            inner: Resolver::for_element(self, element, None, true),
        }
    }

    /// The serialized opening tag of `element`, attributes in render
    /// order, `/>`-terminated for void elements. No space before `>`
    /// when there are no attributes.
    pub(crate) fn open_tag(&self, element: &Element) -> String {
        let mut out = String::with_capacity(element.tag().len() + 2);
        out.push('<');
        out.push_str(element.tag().as_str());
        for (name, value) in element.attrs() {
            out.push(' ');
            match value {
                AttrString::Bare => escape_into(&mut out, name.as_str()),
                AttrString::Value(v) => out.push_str(self.attr_fragment(name, v).as_str()),
            }
        }
        if element.is_void() {
            out.push_str("/>");
        } else {
            out.push('>');
        }
        out
    }

    fn attr_fragment(&self, name: &KString, value: &KString) -> KString {
        let mut escaped = String::with_capacity(value.len());
        escape_into(&mut escaped, value.as_str());
        let key = (name.clone(), KString::from_string(escaped));
        let mut cache = self.attr_cache.borrow_mut();
        if let Some(hit) = cache.map.get(&key) {
            return hit.clone();
        }
        let mut out = String::with_capacity(name.len() + key.1.len() + 3);
        escape_into(&mut out, name.as_str());
        out.push_str("=\"");
        out.push_str(key.1.as_str());
        out.push('"');
        let fragment = KString::from_string(out);
        if cache.map.len() < cache.capacity {
            cache.map.insert(key, fragment.clone());
        }
        fragment
    }
}

fn collect_eager(resolver: Resolver<'_>) -> Result<String> {
    let mut out = String::new();
    for fragment in resolver {
        match fragment? {
            Fragment::Text(s) => out.push_str(s.as_str()),
            Fragment::Deferred(_) => {
                unreachable!("eager resolution yields no deferred fragments")
            }
        }
    }
    Ok(out)
}

/// Iterator of owned string fragments, for streaming consumers.
pub struct FragmentStream<'t> {
    inner: Resolver<'t>,
}

impl<'t> Iterator for FragmentStream<'t> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next()? {
            Ok(Fragment::Text(s)) => Some(Ok(s.as_str().to_owned())),
            Ok(Fragment::Deferred(_)) => {
                unreachable!("eager resolution yields no deferred fragments")
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl Element {
    /// Render with default settings.
    pub fn render(&self) -> Result<String> {
        Renderer::new().render(self)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::attr::att;
    use crate::escape::unsafe_text;
    use crate::node::{raw, raw_source, text, thunk, thunk_scoped, thunk_self, RawHtml};
    use crate::tags::{div, img, section, span};

    struct Icon(&'static str);

    impl RawHtml for Icon {
        fn raw_html(&self) -> crate::escape::SafeHtml {
            unsafe_text(format!("<svg data-icon=\"{}\"/>", self.0))
        }
    }

    #[test]
    fn t_concrete_nesting_scenario() {
        let el = div(
            [att("id", "a")],
            [
                img([att("src", "x.png")]).unwrap().into(),
                div((), div((), div((), "hi").unwrap()).unwrap())
                    .unwrap()
                    .into(),
            ],
        )
        .unwrap();
        assert_eq!(
            el.render().unwrap(),
            "<div id=\"a\"><img src=\"x.png\"/><div><div><div>hi</div></div></div></div>"
        );
    }

    #[test]
    fn t_no_space_without_attrs() {
        assert_eq!(div((), ()).unwrap().render().unwrap(), "<div></div>");
        assert_eq!(img(()).unwrap().render().unwrap(), "<img/>");
    }

    #[test]
    fn t_xss_escaped_and_unsafe_bypass() {
        let payload = "<script src=https://example.com/evil.js></script>";
        let escaped = div((), payload).unwrap().render().unwrap();
        assert!(!escaped.contains(payload));
        assert!(escaped.contains("&lt;script"));
        let trusted = div((), raw(unsafe_text(payload))).unwrap().render().unwrap();
        assert_eq!(trusted, format!("<div>{payload}</div>"));
    }

    #[test]
    fn t_deep_flatten() {
        // [[["a"], "b"], "c"] renders like ["a", "b", "c"]
        let nested = div(
            (),
            [
                Node::Seq(vec![
                    Node::Seq(vec![text("a")]),
                    text("b"),
                ]),
                text("c"),
            ],
        )
        .unwrap();
        let flat = div((), [text("a"), text("b"), text("c")]).unwrap();
        assert_eq!(nested.render().unwrap(), flat.render().unwrap());
        assert_eq!(nested.render().unwrap(), "<div>abc</div>");
    }

    #[test]
    fn t_null_silence_everywhere() {
        let el = div(
            (),
            [
                Node::None,
                Node::Seq(vec![Node::None, Node::Seq(vec![Node::None])]),
                thunk(|| Ok(Node::None)),
            ],
        )
        .unwrap();
        assert_eq!(el.render().unwrap(), "<div></div>");
    }

    #[test]
    fn t_bool_children_render_literal_words() {
        let el = div((), [Node::from(true), text(" "), Node::from(false)]).unwrap();
        assert_eq!(el.render().unwrap(), "<div>true false</div>");
    }

    #[test]
    fn t_numbers() {
        let el = div((), [Node::from(7), text(" "), Node::from(19.0 / 3.0)]).unwrap();
        assert_eq!(el.render().unwrap(), "<div>7 6.33</div>");
        let wide = Renderer::new().with_float_precision(4);
        assert_eq!(wide.render(&el).unwrap(), "<div>7 6.3333</div>");
    }

    #[test]
    fn t_thunk_chain_resolves_to_escaped_literal() {
        let el = div((), thunk(|| Ok(thunk(|| Ok(text("<late>")))))).unwrap();
        assert_eq!(el.render().unwrap(), "<div>&lt;late&gt;</div>");
    }

    #[test]
    fn t_thunks_see_self_and_parent() {
        let mut el = div((), ()).unwrap();
        el.append([
            text("text"),
            thunk_self(|x| {
                Ok(div(
                    (),
                    [text(x.tag().clone()), thunk_self(|y| Ok(text(y.tag().clone())))],
                )?
                .into())
            }),
        ])
        .unwrap();
        assert_eq!(el.render().unwrap(), "<div>text<div>divdiv</div></div>");

        let outer = section(
            (),
            div(
                (),
                thunk_scoped(|el, parent| {
                    let parent_tag =
                        parent.map(|p| p.tag().as_str()).unwrap_or("-");
                    Ok(text(format!("{}/{}", el.tag(), parent_tag)))
                }),
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(
            outer.render().unwrap(),
            "<section><div>div/section</div></section>"
        );
    }

    #[test]
    fn t_rerender_reinvokes_thunks() {
        let count = Rc::new(Cell::new(0u32));
        let seen = count.clone();
        let el = div(
            (),
            thunk(move || {
                seen.set(seen.get() + 1);
                Ok(text("x"))
            }),
        )
        .unwrap();
        let r = Renderer::new();
        assert_eq!(r.render(&el).unwrap(), "<div>x</div>");
        assert_eq!(r.render(&el).unwrap(), "<div>x</div>");
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn t_stream_is_lazy_and_ordered() {
        let count = Rc::new(Cell::new(0u32));
        let seen = count.clone();
        let el = div(
            (),
            [
                text("a"),
                thunk(move || {
                    seen.set(seen.get() + 1);
                    Ok(text("b"))
                }),
                text("c"),
            ],
        )
        .unwrap();
        let r = Renderer::new();
        let mut stream = r.stream(&el);
        assert_eq!(stream.next().unwrap().unwrap(), "<div>");
        assert_eq!(stream.next().unwrap().unwrap(), "a");
        // the thunk has not run while only earlier fragments were
        // pulled
        assert_eq!(count.get(), 0);
        assert_eq!(stream.next().unwrap().unwrap(), "b");
        assert_eq!(count.get(), 1);
        let rest: Vec<String> =
            stream.map(|f| f.unwrap()).collect();
        assert_eq!(rest, vec!["c", "</div>"]);
    }

    #[test]
    fn t_stream_concatenates_to_render() {
        let el = div(
            [att("class", "x")],
            [text("a"), span((), "b").unwrap().into(), Node::from(5)],
        )
        .unwrap();
        let r = Renderer::new();
        let streamed: String = r
            .stream(&el)
            .collect::<Result<Vec<String>>>()
            .unwrap()
            .concat();
        assert_eq!(streamed, r.render(&el).unwrap());
    }

    #[test]
    fn t_attr_values_escaped_once_at_render() {
        let el = div([att("title", "a \"quoted\" & <tag>")], ()).unwrap();
        assert_eq!(
            el.render().unwrap(),
            "<div title=\"a &quot;quoted&quot; &amp; &lt;tag&gt;\"></div>"
        );
    }

    #[test]
    fn t_attr_cache_bounded_and_transparent() {
        let r = Renderer::new().with_attr_cache_capacity(1);
        let el = div(
            [att("class", "x"), att("id", "i"), att("title", "t")],
            (),
        )
        .unwrap();
        let first = r.render(&el).unwrap();
        let second = r.render(&el).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "<div class=\"x\" id=\"i\" title=\"t\"></div>");
    }

    #[test]
    fn t_raw_markup_source_capability() {
        let el = div((), raw_source(Icon("menu"))).unwrap();
        assert_eq!(
            el.render().unwrap(),
            "<div><svg data-icon=\"menu\"/></div>"
        );
    }

    #[test]
    fn t_failing_thunk_aborts() {
        let el = div(
            (),
            [text("ok"), thunk(|| anyhow::bail!("boom")), text("never")],
        )
        .unwrap();
        assert!(el.render().is_err());
    }
}
