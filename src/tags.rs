//! Per-tag element constructors, one function per element in the
//! metadata table. Void elements take no children argument, so the
//! void-children construction error is unrepresentable through this
//! surface.

use anyhow::Result;

use crate::element::{Element, ToAttrs, ToChildren};

macro_rules! element_fns {
    ($($tag:ident)*) => {$(
        #[doc = concat!("A `<", stringify!($tag), ">` element.")]
        pub fn $tag(attrs: impl ToAttrs, children: impl ToChildren) -> Result<Element> {
            Element::with(stringify!($tag), attrs, children)
        }
    )*};
}

macro_rules! void_element_fns {
    ($($tag:ident)*) => {$(
        #[doc = concat!("A void `<", stringify!($tag), ">` element; no children.")]
        pub fn $tag(attrs: impl ToAttrs) -> Result<Element> {
            Element::with(stringify!($tag), attrs, ())
        }
    )*};
}

element_fns! {
    a abbr address article aside audio b bdi bdo blockquote body button
    canvas caption cite code colgroup data datalist dd del details dfn
    dialog div dl dt em fieldset figcaption figure footer form h1 h2 h3
    h4 h5 h6 head header hgroup html i iframe ins kbd label legend li
    main map mark menu meter nav noscript object ol optgroup option
    output p picture pre progress q rp rt ruby s samp script search
    section select slot small span strong style sub summary sup svg
    table tbody td template textarea tfoot th thead time title tr u ul
    var video
}

void_element_fns! {
    area base br col embed hr img input link meta param source track wbr
}
