//! Lazy HTML tree composition with escaping and streaming
//! serialization.
//!
//! Trees are built from heterogeneous nodes: text, numbers,
//! booleans, nested sequences, deferred thunks and raw markup.
//! Child text is always escaped; `unsafe_text` is the explicit
//! opt-out. Rendering resolves the tree in document order, either
//! eagerly into one string or lazily as a pull-based fragment
//! stream, so a response can start before late-bound children are
//! computed.
//!
//! ```
//! use htweave::{att, tags::{a, div, strong}};
//!
//! let user = "github wanderer";
//! let el = div([att("class", "profile")], [
//!     strong((), user)?.into(),
//!     a([att("href", "/logout")], "Log out")?.into(),
//! ])?;
//! assert_eq!(
//!     el.render()?,
//!     "<div class=\"profile\"><strong>github wanderer</strong>\
//!      <a href=\"/logout\">Log out</a></div>",
//! );
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod attr;
pub mod document;
pub mod element;
pub mod error;
pub mod escape;
pub mod meta;
pub mod node;
pub mod render;
pub mod resolve;
pub mod tags;

pub use attr::{att, opt_att, AttrDecl, AttrString, AttrValue, Pred, TokenPart};
pub use document::{doctype, html5_document, html5_tree};
pub use element::{Element, ToAttrs, ToChildren};
pub use error::HtmlError;
pub use escape::{
    escape_str, escape_text, unsafe_text, SafeHtml, DEFAULT_FLOAT_PRECISION,
};
pub use node::{
    raw, raw_source, text, thunk, thunk_scoped, thunk_self, Node, RawHtml, Thunk,
};
pub use render::{FragmentStream, Renderer, DEFAULT_ATTR_CACHE_CAPACITY};
pub use resolve::{Deferred, Fragment, Resolver, Scope};

pub const NBSP: &str = "\u{00A0}";
