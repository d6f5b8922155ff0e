//! Construction and resolution errors.

use kstring::KString;
use thiserror::Error;

/// Programmer errors in tree construction. These are fatal and not
/// meant to be recovered from; they surface through `anyhow::Result`
/// at the construction call site.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HtmlError {
    /// The same non-mergeable attribute name was declared twice on
    /// one element. `class` and `style` merge instead; `id`
    /// overrides instead.
    #[error("duplicate attribute {name:?} on element {tag:?}")]
    DuplicateAttribute { tag: KString, name: KString },

    /// A void element (img, br, ...) was given children, either at
    /// construction or via append.
    #[error("void element {tag:?} cannot have children")]
    VoidElementChildren { tag: KString },
}
