//! Attribute declarations and their resolution into strings.
//!
//! An attribute starts life as an `AttrValue` (the declared,
//! not-yet-resolved value) and is resolved at element construction
//! time into either nothing, a bare name, or a name/value pair.
//! Escaping of the value happens later, exactly once, at render.

use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use kstring::KString;

/// One token of a `List` value; thunk tokens are invoked during
/// resolution.
#[derive(Clone)]
pub enum TokenPart {
    Text(KString),
    Thunk(Arc<dyn Fn() -> KString>),
}

impl TokenPart {
    pub fn computed(f: impl Fn() -> KString + 'static) -> TokenPart {
        TokenPart::Thunk(Arc::new(f))
    }

    fn resolve(&self) -> KString {
        match self {
            TokenPart::Text(s) => s.clone(),
            TokenPart::Thunk(f) => f(),
        }
    }
}

impl From<&str> for TokenPart {
    fn from(s: &str) -> Self {
        TokenPart::Text(KString::from_ref(s))
    }
}
impl From<String> for TokenPart {
    fn from(s: String) -> Self {
        TokenPart::Text(KString::from_string(s))
    }
}
impl From<KString> for TokenPart {
    fn from(s: KString) -> Self {
        TokenPart::Text(s)
    }
}

impl fmt::Debug for TokenPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenPart::Text(s) => write!(f, "TokenPart::Text({s:?})"),
            TokenPart::Thunk(_) => f.write_str("TokenPart::Thunk(..)"),
        }
    }
}

/// The predicate of a `Map` entry; the key is kept when the
/// predicate is (or computes to) true.
#[derive(Clone)]
pub enum Pred {
    Bool(bool),
    Thunk(Arc<dyn Fn() -> bool>),
}

impl Pred {
    pub fn computed(f: impl Fn() -> bool + 'static) -> Pred {
        Pred::Thunk(Arc::new(f))
    }

    fn holds(&self) -> bool {
        match self {
            Pred::Bool(b) => *b,
            Pred::Thunk(f) => f(),
        }
    }
}

impl From<bool> for Pred {
    fn from(b: bool) -> Self {
        Pred::Bool(b)
    }
}

impl fmt::Debug for Pred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pred::Bool(b) => write!(f, "Pred::Bool({b})"),
            Pred::Thunk(_) => f.write_str("Pred::Thunk(..)"),
        }
    }
}

/// A declared attribute value. Resolution is a pure function of this
/// value (see `resolve_attr_value`); thunks are invoked eagerly at
/// element construction, never carried to render time.
#[derive(Clone)]
pub enum AttrValue {
    /// Omit the attribute entirely.
    None,
    /// `true` emits the bare attribute name, `false` omits it.
    Bool(bool),
    Text(KString),
    Int(i64),
    /// Space-joined token list.
    List(Vec<TokenPart>),
    /// Space-joined keys whose predicate holds, in declaration order.
    Map(Vec<(KString, Pred)>),
    /// Deferred value; invoked at resolution, chains allowed.
    Thunk(Arc<dyn Fn() -> AttrValue>),
}

impl AttrValue {
    pub fn deferred(f: impl Fn() -> AttrValue + 'static) -> AttrValue {
        AttrValue::Thunk(Arc::new(f))
    }

    pub fn tokens<T: Into<TokenPart>>(parts: impl IntoIterator<Item = T>) -> AttrValue {
        AttrValue::List(parts.into_iter().map(Into::into).collect())
    }

    pub fn toggles<K: Into<KString>, P: Into<Pred>>(
        entries: impl IntoIterator<Item = (K, P)>,
    ) -> AttrValue {
        AttrValue::Map(
            entries
                .into_iter()
                .map(|(k, p)| (k.into(), p.into()))
                .collect(),
        )
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::None => f.write_str("AttrValue::None"),
            AttrValue::Bool(b) => write!(f, "AttrValue::Bool({b})"),
            AttrValue::Text(s) => write!(f, "AttrValue::Text({s:?})"),
            AttrValue::Int(i) => write!(f, "AttrValue::Int({i})"),
            AttrValue::List(parts) => write!(f, "AttrValue::List({parts:?})"),
            AttrValue::Map(entries) => write!(f, "AttrValue::Map({entries:?})"),
            AttrValue::Thunk(_) => f.write_str("AttrValue::Thunk(..)"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(KString::from_ref(s))
    }
}
impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(KString::from_string(s))
    }
}
impl From<KString> for AttrValue {
    fn from(s: KString) -> Self {
        AttrValue::Text(s)
    }
}
impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}
impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}
impl From<i32> for AttrValue {
    fn from(i: i32) -> Self {
        AttrValue::Int(i as i64)
    }
}
impl From<u32> for AttrValue {
    fn from(i: u32) -> Self {
        AttrValue::Int(i as i64)
    }
}
impl<T: Into<TokenPart>, const N: usize> From<[T; N]> for AttrValue {
    fn from(parts: [T; N]) -> Self {
        AttrValue::tokens(parts)
    }
}
impl<T: Into<TokenPart>> From<Vec<T>> for AttrValue {
    fn from(parts: Vec<T>) -> Self {
        AttrValue::tokens(parts)
    }
}

/// A resolved attribute as stored on an element: either the bare
/// boolean-attribute form, or a raw (escaped-at-render) value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrString {
    Bare,
    Value(KString),
}

/// A named attribute declaration, the unit the element constructors
/// consume. Typed attribute builders elsewhere produce these; inline
/// code uses `att`/`opt_att`.
#[derive(Debug, Clone)]
pub struct AttrDecl {
    pub name: KString,
    pub value: AttrValue,
}

pub fn att(name: impl Into<KString>, value: impl Into<AttrValue>) -> Option<AttrDecl> {
    Some(AttrDecl {
        name: name.into(),
        value: value.into(),
    })
}

pub fn opt_att<V: Into<AttrValue>>(
    name: impl Into<KString>,
    value: Option<V>,
) -> Option<AttrDecl> {
    value.map(|value| AttrDecl {
        name: name.into(),
        value: value.into(),
    })
}

/// The single resolution path for every attribute input shape.
///
/// `None` and `false` omit; `true` collapses to the bare name;
/// strings and integers stringify; lists space-join their tokens;
/// maps space-join their truthy keys; deferred values are invoked
/// (chains followed) and the result re-resolved. A list or map that
/// resolves to no tokens at all is omitted, matching the class
/// handling of the source ecosystem.
pub fn resolve_attr_value(value: AttrValue) -> Option<AttrString> {
    let mut value = value;
    loop {
        return match value {
            AttrValue::None | AttrValue::Bool(false) => None,
            AttrValue::Bool(true) => Some(AttrString::Bare),
            AttrValue::Text(s) => Some(AttrString::Value(s)),
            AttrValue::Int(i) => Some(AttrString::Value(KString::from_string(i.to_string()))),
            AttrValue::List(parts) => {
                let joined = parts.iter().map(|p| p.resolve()).join(" ");
                if joined.is_empty() {
                    None
                } else {
                    Some(AttrString::Value(KString::from_string(joined)))
                }
            }
            AttrValue::Map(entries) => {
                let joined = entries
                    .iter()
                    .filter(|(_, pred)| pred.holds())
                    .map(|(k, _)| k.as_str())
                    .join(" ");
                if joined.is_empty() {
                    None
                } else {
                    Some(AttrString::Value(KString::from_string(joined)))
                }
            }
            AttrValue::Thunk(f) => {
                value = f();
                continue;
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn val(v: impl Into<AttrValue>) -> Option<AttrString> {
        resolve_attr_value(v.into())
    }

    #[test]
    fn t_omit_and_bare() {
        assert_eq!(resolve_attr_value(AttrValue::None), None);
        assert_eq!(val(false), None);
        assert_eq!(val(true), Some(AttrString::Bare));
    }

    #[test]
    fn t_scalars() {
        assert_eq!(
            val("btn"),
            Some(AttrString::Value(KString::from_static("btn")))
        );
        assert_eq!(val(3), Some(AttrString::Value(KString::from_static("3"))));
        // explicit empty text stays, unlike an empty token list
        assert_eq!(val(""), Some(AttrString::Value(KString::from_static(""))));
    }

    #[test]
    fn t_token_list() {
        assert_eq!(
            val(["btn", "btn-primary"]),
            Some(AttrString::Value(KString::from_static("btn btn-primary")))
        );
        let v = AttrValue::List(vec![
            TokenPart::from("btn"),
            TokenPart::computed(|| KString::from_static("active")),
        ]);
        assert_eq!(
            resolve_attr_value(v),
            Some(AttrString::Value(KString::from_static("btn active")))
        );
        assert_eq!(resolve_attr_value(AttrValue::tokens(Vec::<&str>::new())), None);
    }

    #[test]
    fn t_toggle_map() {
        let v = AttrValue::toggles([
            ("btn", Pred::from(true)),
            ("hidden", Pred::from(false)),
            ("active", Pred::computed(|| true)),
        ]);
        assert_eq!(
            resolve_attr_value(v),
            Some(AttrString::Value(KString::from_static("btn active")))
        );
        let none = AttrValue::toggles([("hidden", false)]);
        assert_eq!(resolve_attr_value(none), None);
    }

    #[test]
    fn t_deferred_chain() {
        let v = AttrValue::deferred(|| AttrValue::deferred(|| AttrValue::from("late")));
        assert_eq!(
            resolve_attr_value(v),
            Some(AttrString::Value(KString::from_static("late")))
        );
    }

    #[test]
    fn t_opt_att() {
        assert!(opt_att("href", None::<&str>).is_none());
        let decl = opt_att("href", Some("/x")).unwrap();
        assert_eq!(decl.name.as_str(), "href");
    }
}
