//! Metadata about HTML elements: the known tag names and which of
//! them are void (self-closing, no children).
//!
//! The data ships as a JSON table embedded in the binary; setting
//! `HTWEAVE_META_DB_JSON` to a file path loads a replacement table at
//! startup instead, which is how downstream code generators test
//! tweaked tag sets without a rebuild.

use std::{collections::HashMap, env, fmt::Display, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};
use kstring::KString;
use lazy_static::lazy_static;
use serde::Deserialize;

const ELEMENTS_JSON: &str = include_str!("../data/elements.json");

pub const META_DB_JSON_VAR: &str = "HTWEAVE_META_DB_JSON";

#[derive(Debug, Clone, Deserialize)]
pub struct ElementMeta {
    pub tag_name: KString,
    /// Void elements never have children and serialize as a single
    /// self-closing tag.
    #[serde(default)]
    pub void: bool,
}

#[derive(Debug)]
pub struct MetaDb {
    elements: HashMap<KString, ElementMeta>,
}

impl MetaDb {
    pub fn from_json_str(json: &str) -> Result<MetaDb> {
        let list: Vec<ElementMeta> =
            serde_json::from_str(json).context("parsing element metadata JSON")?;
        let mut elements = HashMap::with_capacity(list.len());
        for elt in list {
            if elements.insert(elt.tag_name.clone(), elt).is_some() {
                bail!("element metadata JSON contains a duplicate tag entry");
            }
        }
        Ok(MetaDb { elements })
    }

    pub fn get(&self, tag_name: &str) -> Option<&ElementMeta> {
        self.elements.get(tag_name)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }
}

// once again, generic env accessor
pub(crate) fn opt_get_env<T: FromStr>(varname: &str) -> Result<Option<T>>
where
    T::Err: Display,
{
    match env::var(varname) {
        Ok(s) => Ok(Some(s.parse().map_err(|e| {
            anyhow!("could not parse {varname:?} env var with contents {s:?}: {e}")
        })?)),
        Err(e) => match e {
            env::VarError::NotPresent => Ok(None),
            env::VarError::NotUnicode(_) => {
                bail!("could not decode {varname:?} env var: {e}")
            }
        },
    }
}

fn read_meta_db() -> Result<MetaDb> {
    if let Some(path) = opt_get_env::<String>(META_DB_JSON_VAR)? {
        log::debug!("reading element metadata db from {path:?}");
        let json = std::fs::read_to_string(&path)
            .with_context(|| anyhow!("reading element metadata db from {path:?}"))?;
        MetaDb::from_json_str(&json)
    } else {
        MetaDb::from_json_str(ELEMENTS_JSON)
    }
}

lazy_static! {
    pub static ref METADB: MetaDb =
        read_meta_db().expect("element metadata db should load");
}

/// Whether `tag_name` names a void element. Unknown (custom) tags are
/// not void.
pub fn tag_is_void(tag_name: &str) -> bool {
    METADB.get(tag_name).map(|m| m.void).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_void_lookup() {
        assert!(tag_is_void("img"));
        assert!(tag_is_void("br"));
        assert!(tag_is_void("meta"));
        assert!(!tag_is_void("div"));
        assert!(!tag_is_void("script"));
        // unknown tags default to non-void
        assert!(!tag_is_void("x-custom"));
    }

    #[test]
    fn t_embedded_table_parses() {
        let db = MetaDb::from_json_str(ELEMENTS_JSON).unwrap();
        assert!(db.len() > 100);
        assert!(db.get("a").is_some());
        assert!(db.get("template").is_some());
    }
}
