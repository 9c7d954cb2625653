//! Rewriting sprite references held elsewhere, e.g. swapping loose textures for their packed
//! counterparts once an atlas has been built.
//!
//! Only a closed set of field shapes is supported: a single reference, a list of values and
//! [`SpriteField`] trees. Containers of your own can implement [`SpriteReferences`] by
//! delegating to their fields.
use crate::model::SourceRef;
use crate::registry::AtlasRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Direction of a replacement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceMode {
    /// Source references are replaced by the atlas sub-image they were packed into.
    #[default]
    SourceWithAtlas,
    /// Atlas sub-image references are replaced by the source they were packed from.
    AtlasWithSource,
}

impl FromStr for ReplaceMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "source_with_atlas" | "to_atlas" => Ok(Self::SourceWithAtlas),
            "atlas_with_source" | "to_source" => Ok(Self::AtlasWithSource),
            _ => Err(()),
        }
    }
}

pub type ReplacementMap = HashMap<SourceRef, SourceRef>;

/// Replacement pairs for every entry of `registry` that has both a source and a target.
pub fn replacement_pairs(registry: &AtlasRegistry, mode: ReplaceMode) -> ReplacementMap {
    registry
        .entries()
        .iter()
        .filter_map(|e| {
            let source = e.source.clone()?;
            let packed = SourceRef::SubImage(e.target.clone()?);
            Some(match mode {
                ReplaceMode::SourceWithAtlas => (source, packed),
                ReplaceMode::AtlasWithSource => (packed, source),
            })
        })
        .collect()
}

/// Something holding sprite references that can be inspected and rewritten.
pub trait SpriteReferences {
    /// Calls `visit` for every reference held.
    fn scan(&self, visit: &mut dyn FnMut(&SourceRef));
    /// Rewrites references found in `map`; returns how many were replaced.
    fn replace(&mut self, map: &ReplacementMap) -> usize;
}

impl SpriteReferences for SourceRef {
    fn scan(&self, visit: &mut dyn FnMut(&SourceRef)) {
        visit(self);
    }

    fn replace(&mut self, map: &ReplacementMap) -> usize {
        match map.get(self) {
            Some(to) if to != self => {
                *self = to.clone();
                1
            }
            _ => 0,
        }
    }
}

impl<T: SpriteReferences> SpriteReferences for Option<T> {
    fn scan(&self, visit: &mut dyn FnMut(&SourceRef)) {
        if let Some(v) = self {
            v.scan(visit);
        }
    }

    fn replace(&mut self, map: &ReplacementMap) -> usize {
        self.as_mut().map_or(0, |v| v.replace(map))
    }
}

impl<T: SpriteReferences> SpriteReferences for Vec<T> {
    fn scan(&self, visit: &mut dyn FnMut(&SourceRef)) {
        for v in self {
            v.scan(visit);
        }
    }

    fn replace(&mut self, map: &ReplacementMap) -> usize {
        self.iter_mut().map(|v| v.replace(map)).sum()
    }
}

/// A field that holds sprite references, possibly nested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SpriteField {
    Single(Option<SourceRef>),
    List(Vec<Option<SourceRef>>),
    /// A value type with several reference fields of its own.
    Group(Vec<SpriteField>),
}

impl SpriteReferences for SpriteField {
    fn scan(&self, visit: &mut dyn FnMut(&SourceRef)) {
        match self {
            Self::Single(r) => r.scan(visit),
            Self::List(rs) => rs.scan(visit),
            Self::Group(fields) => fields.scan(visit),
        }
    }

    fn replace(&mut self, map: &ReplacementMap) -> usize {
        match self {
            // Option has an inherent `replace`
            Self::Single(r) => SpriteReferences::replace(r, map),
            Self::List(rs) => rs.replace(map),
            Self::Group(fields) => fields.replace(map),
        }
    }
}

/// Number of references in `value` that `map` would replace.
pub fn count_replaceable(value: &dyn SpriteReferences, map: &ReplacementMap) -> usize {
    let mut n = 0;
    value.scan(&mut |r| {
        if map.get(r).is_some_and(|to| to != r) {
            n += 1;
        }
    });
    n
}

