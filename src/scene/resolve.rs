//! Uuid-or-name identifier resolution.
//!
//! Tools and resources accept either a uuid or a display name wherever an
//! entity is referenced. Resolution is explicit: an exact uuid match wins
//! outright; otherwise exact name matches are counted, and a name shared
//! by several entities is reported as ambiguous rather than silently
//! resolved to whichever came first. Callers decide how each outcome
//! surfaces.

use uuid::Uuid;

use crate::scene::model::{Element, Texture};

/// Outcome of a uuid-or-name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<T> {
    /// Exactly one entity matched.
    Found(T),
    /// No entity matched by uuid or name.
    NotFound,
    /// Several entities share the name and none matched by uuid.
    Ambiguous {
        /// How many entities share the name.
        matches: usize,
    },
}

impl<T> Resolution<T> {
    /// Returns the found entity, if any.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(t) => Some(t),
            Self::NotFound | Self::Ambiguous { .. } => None,
        }
    }
}

/// An entity addressable by uuid or display name.
pub trait Identified {
    /// The entity's unique identity.
    fn uuid(&self) -> Uuid;
    /// The entity's display name.
    fn label(&self) -> &str;
}

impl Identified for Element {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn label(&self) -> &str {
        &self.name
    }
}

impl Identified for Texture {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn label(&self) -> &str {
        &self.name
    }
}

/// Resolves `identifier` against `items`: exact uuid match first, then
/// exact name match.
pub fn resolve<'a, T: Identified>(items: &'a [T], identifier: &str) -> Resolution<&'a T> {
    if let Ok(uuid) = Uuid::parse_str(identifier) {
        if let Some(item) = items.iter().find(|i| i.uuid() == uuid) {
            return Resolution::Found(item);
        }
    }

    let mut by_name = items.iter().filter(|i| i.label() == identifier);
    match (by_name.next(), by_name.next()) {
        (Some(only), None) => Resolution::Found(only),
        (Some(_), Some(_)) => Resolution::Ambiguous {
            matches: items.iter().filter(|i| i.label() == identifier).count(),
        },
        (None, _) => Resolution::NotFound,
    }
}
