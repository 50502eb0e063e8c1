//! Key indexes: logical property names to structural storage paths.
//!
//! A node stores properties under short logical names (`properties`,
//! `rawType`). Persisted and cross-referenced content addresses the same
//! property through its *real key*: the navigation path from the repository
//! root to the property's declaration.
//!
//! ```text
//! withKey("meta::pure::metamodel::type::Class", "name")
//!   => Root / children / meta / children / pure / children / metamodel /
//!      children / type / children / Class / properties / name
//! ```
//!
//! Properties contributed by an association replace the `properties` step
//! with `propertiesFromAssociations`.

use crate::error::KeyIndexError;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

pub const ROOT_PACKAGE: &str = "Root";
pub const CHILDREN_STEP: &str = "children";
pub const OWN_PROPERTY_STEP: &str = "properties";
pub const ASSOCIATION_PROPERTY_STEP: &str = "propertiesFromAssociations";
pub const PATH_SEPARATOR: &str = "::";

/// Where a property is declared relative to its owning type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyOrigin {
    Own,
    Association,
}

impl PropertyOrigin {
    fn step(self) -> &'static str {
        match self {
            Self::Own => OWN_PROPERTY_STEP,
            Self::Association => ASSOCIATION_PROPERTY_STEP,
        }
    }
}

/// Structural path resolving a logical property name to its declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RealKey {
    segments: Arc<[Arc<str>]>,
    origin: PropertyOrigin,
}

impl RealKey {
    pub fn segments(&self) -> &[Arc<str>] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn origin(&self) -> PropertyOrigin {
        self.origin
    }

    /// The terminal property name.
    pub fn property_name(&self) -> &str {
        self.segments.last().map_or("", |s| s)
    }
}

impl fmt::Display for RealKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// Path segments leading to an owning type's property steps.
fn owner_prefix(owning_type: &str) -> Vec<Arc<str>> {
    let mut prefix: Vec<Arc<str>> = vec![Arc::from(ROOT_PACKAGE)];
    for element in owning_type
        .split(PATH_SEPARATOR)
        .filter(|element| !element.is_empty())
        .skip_while(|element| *element == ROOT_PACKAGE)
    {
        prefix.push(Arc::from(CHILDREN_STEP));
        prefix.push(Arc::from(element));
    }
    prefix
}

/// Immutable map from logical name to [`RealKey`].
#[derive(Clone, Debug, Default)]
pub struct KeyIndex {
    keys: IndexMap<Arc<str>, RealKey>,
}

impl KeyIndex {
    pub fn builder() -> KeyIndexBuilder {
        KeyIndexBuilder::default()
    }

    /// The structural path registered for `name`.
    pub fn real_key_for(&self, name: &str) -> Result<&RealKey, KeyIndexError> {
        self.keys
            .get(name)
            .ok_or_else(|| KeyIndexError::UnsupportedKey {
                key: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(|k| &**k)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Fluent builder for [`KeyIndex`]. Later registrations of a name replace
/// earlier ones.
#[derive(Clone, Debug, Default)]
pub struct KeyIndexBuilder {
    keys: IndexMap<Arc<str>, RealKey>,
}

impl KeyIndexBuilder {
    /// Register `name` as an own property of `owning_type`.
    pub fn with_key(self, owning_type: &str, name: &str) -> Self {
        self.register(owning_type, PropertyOrigin::Own, &[name])
    }

    /// Register `name` as a property `owning_type` gets through an association.
    pub fn with_key_from_association(self, owning_type: &str, name: &str) -> Self {
        self.register(owning_type, PropertyOrigin::Association, &[name])
    }

    /// Register several names that share every path segment but the last.
    pub fn with_keys(self, owning_type: &str, names: &[&str]) -> Self {
        self.register(owning_type, PropertyOrigin::Own, names)
    }

    fn register(mut self, owning_type: &str, origin: PropertyOrigin, names: &[&str]) -> Self {
        let mut prefix = owner_prefix(owning_type);
        prefix.push(Arc::from(origin.step()));
        for &name in names {
            let mut segments = prefix.clone();
            segments.push(Arc::from(name));
            self.keys.insert(
                Arc::from(name),
                RealKey {
                    segments: segments.into(),
                    origin,
                },
            );
        }
        self
    }

    pub fn build(self) -> KeyIndex {
        KeyIndex { keys: self.keys }
    }
}

#[cfg(test)]
#[path = "../tests/key_index_tests.rs"]
mod tests;
