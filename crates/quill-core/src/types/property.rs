//! User-extensible predicates on types and values.
//!
//! A `PropertyTag` is a stable identity (an `Rc` pointer) paired with up to
//! two predicate callbacks. Library code may add new tags; the core never
//! enumerates them. This is the extension mechanism for refinement types
//! without opening the `TypeKind` enum.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use smallvec::SmallVec;

use crate::relate::TypeMatch;
use crate::types::Type;
use crate::value::Value;

/// Predicate applied to candidate types during matching.
pub type TagTypeMatcher = fn(&Type, &[Value]) -> TypeMatch;
/// Predicate applied to values during `check_type`.
pub type TagValueMatcher = fn(&Value, &[Value]) -> bool;

struct PropertyTagData {
    /// Debug only; identity is the pointer, not the name.
    name: String,
    argument_types: Vec<Type>,
    type_matcher: Option<TagTypeMatcher>,
    value_matcher: Option<TagValueMatcher>,
}

/// A named property identity. Compares and hashes by pointer.
#[derive(Clone)]
pub struct PropertyTag(Rc<PropertyTagData>);

impl PropertyTag {
    pub fn new(name: impl Into<String>, argument_types: Vec<Type>) -> Self {
        PropertyTag(Rc::new(PropertyTagData {
            name: name.into(),
            argument_types,
            type_matcher: None,
            value_matcher: None,
        }))
    }

    pub fn with_matchers(
        name: impl Into<String>,
        argument_types: Vec<Type>,
        type_matcher: Option<TagTypeMatcher>,
        value_matcher: Option<TagValueMatcher>,
    ) -> Self {
        PropertyTag(Rc::new(PropertyTagData {
            name: name.into(),
            argument_types,
            type_matcher,
            value_matcher,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn argument_types(&self) -> &[Type] {
        &self.0.argument_types
    }

    pub fn type_matcher(&self) -> Option<TagTypeMatcher> {
        self.0.type_matcher
    }

    pub fn value_matcher(&self) -> Option<TagValueMatcher> {
        self.0.value_matcher
    }
}

impl PartialEq for PropertyTag {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for PropertyTag {}

impl Hash for PropertyTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for PropertyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyTag({})", self.0.name)
    }
}

/// A tag application: the tag plus its argument values.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Property {
    pub tag: PropertyTag,
    pub arguments: Vec<Value>,
}

/// A bag of properties, unique per tag.
///
/// Small by construction (almost always zero or one entry), so it is a
/// linear-scanned inline vector rather than a map. Equality is set
/// equality; hashing is order-independent so it agrees.
#[derive(Clone, Debug, Default)]
pub struct Properties(SmallVec<[Property; 1]>);

impl Properties {
    pub fn new() -> Self {
        Properties(SmallVec::new())
    }

    pub fn single(tag: PropertyTag, arguments: Vec<Value>) -> Self {
        let mut properties = Properties::new();
        properties.insert(tag, arguments);
        properties
    }

    /// Insert or replace the entry for `tag`.
    pub fn insert(&mut self, tag: PropertyTag, arguments: Vec<Value>) {
        if let Some(existing) = self.0.iter_mut().find(|p| p.tag == tag) {
            existing.arguments = arguments;
        } else {
            self.0.push(Property { tag, arguments });
        }
    }

    pub fn get(&self, tag: &PropertyTag) -> Option<&[Value]> {
        self.0
            .iter()
            .find(|p| &p.tag == tag)
            .map(|p| p.arguments.as_slice())
    }

    pub fn has(&self, tag: &PropertyTag) -> bool {
        self.0.iter().any(|p| &p.tag == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Merge `other` into `self`, replacing colliding tags.
    pub fn merge(&mut self, other: &Properties) {
        for property in other.iter() {
            self.insert(property.tag.clone(), property.arguments.clone());
        }
    }
}

impl PartialEq for Properties {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .all(|p| other.get(&p.tag) == Some(p.arguments.as_slice()))
    }
}

impl Eq for Properties {}

impl Hash for Properties {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-independent fold so permuted bags hash alike.
        let mut combined = 0u64;
        for property in &self.0 {
            let mut entry = rustc_hash::FxHasher::default();
            property.hash(&mut entry);
            combined = combined.wrapping_add(entry.finish());
        }
        combined.hash(state);
    }
}

impl FromIterator<(PropertyTag, Vec<Value>)> for Properties {
    fn from_iter<I: IntoIterator<Item = (PropertyTag, Vec<Value>)>>(iter: I) -> Self {
        let mut properties = Properties::new();
        for (tag, arguments) in iter {
            properties.insert(tag, arguments);
        }
        properties
    }
}

// ---------------------------------------------------------------------
// Builtin tags
// ---------------------------------------------------------------------
//
// The two template tags are per-thread singletons: tag payloads hold
// values, which are not Sync, and the execution model is single-threaded.

thread_local! {
    static TEMPLATE: PropertyTag = PropertyTag::new("Template", Vec::new());
    static TYPED_TEMPLATE: PropertyTag = PropertyTag::new("TypedTemplate", Vec::new());
}

/// The `Template` tag: the tagged callable expands raw argument
/// expressions at compile time.
pub fn template_tag() -> PropertyTag {
    TEMPLATE.with(|tag| tag.clone())
}

/// The `TypedTemplate` tag: the tagged callable expands compiled, typed
/// argument statements at compile time.
pub fn typed_template_tag() -> PropertyTag {
    TYPED_TEMPLATE.with(|tag| tag.clone())
}
