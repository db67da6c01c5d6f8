//! Class metadata: field layout and inheritance.
//!
//! A [`Class`] is immutable once built. Its layout lists every field of the
//! hierarchy, root-most superclass first, so an instance's slot vector lines
//! up with [`Class::fields`]. A subclass may redeclare a name; lookups by
//! name resolve to the most-derived declaration.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{HeapError, Result};

/// Whether a field can hold a reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Holds a [`LiveObject`](liveref_types::LiveObject) handle.
    Reference,
    /// Holds a plain integer; never traced.
    Primitive,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Primitive => write!(f, "primitive"),
        }
    }
}

/// One field in a class layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name.
    pub name: Arc<str>,
    /// Reference or primitive.
    pub kind: FieldKind,
    /// Name of the class that declared it.
    pub declared_in: Arc<str>,
}

/// Runtime class: name, optional superclass, and full field layout.
#[derive(Debug)]
pub struct Class {
    name: Arc<str>,
    superclass: Option<Arc<Class>>,
    fields: Vec<FieldDef>,
    declared_from: usize,
    reference_slots: Vec<usize>,
}

impl Class {
    /// Start building a class.
    pub fn builder(name: impl Into<Arc<str>>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            superclass: None,
            declared: Vec::new(),
        }
    }

    /// Class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared class name, cheap to clone.
    pub fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    /// Direct superclass, if any.
    pub fn superclass(&self) -> Option<&Arc<Class>> {
        self.superclass.as_ref()
    }

    /// Full layout, inherited fields first.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Fields declared by this class itself.
    pub fn declared_fields(&self) -> &[FieldDef] {
        &self.fields[self.declared_from..]
    }

    /// Layout indices of all reference fields, in layout order.
    pub fn reference_slots(&self) -> &[usize] {
        &self.reference_slots
    }

    /// Layout index of the most-derived field named `name`.
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().rposition(|f| &*f.name == name)
    }

    /// Returns `true` if `self` is `other` or inherits from it.
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if std::ptr::eq(class, other) {
                return true;
            }
            current = class.superclass.as_deref();
        }
        false
    }
}

/// Builder for [`Class`].
#[derive(Debug)]
pub struct ClassBuilder {
    name: Arc<str>,
    superclass: Option<Arc<Class>>,
    declared: Vec<(Arc<str>, FieldKind)>,
}

impl ClassBuilder {
    /// Inherit every field of `superclass`.
    pub fn extends(mut self, superclass: &Arc<Class>) -> Self {
        self.superclass = Some(Arc::clone(superclass));
        self
    }

    /// Declare a field of the given kind.
    pub fn field(mut self, name: impl Into<Arc<str>>, kind: FieldKind) -> Self {
        self.declared.push((name.into(), kind));
        self
    }

    /// Declare a reference field.
    pub fn reference(self, name: impl Into<Arc<str>>) -> Self {
        self.field(name, FieldKind::Reference)
    }

    /// Declare a primitive field.
    pub fn primitive(self, name: impl Into<Arc<str>>) -> Self {
        self.field(name, FieldKind::Primitive)
    }

    /// Finish the class. Fails if a name is declared twice in this class.
    pub fn build(self) -> Result<Arc<Class>> {
        let mut fields: Vec<FieldDef> = self
            .superclass
            .as_ref()
            .map(|s| s.fields.clone())
            .unwrap_or_default();
        let declared_from = fields.len();

        for (i, (name, kind)) in self.declared.iter().enumerate() {
            if self.declared[..i].iter().any(|(n, _)| n == name) {
                return Err(HeapError::DuplicateField {
                    class: self.name.to_string(),
                    field: name.to_string(),
                });
            }
            fields.push(FieldDef {
                name: Arc::clone(name),
                kind: *kind,
                declared_in: Arc::clone(&self.name),
            });
        }

        let reference_slots = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.kind == FieldKind::Reference)
            .map(|(i, _)| i)
            .collect();

        Ok(Arc::new(Class {
            name: self.name,
            superclass: self.superclass,
            fields,
            declared_from,
            reference_slots,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Arc<Class> {
        Class::builder("Base")
            .reference("owner")
            .primitive("id")
            .build()
            .unwrap()
    }

    #[test]
    fn layout_puts_inherited_fields_first() {
        let base = base();
        let derived = Class::builder("Derived")
            .extends(&base)
            .reference("next")
            .primitive("size")
            .build()
            .unwrap();

        let names: Vec<&str> = derived.fields().iter().map(|f| &*f.name).collect();
        assert_eq!(names, ["owner", "id", "next", "size"]);
        assert_eq!(derived.reference_slots(), &[0, 2]);
        assert_eq!(derived.declared_fields().len(), 2);
        assert_eq!(&*derived.fields()[0].declared_in, "Base");
        assert_eq!(&*derived.fields()[2].declared_in, "Derived");
    }

    #[test]
    fn shadowed_field_resolves_to_most_derived() {
        let base = base();
        let derived = Class::builder("Derived")
            .extends(&base)
            .reference("id")
            .build()
            .unwrap();
        assert_eq!(derived.slot_of("id"), Some(2));
        assert_eq!(base.slot_of("id"), Some(1));
        assert_eq!(derived.slot_of("missing"), None);
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let result = Class::builder("Bad").reference("x").primitive("x").build();
        assert!(matches!(result, Err(HeapError::DuplicateField { .. })));
    }

    #[test]
    fn subclass_relation() {
        let base = base();
        let derived = Class::builder("Derived").extends(&base).build().unwrap();
        assert!(derived.is_subclass_of(&base));
        assert!(base.is_subclass_of(&base));
        assert!(!base.is_subclass_of(&derived));
    }
}
