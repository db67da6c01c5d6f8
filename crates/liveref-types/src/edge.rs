use std::fmt;
use std::sync::Arc;

/// Label of a single reference from one live object to another.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    /// A named member, possibly inherited.
    Field(Arc<str>),
    /// An array slot.
    Index(usize),
    /// The slot could not be read when it was visited (structural race or
    /// introspection failure). The referenced object is unknown.
    Unresolvable,
}

impl Edge {
    /// Build a field edge from any string-like name.
    pub fn field(name: impl Into<Arc<str>>) -> Self {
        Self::Field(name.into())
    }

    /// Returns `true` for the sentinel label.
    pub fn is_unresolvable(&self) -> bool {
        matches!(self, Self::Unresolvable)
    }

    /// The field name, if this is a field edge.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::Field(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{name}"),
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Unresolvable => write!(f, "<unresolvable>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(Edge::field("next").to_string(), "next");
        assert_eq!(Edge::Index(3).to_string(), "[3]");
        assert_eq!(Edge::Unresolvable.to_string(), "<unresolvable>");
    }

    #[test]
    fn field_name_only_for_fields() {
        assert_eq!(Edge::field("owner").field_name(), Some("owner"));
        assert_eq!(Edge::Index(0).field_name(), None);
        assert!(Edge::Unresolvable.is_unresolvable());
        assert!(!Edge::Index(0).is_unresolvable());
    }
}
