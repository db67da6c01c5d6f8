//! GC root kinds.
//!
//! Roots form the zero-distance frontier of a scan. The set of kinds is
//! closed, so path rendering matches on it exhaustively.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::object::{LiveObject, ObjectKey};

/// A reference the runtime treats as unconditionally live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Root {
    /// A static (process-wide) field.
    StaticField {
        owner: String,
        field: String,
        value: LiveObject,
    },
    /// A local slot in a thread's execution stack.
    ThreadFrame {
        thread: String,
        frame: usize,
        method: String,
        slot: String,
        value: LiveObject,
    },
    /// An object the caller asked to treat as a root.
    ExplicitHint { index: usize, value: LiveObject },
}

/// Discriminant of [`Root`], used by scan configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootKind {
    StaticField,
    ThreadFrame,
    ExplicitHint,
}

impl Root {
    /// Convenience constructor for a static field root.
    pub fn static_field(owner: impl Into<String>, field: impl Into<String>, value: LiveObject) -> Self {
        Self::StaticField {
            owner: owner.into(),
            field: field.into(),
            value,
        }
    }

    /// The object held by this root.
    pub fn object(&self) -> &LiveObject {
        match self {
            Self::StaticField { value, .. }
            | Self::ThreadFrame { value, .. }
            | Self::ExplicitHint { value, .. } => value,
        }
    }

    /// Which kind of root this is.
    pub fn kind(&self) -> RootKind {
        match self {
            Self::StaticField { .. } => RootKind::StaticField,
            Self::ThreadFrame { .. } => RootKind::ThreadFrame,
            Self::ExplicitHint { .. } => RootKind::ExplicitHint,
        }
    }

    /// Human-readable descriptor of where the reference lives.
    pub fn describe(&self) -> String {
        match self {
            Self::StaticField { owner, field, .. } => format!("static {owner}.{field}"),
            Self::ThreadFrame {
                thread,
                frame,
                method,
                slot,
                ..
            } => format!("thread {thread} frame #{frame} ({method}) local {slot}"),
            Self::ExplicitHint { index, .. } => format!("hint #{index}"),
        }
    }

    /// Append `hints` to `runtime` roots and drop every root whose object was
    /// already seen. Null objects are dropped too. Order is preserved, so the
    /// first root describing an object wins.
    pub fn coalesce(runtime: Vec<Root>, hints: &[LiveObject]) -> Vec<Root> {
        let hint_roots = hints
            .iter()
            .enumerate()
            .map(|(index, value)| Root::ExplicitHint {
                index,
                value: value.clone(),
            });

        let mut seen: HashSet<ObjectKey> = HashSet::new();
        runtime
            .into_iter()
            .chain(hint_roots)
            .filter(|root| {
                let key = root.object().key();
                !key.is_null() && seen.insert(key)
            })
            .collect()
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Traced;
    use std::any::Any;
    use std::borrow::Cow;

    struct Blob;

    impl Traced for Blob {
        fn type_name(&self) -> Cow<'_, str> {
            Cow::Borrowed("Blob")
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn descriptors() {
        let obj = LiveObject::new(Blob);
        let s = Root::static_field("App", "INSTANCE", obj.clone());
        assert_eq!(s.describe(), "static App.INSTANCE");
        assert_eq!(s.kind(), RootKind::StaticField);

        let t = Root::ThreadFrame {
            thread: "main".into(),
            frame: 2,
            method: "run".into(),
            slot: "cache".into(),
            value: obj.clone(),
        };
        assert_eq!(t.describe(), "thread main frame #2 (run) local cache");

        let h = Root::ExplicitHint { index: 0, value: obj };
        assert_eq!(h.to_string(), "hint #0");
    }

    #[test]
    fn coalesce_keeps_first_and_appends_hints() {
        let a = LiveObject::new(Blob);
        let b = LiveObject::new(Blob);
        let runtime = vec![
            Root::static_field("App", "A", a.clone()),
            Root::static_field("App", "alias", a.clone()),
            Root::static_field("App", "none", LiveObject::null()),
        ];
        let roots = Root::coalesce(runtime, &[a.clone(), b.clone(), b.clone()]);

        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].describe(), "static App.A");
        assert_eq!(roots[1].kind(), RootKind::ExplicitHint);
        assert_eq!(roots[1].object(), &b);
        assert_eq!(roots[1].describe(), "hint #1");
    }
}
