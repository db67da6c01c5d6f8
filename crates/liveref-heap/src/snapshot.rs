//! JSON heap snapshots.
//!
//! A [`HeapSnapshot`] describes classes, objects, statics and thread stacks
//! by name. [`HeapSnapshot::materialize`] builds the live graph in two
//! passes: allocate every object, then wire references by id, so cycles and
//! forward references need no special ordering. Classes must be declared
//! after their superclass.
//!
//! ```json
//! {
//!   "classes": [{ "name": "Node", "fields": [{ "name": "next", "kind": "reference" }] }],
//!   "objects": [
//!     { "kind": "instance", "id": "a", "class": "Node", "fields": { "next": "b" } },
//!     { "kind": "instance", "id": "b", "class": "Node" }
//!   ],
//!   "statics": [{ "owner": "App", "field": "HEAD", "object": "a" }]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use liveref_types::LiveObject;

use crate::array::ArrayObject;
use crate::boxed::BoxedValue;
use crate::class::{Class, FieldKind};
use crate::error::{HeapError, Result};
use crate::heap::{Heap, ThreadGuard};
use crate::instance::Instance;

/// Declarative description of a heap.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeapSnapshot {
    #[serde(default)]
    pub classes: Vec<ClassSpec>,
    #[serde(default)]
    pub objects: Vec<ObjectSpec>,
    #[serde(default)]
    pub statics: Vec<StaticSpec>,
    #[serde(default)]
    pub threads: Vec<ThreadSpec>,
}

/// A class declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassSpec {
    pub name: String,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// A field declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

/// An object declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectSpec {
    Instance {
        id: String,
        class: String,
        #[serde(default)]
        fields: BTreeMap<String, Option<FieldValue>>,
    },
    Array {
        id: String,
        element_type: String,
        #[serde(default)]
        items: Vec<Option<String>>,
    },
    #[serde(rename = "string")]
    Str { id: String, value: String },
    #[serde(rename = "integer")]
    Int { id: String, value: i64 },
}

impl ObjectSpec {
    /// The declared object id.
    pub fn id(&self) -> &str {
        match self {
            Self::Instance { id, .. }
            | Self::Array { id, .. }
            | Self::Str { id, .. }
            | Self::Int { id, .. } => id,
        }
    }
}

/// Value of an instance field: an object id or a primitive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Primitive(i64),
    Reference(String),
}

/// A static field holding an object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaticSpec {
    pub owner: String,
    pub field: String,
    pub object: Option<String>,
}

/// A thread and its frames, bottom first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThreadSpec {
    pub name: String,
    #[serde(default)]
    pub frames: Vec<FrameSpec>,
}

/// One stack frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameSpec {
    pub method: String,
    #[serde(default)]
    pub locals: Vec<LocalSpec>,
}

/// A local slot in a frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalSpec {
    pub name: String,
    pub object: Option<String>,
}

/// A materialized snapshot. Dropping it detaches its threads.
pub struct LoadedHeap {
    pub heap: Heap,
    objects: HashMap<String, LiveObject>,
    classes: HashMap<String, Arc<Class>>,
    _threads: Vec<ThreadGuard>,
}

impl LoadedHeap {
    /// Look up an object by its snapshot id.
    pub fn object(&self, id: &str) -> Result<LiveObject> {
        self.objects
            .get(id)
            .cloned()
            .ok_or_else(|| HeapError::UnknownObject(id.to_string()))
    }

    /// Look up several objects by id.
    pub fn objects(&self, ids: &[String]) -> Result<Vec<LiveObject>> {
        ids.iter().map(|id| self.object(id)).collect()
    }

    /// Look up a class by name.
    pub fn class(&self, name: &str) -> Option<&Arc<Class>> {
        self.classes.get(name)
    }

    /// Number of materialized objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Forget every id → object mapping so that only graph references keep
    /// objects alive.
    pub fn release_ids(&mut self) {
        self.objects.clear();
    }
}

impl HeapSnapshot {
    /// Parse a snapshot from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| HeapError::Snapshot(e.to_string()))
    }

    /// Read and parse a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| HeapError::Snapshot(e.to_string()))
    }

    /// Build the live graph described by this snapshot.
    pub fn materialize(&self) -> Result<LoadedHeap> {
        let classes = self.build_classes()?;

        let mut objects: HashMap<String, LiveObject> = HashMap::with_capacity(self.objects.len());
        for spec in &self.objects {
            let object = match spec {
                ObjectSpec::Instance { class, .. } => {
                    let class = classes
                        .get(class)
                        .ok_or_else(|| HeapError::UnknownClass(class.clone()))?;
                    Instance::alloc(class)
                }
                ObjectSpec::Array { element_type, .. } => ArrayObject::alloc(element_type, Vec::new()),
                ObjectSpec::Str { value, .. } => BoxedValue::alloc_str(value.as_str()),
                ObjectSpec::Int { value, .. } => BoxedValue::alloc_int(*value),
            };
            if objects.insert(spec.id().to_string(), object).is_some() {
                return Err(HeapError::DuplicateObject(spec.id().to_string()));
            }
        }

        let resolve = |id: Option<&str>| -> Result<LiveObject> {
            match id {
                Some(id) => objects
                    .get(id)
                    .cloned()
                    .ok_or_else(|| HeapError::UnknownObject(id.to_string())),
                None => Ok(LiveObject::null()),
            }
        };

        for spec in &self.objects {
            let object = resolve(Some(spec.id()))?;
            match spec {
                ObjectSpec::Instance { fields, .. } => {
                    let Some(instance) = object.downcast_ref::<Instance>() else {
                        continue;
                    };
                    for (name, value) in fields {
                        match value {
                            Some(FieldValue::Primitive(v)) => instance.set_primitive(name, *v)?,
                            Some(FieldValue::Reference(id)) => {
                                instance.set(name, resolve(Some(id))?)?;
                            }
                            None => {
                                instance.set(name, LiveObject::null())?;
                            }
                        }
                    }
                }
                ObjectSpec::Array { items, .. } => {
                    let Some(array) = object.downcast_ref::<ArrayObject>() else {
                        continue;
                    };
                    for item in items {
                        array.push(resolve(item.as_deref())?)?;
                    }
                }
                ObjectSpec::Str { .. } | ObjectSpec::Int { .. } => {}
            }
        }

        let heap = Heap::new();
        for s in &self.statics {
            heap.set_static(&s.owner, &s.field, resolve(s.object.as_deref())?);
        }

        let mut threads = Vec::with_capacity(self.threads.len());
        for t in &self.threads {
            let guard = heap.attach_thread(&t.name);
            for frame in &t.frames {
                guard.push_frame(&frame.method);
                for local in &frame.locals {
                    guard.set_local(&local.name, resolve(local.object.as_deref())?)?;
                }
            }
            threads.push(guard);
        }

        debug!(
            classes = classes.len(),
            objects = objects.len(),
            statics = self.statics.len(),
            threads = threads.len(),
            "materialized heap snapshot"
        );

        Ok(LoadedHeap {
            heap,
            objects,
            classes,
            _threads: threads,
        })
    }

    fn build_classes(&self) -> Result<HashMap<String, Arc<Class>>> {
        let mut classes: HashMap<String, Arc<Class>> = HashMap::with_capacity(self.classes.len());
        for spec in &self.classes {
            let mut builder = Class::builder(spec.name.as_str());
            if let Some(superclass) = &spec.superclass {
                let superclass = classes
                    .get(superclass)
                    .ok_or_else(|| HeapError::UnknownClass(superclass.clone()))?;
                builder = builder.extends(superclass);
            }
            for field in &spec.fields {
                builder = builder.field(field.name.as_str(), field.kind);
            }
            if classes.insert(spec.name.clone(), builder.build()?).is_some() {
                return Err(HeapError::DuplicateClass(spec.name.clone()));
            }
        }
        Ok(classes)
    }
}
