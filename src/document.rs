//! In-memory hierarchical document: groups of named entries, typed arrays and
//! attribute mappings.
//!
//! Every accessor that can miss returns a [`StoreError`]; the evaluator
//! propagates those unchanged.

use std::{fmt, io, path::PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

use crate::value::{DType, Scalar};

/// Errors raised by the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key '{0}' not found")]
    KeyNotFound(String),

    #[error("attribute '{0}' not found")]
    AttributeNotFound(String),

    #[error("'{0}' is not a group")]
    NotAGroup(String),

    #[error("shape {0:?} holds more elements than can be addressed")]
    ShapeOverflow(Vec<usize>),

    #[error("shape {shape:?} needs {expected} values, got {found}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        found: usize,
    },

    #[error("cannot store {found} value in a {dtype} dataset")]
    ElementType { dtype: DType, found: DType },

    #[error("malformed entry '{path}': {reason}")]
    Malformed { path: String, reason: String },

    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not a valid document: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Key path from the document root to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location(Vec<String>);

impl Location {
    pub fn root() -> Self {
        Location::default()
    }

    pub fn child(&self, key: &str) -> Self {
        let mut keys = self.0.clone();
        keys.push(key.to_string());
        Location(keys)
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(".");
        }
        for key in &self.0 {
            write!(f, ".{}", key)?;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for Location {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Location(iter.into_iter().map(Into::into).collect())
    }
}

/// Ordered name → scalar mapping attached to groups and datasets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attributes(IndexMap<String, Scalar>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Result<&Scalar, StoreError> {
        self.0
            .get(key)
            .ok_or_else(|| StoreError::AttributeNotFound(key.to_string()))
    }

    /// Inserts or replaces `key`, keeping the position of an existing key.
    pub fn set(&mut self, key: impl Into<String>, value: Scalar) -> Option<Scalar> {
        self.0.insert(key.into(), value)
    }

    pub fn delete(&mut self, key: &str) -> Result<Scalar, StoreError> {
        self.0
            .shift_remove(key)
            .ok_or_else(|| StoreError::AttributeNotFound(key.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Scalar)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Scalar)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, Scalar)>>(iter: I) -> Self {
        Attributes(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Shaped, dtype-tagged block of values stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    dtype: DType,
    shape: Vec<usize>,
    data: Vec<Scalar>,
    attributes: Attributes,
}

impl Dataset {
    /// Builds a dataset, checking the element count against `shape` and every
    /// element against `dtype` (integers are widened into float datasets).
    pub fn new(dtype: DType, shape: Vec<usize>, data: Vec<Scalar>) -> Result<Self, StoreError> {
        let Some(expected) = element_count(&shape) else {
            return Err(StoreError::ShapeOverflow(shape));
        };
        if expected != data.len() {
            return Err(StoreError::ShapeMismatch {
                shape,
                expected,
                found: data.len(),
            });
        }

        let data = data
            .into_iter()
            .map(|value| {
                value.cast(dtype).ok_or(StoreError::ElementType {
                    dtype,
                    found: value.dtype(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Dataset {
            dtype,
            shape,
            data,
            attributes: Attributes::new(),
        })
    }

    /// 0-d dataset holding a single value.
    pub fn scalar(value: Scalar) -> Self {
        Dataset {
            dtype: value.dtype(),
            shape: Vec::new(),
            data: vec![value],
            attributes: Attributes::new(),
        }
    }

    /// 1-d `str` dataset.
    pub fn from_strings(items: Vec<String>) -> Self {
        Dataset {
            dtype: DType::Str,
            shape: vec![items.len()],
            data: items.into_iter().map(Scalar::String).collect(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Flat row-major view of all elements.
    pub fn data(&self) -> &[Scalar] {
        &self.data
    }

    /// Value of a 0-d dataset.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self.shape.as_slice() {
            [] => self.data.first(),
            _ => None,
        }
    }

    /// Element at a full index, one coordinate per dimension.
    pub fn get(&self, index: &[usize]) -> Option<&Scalar> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        for (i, dim) in index.iter().zip(&self.shape) {
            if i >= dim {
                return None;
            }
            offset = offset * dim + i;
        }
        self.data.get(offset)
    }

    /// Slice along the first axis: row `i` of a 2-d array, element `i` of a 1-d one.
    pub fn row(&self, i: usize) -> Option<&[Scalar]> {
        let (first, rest) = self.shape.split_first()?;
        if i >= *first {
            return None;
        }
        let stride: usize = rest.iter().product();
        self.data.get(i * stride..(i + 1) * stride)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

/// Number of elements in `shape`, if every partial product of its non-zero
/// dimensions fits in a `usize`.
fn element_count(shape: &[usize]) -> Option<usize> {
    let count = shape
        .iter()
        .filter(|&&dim| dim != 0)
        .try_fold(1usize, |count, &dim| count.checked_mul(dim))?;
    Some(if shape.contains(&0) { 0 } else { count })
}

/// Child of a group.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Group(Group),
    Dataset(Dataset),
}

impl Entry {
    pub fn attributes(&self) -> &Attributes {
        match self {
            Entry::Group(group) => group.attributes(),
            Entry::Dataset(dataset) => dataset.attributes(),
        }
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        match self {
            Entry::Group(group) => group.attributes_mut(),
            Entry::Dataset(dataset) => dataset.attributes_mut(),
        }
    }
}

impl From<Group> for Entry {
    fn from(group: Group) -> Self {
        Entry::Group(group)
    }
}

impl From<Dataset> for Entry {
    fn from(dataset: Dataset) -> Self {
        Entry::Dataset(dataset)
    }
}

/// Borrowed entry found at a [`Location`]; the root resolves to a group.
#[derive(Debug, Clone, Copy)]
pub enum EntryRef<'a> {
    Group(&'a Group),
    Dataset(&'a Dataset),
}

impl<'a> EntryRef<'a> {
    pub fn attributes(self) -> &'a Attributes {
        match self {
            EntryRef::Group(group) => group.attributes(),
            EntryRef::Dataset(dataset) => dataset.attributes(),
        }
    }
}

/// Named children plus an attribute mapping. Key order is insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    entries: IndexMap<String, Entry>,
    attributes: Attributes,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }

    pub fn get(&self, key: &str) -> Result<&Entry, StoreError> {
        self.entries
            .get(key)
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut Entry, StoreError> {
        self.entries
            .get_mut(key)
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    /// Inserts or replaces `key`, returning the previous entry.
    pub fn set(&mut self, key: impl Into<String>, entry: impl Into<Entry>) -> Option<Entry> {
        self.entries.insert(key.into(), entry.into())
    }

    pub fn delete(&mut self, key: &str) -> Result<Entry, StoreError> {
        self.entries
            .shift_remove(key)
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Walks `location`, every step of which must be a group.
    pub fn group_at(&self, location: &Location) -> Result<&Group, StoreError> {
        let mut group = self;
        for key in location.keys() {
            group = match group.get(key)? {
                Entry::Group(child) => child,
                Entry::Dataset(_) => return Err(StoreError::NotAGroup(key.clone())),
            };
        }
        Ok(group)
    }

    pub fn group_at_mut(&mut self, location: &Location) -> Result<&mut Group, StoreError> {
        let mut group = self;
        for key in location.keys() {
            group = match group.get_mut(key)? {
                Entry::Group(child) => child,
                Entry::Dataset(_) => return Err(StoreError::NotAGroup(key.clone())),
            };
        }
        Ok(group)
    }

    pub fn resolve(&self, location: &Location) -> Result<EntryRef<'_>, StoreError> {
        let Some((last, parent)) = location.keys().split_last() else {
            return Ok(EntryRef::Group(self));
        };
        let parent = self.group_at(&Location(parent.to_vec()))?;
        match parent.get(last)? {
            Entry::Group(group) => Ok(EntryRef::Group(group)),
            Entry::Dataset(dataset) => Ok(EntryRef::Dataset(dataset)),
        }
    }

    /// Attribute mapping of the group or dataset at `location`.
    pub fn attributes_at_mut(&mut self, location: &Location) -> Result<&mut Attributes, StoreError> {
        let Some((last, parent)) = location.keys().split_last() else {
            return Ok(self.attributes_mut());
        };
        let parent = self.group_at_mut(&Location(parent.to_vec()))?;
        Ok(parent.get_mut(last)?.attributes_mut())
    }

    /// Number of entries in this group and all nested groups.
    pub fn count_entries(&self) -> usize {
        self.entries
            .values()
            .map(|entry| match entry {
                Entry::Group(group) => 1 + group.count_entries(),
                Entry::Dataset(_) => 1,
            })
            .sum()
    }
}
