//! On-disk documents.
//!
//! A document file is an order-preserving JSON tree:
//!
//! ```json
//! {"kind": "group", "attributes": {"version": 2}, "entries": {
//!     "x": {"kind": "dataset", "dtype": "int64", "shape": [3], "data": [1, 2, 3]}
//! }}
//! ```
//!
//! Dataset `data` is stored flat in row-major order. `attributes` may be
//! omitted on both kinds, `entries` on groups. Non-finite floats have no JSON
//! number form and are written as `{"float": "nan"}`, `{"float": "inf"}` or
//! `{"float": "-inf"}`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value as Json};
use tracing::{debug, warn};

use crate::{
    document::{Attributes, Dataset, Entry, Group, Location, StoreError},
    value::{DType, Scalar, UnknownDType},
};

/// Access mode for [`Store::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    ReadWrite,
}

/// What to do with malformed entries while reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on the first malformed entry
    #[default]
    Strict,

    /// Skip malformed entries with a warning
    Ignore,
}

/// An open document file.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    mode: Mode,
    document: Group,
}

impl Store {
    /// Reads and decodes the document at `path`.
    ///
    /// Read-write stores are always decoded strictly, since saving a partially
    /// decoded tree would drop the skipped entries from the file.
    pub fn open(
        path: impl AsRef<Path>,
        mode: Mode,
        error_mode: ErrorMode,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let error_mode = match mode {
            Mode::Read => error_mode,
            Mode::ReadWrite => ErrorMode::Strict,
        };

        let json = read_json(&path)?;
        let mut decoder = Decoder::new(error_mode);
        let document = decoder.decode_root(&json)?;

        debug!(
            path = %path.display(),
            ?mode,
            entries = document.count_entries(),
            skipped = decoder.skipped.len(),
            "opened document"
        );
        Ok(Store {
            path,
            mode,
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn document(&self) -> &Group {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Group {
        &mut self.document
    }

    /// Writes read-write documents back to disk; read-only ones are dropped.
    pub fn close(self) -> Result<(), StoreError> {
        if self.mode == Mode::ReadWrite {
            save(&self.path, &self.document)?;
        }
        debug!(path = %self.path.display(), mode = ?self.mode, "closed document");
        Ok(())
    }
}

/// Outcome of [`repair`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Groups and datasets written to the repaired file
    pub recovered: usize,

    /// Key paths of the entries and attributes that could not be read
    pub skipped: Vec<String>,
}

/// Rewrites the document at `path` keeping every readable entry.
///
/// The recovered tree is written to a `~`-prefixed sibling first and then
/// renamed over the original.
pub fn repair(path: impl AsRef<Path>) -> Result<RepairReport, StoreError> {
    let path = path.as_ref();
    let json = read_json(path)?;

    let mut decoder = Decoder::new(ErrorMode::Ignore);
    let document = decoder.decode_root(&json)?;
    save(path, &document)?;

    let report = RepairReport {
        recovered: document.count_entries(),
        skipped: decoder.skipped,
    };
    debug!(
        path = %path.display(),
        recovered = report.recovered,
        skipped = report.skipped.len(),
        "repaired document"
    );
    Ok(report)
}

/// Encodes `document` and atomically replaces the file at `path`.
pub fn save(path: impl AsRef<Path>, document: &Group) -> Result<(), StoreError> {
    let path = path.as_ref();
    let text = serde_json::to_string_pretty(&encode_group(document)).map_err(|source| {
        StoreError::Json {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let staging = staging_path(path);
    fs::write(&staging, text).map_err(|source| StoreError::Io {
        path: staging.clone(),
        source,
    })?;
    fs::rename(&staging, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), "saved document");
    Ok(())
}

/// `dir/~name` next to `dir/name`.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("~{}", name))
}

fn read_json(path: &Path) -> Result<Json, StoreError> {
    let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn malformed(path: impl ToString, reason: impl Into<String>) -> StoreError {
    StoreError::Malformed {
        path: path.to_string(),
        reason: reason.into(),
    }
}

struct Decoder {
    error_mode: ErrorMode,
    skipped: Vec<String>,
}

impl Decoder {
    fn new(error_mode: ErrorMode) -> Self {
        Decoder {
            error_mode,
            skipped: Vec::new(),
        }
    }

    /// A malformed root is fatal in every mode.
    fn decode_root(&mut self, json: &Json) -> Result<Group, StoreError> {
        let root = Location::root();
        match self.decode_entry(json, &root)? {
            Entry::Group(group) => Ok(group),
            Entry::Dataset(_) => Err(malformed(root, "the document root must be a group")),
        }
    }

    fn soft_error(&mut self, path: String, error: StoreError) -> Result<(), StoreError> {
        match self.error_mode {
            ErrorMode::Strict => Err(error),
            ErrorMode::Ignore => {
                warn!(entry = %path, %error, "skipping unreadable entry");
                self.skipped.push(path);
                Ok(())
            }
        }
    }

    fn decode_entry(&mut self, json: &Json, location: &Location) -> Result<Entry, StoreError> {
        let object = json
            .as_object()
            .ok_or_else(|| malformed(location, "expected an object"))?;

        match object.get("kind").and_then(Json::as_str) {
            Some("group") => self.decode_group(object, location).map(Entry::Group),
            Some("dataset") => self.decode_dataset(object, location).map(Entry::Dataset),
            Some(kind) => Err(malformed(location, format!("unknown kind '{}'", kind))),
            None => Err(malformed(location, "missing 'kind'")),
        }
    }

    fn decode_group(
        &mut self,
        object: &Map<String, Json>,
        location: &Location,
    ) -> Result<Group, StoreError> {
        let attributes = self.decode_attributes(object.get("attributes"), location)?;
        let mut group = Group::new().with_attributes(attributes);

        let Some(entries) = object.get("entries") else {
            return Ok(group);
        };
        let entries = entries
            .as_object()
            .ok_or_else(|| malformed(location, "'entries' must be an object"))?;

        for (key, value) in entries {
            let child = location.child(key);
            match self.decode_entry(value, &child) {
                Ok(entry) => {
                    group.set(key.clone(), entry);
                }
                Err(error) => self.soft_error(child.to_string(), error)?,
            }
        }

        Ok(group)
    }

    fn decode_dataset(
        &mut self,
        object: &Map<String, Json>,
        location: &Location,
    ) -> Result<Dataset, StoreError> {
        let dtype: DType = object
            .get("dtype")
            .and_then(Json::as_str)
            .ok_or_else(|| malformed(location, "missing 'dtype'"))?
            .parse()
            .map_err(|error: UnknownDType| malformed(location, error.to_string()))?;

        let shape = object
            .get("shape")
            .and_then(Json::as_array)
            .ok_or_else(|| malformed(location, "missing 'shape'"))?
            .iter()
            .map(|dim| dim.as_u64().map(|dim| dim as usize))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| malformed(location, "'shape' must hold non-negative integers"))?;

        let data = object
            .get("data")
            .and_then(Json::as_array)
            .ok_or_else(|| malformed(location, "missing 'data'"))?
            .iter()
            .map(decode_scalar)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| malformed(location, "'data' must hold scalar values"))?;

        let attributes = self.decode_attributes(object.get("attributes"), location)?;
        let dataset = Dataset::new(dtype, shape, data)
            .map_err(|error| malformed(location, error.to_string()))?;
        Ok(dataset.with_attributes(attributes))
    }

    fn decode_attributes(
        &mut self,
        json: Option<&Json>,
        location: &Location,
    ) -> Result<Attributes, StoreError> {
        let Some(json) = json else {
            return Ok(Attributes::new());
        };
        let object = json
            .as_object()
            .ok_or_else(|| malformed(location, "'attributes' must be an object"))?;

        let mut attributes = Attributes::new();
        for (key, value) in object {
            match decode_scalar(value) {
                Some(value) => {
                    attributes.set(key.clone(), value);
                }
                None => {
                    let path = format!("{}#{}", location, key);
                    let error = malformed(&path, "attribute values must be scalars");
                    self.soft_error(path, error)?;
                }
            }
        }
        Ok(attributes)
    }
}

fn decode_scalar(json: &Json) -> Option<Scalar> {
    let Some(object) = json.as_object() else {
        return Scalar::from_json(json);
    };
    match object.get("float").and_then(Json::as_str) {
        Some(text) if object.len() == 1 => text
            .parse::<f64>()
            .ok()
            .filter(|n| !n.is_finite())
            .map(Scalar::Float),
        _ => None,
    }
}

fn encode_scalar(value: &Scalar) -> Json {
    match value {
        Scalar::Float(n) if n.is_nan() => serde_json::json!({ "float": "nan" }),
        Scalar::Float(n) if n.is_infinite() => {
            let text = if n.is_sign_positive() { "inf" } else { "-inf" };
            serde_json::json!({ "float": text })
        }
        other => other.to_json(),
    }
}

fn encode_attributes(attributes: &Attributes) -> Json {
    Json::Object(
        attributes
            .iter()
            .map(|(key, value)| (key.clone(), encode_scalar(value)))
            .collect(),
    )
}

fn encode_group(group: &Group) -> Json {
    let entries: Map<String, Json> = group
        .iter()
        .map(|(key, entry)| {
            let value = match entry {
                Entry::Group(child) => encode_group(child),
                Entry::Dataset(dataset) => encode_dataset(dataset),
            };
            (key.clone(), value)
        })
        .collect();

    let mut object = Map::new();
    object.insert("kind".to_string(), Json::from("group"));
    object.insert(
        "attributes".to_string(),
        encode_attributes(group.attributes()),
    );
    object.insert("entries".to_string(), Json::Object(entries));
    Json::Object(object)
}

fn encode_dataset(dataset: &Dataset) -> Json {
    let mut object = Map::new();
    object.insert("kind".to_string(), Json::from("dataset"));
    object.insert("dtype".to_string(), Json::from(dataset.dtype().name()));
    object.insert("shape".to_string(), Json::from(dataset.shape().to_vec()));
    object.insert(
        "data".to_string(),
        Json::Array(dataset.data().iter().map(encode_scalar).collect()),
    );
    object.insert(
        "attributes".to_string(),
        encode_attributes(dataset.attributes()),
    );
    Json::Object(object)
}
