use std::io;

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{Node, Operand, Tree},
    document::{Attributes, Dataset, Entry, EntryRef, Group, Location, StoreError},
    value::Scalar,
};

/// Value flowing through a pipeline.
///
/// Groups, datasets and attribute views are live references into the document
/// by key path; the other variants are detached values.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalObject {
    /// Group at a location (the root is `Group(Location::root())`)
    Group(Location),

    /// Typed array at a location
    Dataset(Location),

    /// Attribute mapping of the group or dataset at a location
    Attributes(Location),

    /// Ordered key or attribute name list
    Keys(Vec<String>),

    /// Plain mapping, e.g. an attribute snapshot
    Mapping(Attributes),

    /// Constant or attribute value
    Scalar(Scalar),
}

impl EvalObject {
    /// Human-readable type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            EvalObject::Group(_) => "group",
            EvalObject::Dataset(_) => "dataset",
            EvalObject::Attributes(_) => "attributes",
            EvalObject::Keys(_) => "list",
            EvalObject::Mapping(_) => "dict",
            EvalObject::Scalar(value) => value.dtype().name(),
        }
    }
}

/// Borrowed, fully resolved form of an [`EvalObject`], handed to renderers.
#[derive(Debug, Clone, Copy)]
pub enum View<'a> {
    Group(&'a Group),
    Dataset(&'a Dataset),
    Attributes(&'a Attributes),
    Keys(&'a [String]),
    Mapping(&'a Attributes),
    Scalar(&'a Scalar),
}

/// Consumer of the value reaching the terminal `Display` statement.
pub trait Renderer {
    fn render(&mut self, value: View<'_>) -> io::Result<()>;
}

/// Errors that can occur during filter evaluation.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The runtime type does not support the operation
    #[error("Cannot {action} '{found}'")]
    Unsupported {
        action: &'static str,
        found: &'static str,
    },

    /// Attributes only hold scalar values
    #[error("Cannot store '{0}' as an attribute value")]
    NotAScalar(&'static str),

    /// Assignment or deletion target is not an accessor
    #[error("'{0}' does not describe a key to assign or delete")]
    InvalidTarget(String),

    /// Missing key, missing attribute, or other document store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to display result: {0}")]
    Render(#[from] io::Error),
}

/// Where an assignment or deletion writes.
#[derive(Debug)]
enum Destination {
    Group(Location),
    Attributes(Location),
    Mapping(Attributes),
}

/// Owned copy of a value about to be written into the document.
enum Payload {
    Entry(Entry),
    Mapping(Attributes),
    Keys(Vec<String>),
    Scalar(Scalar),
}

impl Payload {
    fn type_name(&self) -> &'static str {
        match self {
            Payload::Entry(Entry::Group(_)) => "group",
            Payload::Entry(Entry::Dataset(_)) => "dataset",
            Payload::Mapping(_) => "dict",
            Payload::Keys(_) => "list",
            Payload::Scalar(value) => value.dtype().name(),
        }
    }

    /// Group children: scalars become 0-d datasets, key lists 1-d string
    /// datasets and mappings groups of 0-d datasets.
    fn into_entry(self) -> Entry {
        match self {
            Payload::Entry(entry) => entry,
            Payload::Scalar(value) => Dataset::scalar(value).into(),
            Payload::Keys(keys) => Dataset::from_strings(keys).into(),
            Payload::Mapping(mapping) => {
                let mut group = Group::new();
                for (key, value) in mapping.iter() {
                    group.set(key.clone(), Dataset::scalar(value.clone()));
                }
                group.into()
            }
        }
    }

    fn into_scalar(self) -> Result<Scalar, EvalError> {
        let found = self.type_name();
        match self {
            Payload::Scalar(value) => Ok(value),
            Payload::Entry(Entry::Dataset(dataset)) => {
                dataset.as_scalar().cloned().ok_or(EvalError::NotAScalar(found))
            }
            _ => Err(EvalError::NotAScalar(found)),
        }
    }
}

/// Tree-walking evaluator bound to one document and one renderer.
///
/// Statements commit to the document as they run; a failure part-way through
/// a pipeline leaves earlier changes in place.
pub struct Evaluator<'d, R> {
    document: &'d mut Group,
    renderer: R,
}

impl<'d, R: Renderer> Evaluator<'d, R> {
    pub fn new(document: &'d mut Group, renderer: R) -> Self {
        Evaluator { document, renderer }
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Runs every statement of `tree`, starting from the document root, and
    /// returns the value that reached the terminal `Display`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hdfq::document::{Dataset, Group};
    /// use hdfq::evaluator::{EvalObject, Evaluator};
    /// use hdfq::output::TextRenderer;
    /// use hdfq::parser::parse;
    /// use hdfq::value::Scalar;
    ///
    /// let mut document = Group::new();
    /// document.set("x", Dataset::scalar(Scalar::Integer(1)));
    /// document.set("y", Dataset::scalar(Scalar::Integer(2)));
    ///
    /// let parsed = parse("keys").unwrap();
    /// let mut evaluator = Evaluator::new(&mut document, TextRenderer::new(Vec::new()));
    /// let result = evaluator.eval(&parsed.tree).unwrap();
    /// assert_eq!(result, EvalObject::Keys(vec!["x".to_string(), "y".to_string()]));
    /// ```
    pub fn eval(&mut self, tree: &Tree) -> Result<EvalObject, EvalError> {
        let mut context = EvalObject::Group(Location::root());

        for statement in &tree.body {
            debug!(statement = %statement, "evaluating statement");
            context = self.eval_statement(statement, context)?;
        }

        Ok(context)
    }

    pub fn eval_statement(
        &mut self,
        statement: &Node,
        context: EvalObject,
    ) -> Result<EvalObject, EvalError> {
        match statement {
            Node::Display => {
                let view = resolve_view(self.document, &context)?;
                self.renderer.render(view)?;
                Ok(context)
            }
            Node::Keys => self.get_keys(&context),
            Node::Attrs => self.get_attributes(&context),
            Node::AttrKeys => self.get_attribute_keys(&context),
            Node::Get { target, value } => {
                let container = self.eval_operand(target, context)?;
                self.get_object(container, value)
            }
            Node::GetAttr { target, value } => {
                let container = self.eval_operand(target, context)?;
                self.get_attribute(&container, value)
            }
            Node::Assign { target, value } => {
                let value = self.eval_operand(value, context.clone())?;
                let payload = self.materialize(value)?;
                let (destination, key) = self.shallow_eval(target, context, "assign value to")?;
                self.set_key_value(destination, key, payload)
            }
            Node::Del { target, value } => {
                let container = self.eval_operand(target, context)?;
                let (destination, key) =
                    self.shallow_eval(value, container, "delete value from")?;
                self.del_object(destination, &key)
            }
            Node::Constant(value) => Ok(EvalObject::Scalar(value.clone())),
        }
    }

    fn eval_operand(
        &mut self,
        operand: &Operand,
        context: EvalObject,
    ) -> Result<EvalObject, EvalError> {
        match operand {
            Operand::Context => Ok(context),
            Operand::Node(node) => self.eval_statement(node, context),
        }
    }

    /// Evaluates only the container part of an accessor and returns it with
    /// the key the accessor would read.
    fn shallow_eval(
        &mut self,
        target: &Node,
        context: EvalObject,
        action: &'static str,
    ) -> Result<(Destination, String), EvalError> {
        match target {
            Node::Get { target, value } => {
                let destination = match self.eval_operand(target, context)? {
                    EvalObject::Group(location) => Destination::Group(location),
                    EvalObject::Attributes(location) => Destination::Attributes(location),
                    EvalObject::Mapping(mapping) => Destination::Mapping(mapping),
                    other => {
                        return Err(EvalError::Unsupported {
                            action,
                            found: other.type_name(),
                        });
                    }
                };
                Ok((destination, value.clone()))
            }
            Node::GetAttr { target, value } => match self.eval_operand(target, context)? {
                EvalObject::Group(location) | EvalObject::Dataset(location) => {
                    Ok((Destination::Attributes(location), value.clone()))
                }
                other => Err(EvalError::Unsupported {
                    action: "get attribute from",
                    found: other.type_name(),
                }),
            },
            other => Err(EvalError::InvalidTarget(other.to_string())),
        }
    }

    fn get_object(&self, container: EvalObject, key: &str) -> Result<EvalObject, EvalError> {
        match container {
            EvalObject::Group(location) => {
                let child = location.child(key);
                match self.document.resolve(&child)? {
                    EntryRef::Group(_) => Ok(EvalObject::Group(child)),
                    EntryRef::Dataset(_) => Ok(EvalObject::Dataset(child)),
                }
            }
            EvalObject::Mapping(mapping) => mapping
                .get(key)
                .cloned()
                .map(EvalObject::Scalar)
                .map_err(|_| StoreError::KeyNotFound(key.to_string()).into()),
            other => Err(EvalError::Unsupported {
                action: "get object from",
                found: other.type_name(),
            }),
        }
    }

    fn get_attribute(&self, container: &EvalObject, key: &str) -> Result<EvalObject, EvalError> {
        match container {
            EvalObject::Group(location) | EvalObject::Dataset(location) => {
                let value = self.document.resolve(location)?.attributes().get(key)?;
                Ok(EvalObject::Scalar(value.clone()))
            }
            other => Err(EvalError::Unsupported {
                action: "get attribute from",
                found: other.type_name(),
            }),
        }
    }

    fn get_keys(&self, context: &EvalObject) -> Result<EvalObject, EvalError> {
        match context {
            EvalObject::Group(location) => {
                let group = self.document.group_at(location)?;
                Ok(EvalObject::Keys(group.keys().cloned().collect()))
            }
            other => Err(EvalError::Unsupported {
                action: "get keys from",
                found: other.type_name(),
            }),
        }
    }

    fn get_attributes(&self, context: &EvalObject) -> Result<EvalObject, EvalError> {
        match context {
            EvalObject::Group(location) | EvalObject::Dataset(location) => {
                let attributes = self.document.resolve(location)?.attributes();
                Ok(EvalObject::Mapping(attributes.clone()))
            }
            other => Err(EvalError::Unsupported {
                action: "get attributes from",
                found: other.type_name(),
            }),
        }
    }

    fn get_attribute_keys(&self, context: &EvalObject) -> Result<EvalObject, EvalError> {
        match context {
            EvalObject::Group(location) | EvalObject::Dataset(location) => {
                let attributes = self.document.resolve(location)?.attributes();
                Ok(EvalObject::Keys(attributes.keys().cloned().collect()))
            }
            other => Err(EvalError::Unsupported {
                action: "get attribute keys from",
                found: other.type_name(),
            }),
        }
    }

    /// Copies the value out of the document before the destination is borrowed.
    fn materialize(&self, value: EvalObject) -> Result<Payload, EvalError> {
        let payload = match value {
            EvalObject::Group(location) | EvalObject::Dataset(location) => {
                match self.document.resolve(&location)? {
                    EntryRef::Group(group) => Payload::Entry(group.clone().into()),
                    EntryRef::Dataset(dataset) => Payload::Entry(dataset.clone().into()),
                }
            }
            EvalObject::Attributes(location) => {
                Payload::Mapping(self.document.resolve(&location)?.attributes().clone())
            }
            EvalObject::Mapping(mapping) => Payload::Mapping(mapping),
            EvalObject::Keys(keys) => Payload::Keys(keys),
            EvalObject::Scalar(value) => Payload::Scalar(value),
        };
        Ok(payload)
    }

    fn set_key_value(
        &mut self,
        destination: Destination,
        key: String,
        payload: Payload,
    ) -> Result<EvalObject, EvalError> {
        match destination {
            Destination::Group(location) => {
                debug!(location = %location, key = %key, "assigning entry");
                self.document
                    .group_at_mut(&location)?
                    .set(key, payload.into_entry());
                Ok(EvalObject::Group(location))
            }
            Destination::Attributes(location) => {
                debug!(location = %location, key = %key, "assigning attribute");
                let value = payload.into_scalar()?;
                self.document.attributes_at_mut(&location)?.set(key, value);
                Ok(EvalObject::Attributes(location))
            }
            Destination::Mapping(mut mapping) => {
                mapping.set(key, payload.into_scalar()?);
                Ok(EvalObject::Mapping(mapping))
            }
        }
    }

    fn del_object(&mut self, destination: Destination, key: &str) -> Result<EvalObject, EvalError> {
        match destination {
            Destination::Group(location) => {
                debug!(location = %location, key, "deleting entry");
                self.document.group_at_mut(&location)?.delete(key)?;
                Ok(EvalObject::Group(location))
            }
            Destination::Attributes(location) => {
                debug!(location = %location, key, "deleting attribute");
                self.document.attributes_at_mut(&location)?.delete(key)?;
                Ok(EvalObject::Attributes(location))
            }
            Destination::Mapping(mut mapping) => {
                mapping
                    .delete(key)
                    .map_err(|_| StoreError::KeyNotFound(key.to_string()))?;
                Ok(EvalObject::Mapping(mapping))
            }
        }
    }
}

/// Resolves live references against the document.
pub fn resolve_view<'a>(
    document: &'a Group,
    value: &'a EvalObject,
) -> Result<View<'a>, EvalError> {
    let view = match value {
        EvalObject::Group(location) | EvalObject::Dataset(location) => {
            match document.resolve(location)? {
                EntryRef::Group(group) => View::Group(group),
                EntryRef::Dataset(dataset) => View::Dataset(dataset),
            }
        }
        EvalObject::Attributes(location) => View::Attributes(document.resolve(location)?.attributes()),
        EvalObject::Keys(keys) => View::Keys(keys),
        EvalObject::Mapping(mapping) => View::Mapping(mapping),
        EvalObject::Scalar(value) => View::Scalar(value),
    };
    Ok(view)
}

/// Evaluates `tree` against `document`, rendering the final value with `renderer`.
pub fn eval<R: Renderer>(
    tree: &Tree,
    document: &mut Group,
    renderer: R,
) -> Result<EvalObject, EvalError> {
    Evaluator::new(document, renderer).eval(tree)
}
