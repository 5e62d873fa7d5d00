//! Renderers for the value reaching the end of a pipeline.
//!
//! [`TextRenderer`] prints the indented, jq-like display used on terminals:
//! groups list their attributes (`#name`) before their children (`.name`),
//! arrays are shown with their shape and dtype and abbreviated to the first
//! and last three items per axis. [`JsonRenderer`] prints the same value as
//! JSON for scripting.
//!
//! # Examples
//!
//! ```
//! use hdfq::evaluator::View;
//! use hdfq::output::repr_view;
//!
//! let keys = vec!["a".to_string(), "b".to_string()];
//! assert_eq!(repr_view(View::Keys(&keys)), "[\n  'a',\n  'b'\n]");
//! ```

use std::io::{self, Write};

use crate::{
    document::{Attributes, Dataset, Entry, Group},
    evaluator::{Renderer, View},
    value::Scalar,
};

/// Items shown at each end of an abbreviated axis.
const EDGE_ITEMS: usize = 3;

pub struct TextRenderer<W> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        TextRenderer { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, value: View<'_>) -> io::Result<()> {
        writeln!(self.out, "{}", repr_view(value))
    }
}

/// Text form of a value, without the trailing newline.
pub fn repr_view(value: View<'_>) -> String {
    match value {
        View::Group(group) => repr_group(group, 0),
        View::Dataset(dataset) => repr_dataset(dataset, 0),
        View::Attributes(attributes) => repr_mapping(attributes, '#'),
        View::Mapping(mapping) => repr_mapping(mapping, '.'),
        View::Keys(keys) => repr_keys(keys),
        View::Scalar(value) => repr_scalar(value),
    }
}

fn indent(level: usize) -> String {
    "  ".repeat(level)
}

fn repr_scalar(value: &Scalar) -> String {
    match value {
        Scalar::String(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}

fn repr_group(group: &Group, offset: usize) -> String {
    if group.is_empty() && group.attributes().is_empty() {
        return "{}".to_string();
    }

    let tabs = indent(offset + 1);
    let mut result = "{\n".to_string();

    for (key, value) in group.attributes().iter() {
        result.push_str(&format!("{}#{}: {},\n", tabs, key, repr_scalar(value)));
    }

    for (key, entry) in group.iter() {
        let value = match entry {
            Entry::Group(child) => repr_group(child, offset + 1),
            Entry::Dataset(dataset) => repr_dataset(dataset, offset + 1),
        };
        result.push_str(&format!("{}.{}: {},\n", tabs, key, value));
    }

    result.push_str(&indent(offset));
    result.push('}');
    result
}

fn repr_mapping(mapping: &Attributes, prefix: char) -> String {
    if mapping.is_empty() {
        return "{}".to_string();
    }

    let items: String = mapping
        .iter()
        .map(|(key, value)| format!("  {}{}: {},\n", prefix, key, repr_scalar(value)))
        .collect();
    format!("{{\n{}}}", items)
}

fn repr_keys(keys: &[String]) -> String {
    if keys.is_empty() {
        return "[]".to_string();
    }

    let items: Vec<String> = keys.iter().map(|key| format!("  '{}'", key)).collect();
    format!("[\n{}\n]", items.join(",\n"))
}

fn repr_dataset(dataset: &Dataset, offset: usize) -> String {
    if dataset.size() == 0 {
        return "[]".to_string();
    }

    if let Some(value) = dataset.as_scalar() {
        return value.to_string();
    }

    let rows: Vec<String> = match dataset.shape() {
        [_] => vec![repr_row(dataset.data())],
        [n_rows, n_cols] => {
            let row = |i: usize| dataset.row(i).map(repr_row).unwrap_or_default();
            if *n_rows <= 2 * EDGE_ITEMS {
                (0..*n_rows).map(row).collect()
            } else {
                let width = if *n_cols <= 2 * EDGE_ITEMS {
                    *n_cols
                } else {
                    2 * EDGE_ITEMS + 1
                };
                let mut rows: Vec<String> = (0..EDGE_ITEMS).map(row).collect();
                rows.push(vec!["..."; width].join("  "));
                rows.extend((n_rows - EDGE_ITEMS..*n_rows).map(row));
                rows
            }
        }
        _ => vec!["...".to_string()],
    };

    let tabs = indent(offset);
    let mut result = format!(
        ".shape={}  .dtype={}",
        repr_shape(dataset.shape()),
        dataset.dtype()
    );
    for row in rows {
        result.push_str(&format!("\n{}  {}", tabs, row));
    }
    result
}

fn repr_row(items: &[Scalar]) -> String {
    if items.len() <= 2 * EDGE_ITEMS {
        return items.iter().map(repr_scalar).collect::<Vec<_>>().join("  ");
    }

    let head = items[..EDGE_ITEMS].iter().map(repr_scalar);
    let tail = items[items.len() - EDGE_ITEMS..].iter().map(repr_scalar);
    head.chain(std::iter::once("...".to_string()))
        .chain(tail)
        .collect::<Vec<_>>()
        .join("  ")
}

/// Tuple notation: `(3,)`, `(2, 4)`.
fn repr_shape(shape: &[usize]) -> String {
    match shape {
        [n] => format!("({},)", n),
        _ => {
            let dims: Vec<String> = shape.iter().map(usize::to_string).collect();
            format!("({})", dims.join(", "))
        }
    }
}

/// Writes one JSON document per rendered value.
pub struct JsonRenderer<W> {
    out: W,
    pretty: bool,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W, pretty: bool) -> Self {
        JsonRenderer { out, pretty }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(&mut self, value: View<'_>) -> io::Result<()> {
        let json = view_to_json(value);
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, &json)?;
        } else {
            serde_json::to_writer(&mut self.out, &json)?;
        }
        writeln!(self.out)
    }
}

/// JSON form of a value: groups become objects with `#`-prefixed attribute
/// keys ahead of their children, arrays become nested lists.
pub fn view_to_json(value: View<'_>) -> serde_json::Value {
    match value {
        View::Group(group) => group_to_json(group),
        View::Dataset(dataset) => dataset_to_json(dataset),
        View::Attributes(mapping) | View::Mapping(mapping) => serde_json::Value::Object(
            mapping
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        ),
        View::Keys(keys) => serde_json::Value::Array(
            keys.iter()
                .map(|key| serde_json::Value::String(key.clone()))
                .collect(),
        ),
        View::Scalar(value) => value.to_json(),
    }
}

fn group_to_json(group: &Group) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for (key, value) in group.attributes().iter() {
        object.insert(format!("#{}", key), value.to_json());
    }
    for (key, entry) in group.iter() {
        let value = match entry {
            Entry::Group(child) => group_to_json(child),
            Entry::Dataset(dataset) => dataset_to_json(dataset),
        };
        object.insert(key.clone(), value);
    }
    serde_json::Value::Object(object)
}

fn dataset_to_json(dataset: &Dataset) -> serde_json::Value {
    nest(dataset.data(), dataset.shape())
}

fn nest(data: &[Scalar], shape: &[usize]) -> serde_json::Value {
    let Some((first, rest)) = shape.split_first() else {
        return data
            .first()
            .map(Scalar::to_json)
            .unwrap_or(serde_json::Value::Null);
    };

    let stride: usize = rest.iter().product();
    serde_json::Value::Array(
        (0..*first)
            .map(|i| nest(data.get(i * stride..(i + 1) * stride).unwrap_or(&[]), rest))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DType;

    fn sample() -> Group {
        let mut inner = Group::new();
        inner.set("c", Dataset::scalar(Scalar::from("x")));

        let mut root = Group::new();
        root.attributes_mut().set("version", Scalar::Integer(2));
        root.set("a", inner);
        root.set(
            "b",
            Dataset::new(
                DType::Int64,
                vec![2, 2],
                (1..=4).map(Scalar::Integer).collect(),
            )
            .unwrap(),
        );
        root
    }

    #[test]
    fn test_group_display() {
        let root = sample();
        assert_eq!(
            repr_view(View::Group(&root)),
            "{\n  #version: 2,\n  .a: {\n    .c: x,\n  },\n  .b: .shape=(2, 2)  .dtype=int64\n    1  2\n    3  4,\n}"
        );
        assert_eq!(repr_view(View::Group(&Group::new())), "{}");
    }

    #[test]
    fn test_long_array_is_abbreviated() {
        let dataset = Dataset::new(
            DType::Int64,
            vec![10],
            (0..10).map(Scalar::Integer).collect(),
        )
        .unwrap();
        assert_eq!(
            repr_view(View::Dataset(&dataset)),
            ".shape=(10,)  .dtype=int64\n  0  1  2  ...  7  8  9"
        );
    }

    #[test]
    fn test_attribute_view_uses_octothorpe() {
        let root = sample();
        assert_eq!(
            repr_view(View::Attributes(root.attributes())),
            "{\n  #version: 2,\n}"
        );
    }

    #[test]
    fn test_json_output() {
        let root = sample();
        let mut renderer = JsonRenderer::new(Vec::new(), false);
        renderer.render(View::Group(&root)).unwrap();
        assert_eq!(
            String::from_utf8(renderer.into_inner()).unwrap(),
            "{\"#version\":2,\"a\":{\"c\":\"x\"},\"b\":[[1,2],[3,4]]}\n"
        );
    }
}
