//! Best-effort inference of the data shape a template expects.
//!
//! Each top-level variable gets an [`Inference`]: `Precise` when every use
//! of the variable pins its shape down, `Approximate` when some use only
//! hints at it (helper arguments, conditions, references inside `each` or
//! `with` bodies), and `Unknown` when the source could only be scanned
//! lexically.

use indexmap::IndexMap;

use crate::ast::{self, Reference, Role, Visitor};
use crate::path::base_variable;

/// The structural shape of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Rendered directly: a string, number or boolean.
    Scalar,
    /// Accessed through named fields.
    Object(IndexMap<String, Shape>),
    /// Iterated with `each`.
    List(Box<Shape>),
    /// Used in a way that constrains nothing.
    Any,
}

impl Shape {
    /// Combines two observations of the same value.
    ///
    /// `Any` yields to anything more specific; two objects merge their
    /// fields; incompatible observations collapse to `Any`.
    pub fn merge(self, other: Shape) -> Shape {
        match (self, other) {
            (Shape::Any, other) | (other, Shape::Any) => other,
            (Shape::Scalar, Shape::Scalar) => Shape::Scalar,
            (Shape::Object(mut left), Shape::Object(right)) => {
                for (key, shape) in right {
                    match left.get_mut(&key) {
                        Some(existing) => {
                            let previous = std::mem::replace(existing, Shape::Any);
                            *existing = previous.merge(shape);
                        }
                        None => {
                            left.insert(key, shape);
                        }
                    }
                }
                Shape::Object(left)
            }
            (Shape::List(left), Shape::List(right)) => Shape::List(Box::new(left.merge(*right))),
            _ => Shape::Any,
        }
    }

    /// Builds the shape implied by the segments after the base variable,
    /// ending in `leaf`.
    fn from_segments(segments: &[&str], leaf: Shape) -> Shape {
        match segments.split_first() {
            None => leaf,
            Some((first, rest)) => {
                let mut fields = IndexMap::new();
                fields.insert((*first).to_string(), Shape::from_segments(rest, leaf));
                Shape::Object(fields)
            }
        }
    }
}

/// What is known about one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inference {
    Precise(Shape),
    Approximate(Shape),
    Unknown,
}

impl Inference {
    /// The inferred shape, if any.
    pub fn shape(&self) -> Option<&Shape> {
        match self {
            Inference::Precise(shape) | Inference::Approximate(shape) => Some(shape),
            Inference::Unknown => None,
        }
    }

    pub fn is_precise(&self) -> bool {
        matches!(self, Inference::Precise(_))
    }
}

/// Infers the shape of every top-level variable referenced by `source`.
///
/// # Example
///
/// ```rust
/// use quill_extract::{infer_shapes, Inference, Shape};
///
/// let shapes = infer_shapes("{{#each items}}-{{/each}} {{title}}");
/// assert!(matches!(shapes["items"], Inference::Precise(Shape::List(_))));
/// assert_eq!(shapes["title"], Inference::Precise(Shape::Scalar));
/// ```
pub fn infer_shapes(source: &str) -> IndexMap<String, Inference> {
    match ast::parse(source) {
        Ok(template) => {
            let mut collector = ShapeCollector::default();
            ast::walk(&template, &mut collector);
            collector
                .shapes
                .into_iter()
                .map(|(name, (shape, precise))| {
                    let inference = if precise {
                        Inference::Precise(shape)
                    } else {
                        Inference::Approximate(shape)
                    };
                    (name, inference)
                })
                .collect()
        }
        Err(_) => crate::lexical::scan(source)
            .variables
            .into_iter()
            .map(|name| (name, Inference::Unknown))
            .collect(),
    }
}

#[derive(Default)]
struct ShapeCollector {
    /// name → (shape, every observation was precise)
    shapes: IndexMap<String, (Shape, bool)>,
}

impl Visitor for ShapeCollector {
    fn reference(&mut self, reference: Reference<'_>) {
        let Some(base) = base_variable(reference.raw) else {
            return;
        };

        let (leaf, mut precise) = match reference.role {
            Role::Value => (Shape::Scalar, true),
            Role::BlockArgument("each") => (Shape::List(Box::new(Shape::Any)), true),
            Role::BlockArgument("with") => (Shape::Object(IndexMap::new()), true),
            Role::BlockArgument(_) | Role::Argument => (Shape::Any, false),
        };
        if reference.shifted {
            precise = false;
        }

        let rest = path_tail(reference.raw);
        let shape = Shape::from_segments(&rest, leaf);

        let entry = self
            .shapes
            .entry(base)
            .or_insert((Shape::Any, true));
        let existing = std::mem::replace(&mut entry.0, Shape::Any);
        entry.0 = existing.merge(shape);
        entry.1 &= precise;
    }
}

/// Segments after the base variable: `user.profile.name` → `["profile", "name"]`.
/// Index segments (`items[0]`, `items.0`) end the walk; the element type is
/// not tracked.
fn path_tail(raw: &str) -> Vec<&str> {
    let trimmed = raw
        .trim()
        .trim_start_matches("../")
        .trim_start_matches("./");
    let trimmed = trimmed
        .strip_prefix("this.")
        .or_else(|| trimmed.strip_prefix("this/"))
        .unwrap_or(trimmed);

    let mut tail = Vec::new();
    for segment in trimmed.split(['.', '/']).skip(1) {
        if segment.is_empty() || segment.contains('[') || segment.parse::<usize>().is_ok() {
            break;
        }
        tail.push(segment);
    }
    if trimmed.split(['.', '/']).next().is_some_and(|s| s.contains('[')) {
        tail.clear();
    }
    tail
}
