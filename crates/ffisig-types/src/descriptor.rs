use crate::primitive::PrimitiveType;
use std::fmt;
use std::fmt::Write as _;

/// A node in a type descriptor tree.
///
/// Primitives point at the shared singleton for their tag and own nothing.
/// Aggregates own their children; dropping or releasing an aggregate
/// releases the whole subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    Primitive(&'static PrimitiveType),
    Aggregate(Box<Aggregate>),
}

/// A struct-like composite: an ordered list of field types plus the layout
/// the backend computed for it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Aggregate {
    pub children: Vec<TypeDescriptor>,
    /// Size in bytes. Zero until the backend lays the aggregate out.
    pub size: usize,
    /// Alignment in bytes. Zero until the backend lays the aggregate out.
    pub alignment: u16,
}

impl Aggregate {
    pub fn with_capacity(capacity: usize) -> Self {
        Aggregate {
            children: Vec::with_capacity(capacity),
            size: 0,
            alignment: 0,
        }
    }

    /// Whether a backend has filled in size and alignment.
    pub fn is_laid_out(&self) -> bool {
        self.size != 0 && self.alignment != 0
    }
}

impl TypeDescriptor {
    pub fn primitive(primitive: PrimitiveType) -> Self {
        TypeDescriptor::Primitive(primitive.singleton())
    }

    pub fn aggregate(children: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Aggregate(Box::new(Aggregate {
            children,
            ..Aggregate::default()
        }))
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            TypeDescriptor::Primitive(primitive) => Some(**primitive),
            TypeDescriptor::Aggregate(_) => None,
        }
    }

    pub fn as_aggregate(&self) -> Option<&Aggregate> {
        match self {
            TypeDescriptor::Aggregate(aggregate) => Some(&**aggregate),
            TypeDescriptor::Primitive(_) => None,
        }
    }

    pub fn as_aggregate_mut(&mut self) -> Option<&mut Aggregate> {
        match self {
            TypeDescriptor::Aggregate(aggregate) => Some(&mut **aggregate),
            TypeDescriptor::Primitive(_) => None,
        }
    }

    pub fn is_void(&self) -> bool {
        self.as_primitive() == Some(PrimitiveType::Void)
    }

    /// Number of heap-allocated (aggregate) nodes in this tree.
    pub fn owned_nodes(&self) -> usize {
        match self {
            TypeDescriptor::Primitive(_) => 0,
            TypeDescriptor::Aggregate(aggregate) => {
                1 + aggregate.children.iter().map(TypeDescriptor::owned_nodes).sum::<usize>()
            }
        }
    }

    /// Nesting depth; a primitive has depth 0.
    pub fn depth(&self) -> usize {
        match self {
            TypeDescriptor::Primitive(_) => 0,
            TypeDescriptor::Aggregate(aggregate) => {
                1 + aggregate.children.iter().map(TypeDescriptor::depth).max().unwrap_or(0)
            }
        }
    }

    /// Finds the first `void` anywhere in the tree, returning the path of
    /// child indices leading to it.
    pub fn find_void(&self) -> Option<Vec<usize>> {
        match self {
            TypeDescriptor::Primitive(_) if self.is_void() => Some(Vec::new()),
            TypeDescriptor::Primitive(_) => None,
            TypeDescriptor::Aggregate(aggregate) => {
                aggregate.children.iter().enumerate().find_map(|(index, child)| {
                    child.find_void().map(|mut path| {
                        path.insert(0, index);
                        path
                    })
                })
            }
        }
    }

    /// Renders the tree one node per line, with layouts where known.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, 0);
        out
    }

    fn write_tree(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match self {
            TypeDescriptor::Primitive(primitive) => {
                let _ = writeln!(out, "{}{}", indent, primitive);
            }
            TypeDescriptor::Aggregate(aggregate) => {
                if aggregate.is_laid_out() {
                    let _ = writeln!(
                        out,
                        "{}struct (size {}, align {})",
                        indent, aggregate.size, aggregate.alignment
                    );
                } else {
                    let _ = writeln!(out, "{}struct", indent);
                }
                for child in &aggregate.children {
                    child.write_tree(out, depth + 1);
                }
            }
        }
    }
}

impl From<PrimitiveType> for TypeDescriptor {
    fn from(primitive: PrimitiveType) -> Self {
        TypeDescriptor::primitive(primitive)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(primitive) => write!(f, "{}", primitive),
            TypeDescriptor::Aggregate(aggregate) if aggregate.children.is_empty() => {
                write!(f, "struct {{}}")
            }
            TypeDescriptor::Aggregate(aggregate) => {
                write!(f, "struct {{ ")?;
                for (i, child) in aggregate.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, " }}")
            }
        }
    }
}
