//! Explicit teardown of descriptor trees.
//!
//! Dropping a [`TypeDescriptor`] already frees it. These functions do the
//! same walk by hand, children before parents, and report how many owned
//! nodes went away so callers can log rollbacks and tests can check them.

use crate::descriptor::{Aggregate, TypeDescriptor};

/// Releases a tree post-order. Primitives are shared singletons and are
/// left alone. Returns the number of aggregate nodes freed.
pub fn release_type(ty: TypeDescriptor) -> usize {
    match ty {
        TypeDescriptor::Primitive(_) => 0,
        TypeDescriptor::Aggregate(aggregate) => release_aggregate(aggregate),
    }
}

/// Releases every child of `aggregate` in order, then the aggregate itself.
pub fn release_aggregate(mut aggregate: Box<Aggregate>) -> usize {
    let released: usize = aggregate.children.drain(..).map(release_type).sum();
    drop(aggregate);
    released + 1
}

/// Releases each tree in order, then the list storage.
pub fn release_all(types: Vec<TypeDescriptor>) -> usize {
    let released = types.into_iter().map(release_type).sum();
    log::trace!("released {} aggregate node(s)", released);
    released
}
