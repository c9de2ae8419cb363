use crate::backend::BackendError;
use crate::native::PreparedCif;
use ffisig_types::{release_all, release_type, TypeDescriptor};
use libffi::middle::{Arg, CodePtr};
use std::fmt;
use std::fmt::Write as _;

/// An assembled foreign function signature together with the backend state
/// that makes it callable.
///
/// The only way to get one is a successful build, so a `CallDescriptor` is
/// always prepared. It owns its type trees; they are freed exactly once,
/// either by [`CallDescriptor::release`] or by dropping it.
#[derive(Debug)]
pub struct CallDescriptor<H = PreparedCif> {
    return_type: Option<TypeDescriptor>,
    argument_types: Vec<TypeDescriptor>,
    prepared: H,
}

impl<H> CallDescriptor<H> {
    pub(crate) fn new(
        return_type: Option<TypeDescriptor>,
        argument_types: Vec<TypeDescriptor>,
        prepared: H,
    ) -> Self {
        Self {
            return_type,
            argument_types,
            prepared,
        }
    }

    pub fn argument_count(&self) -> usize {
        self.argument_types.len()
    }

    pub fn argument_types(&self) -> &[TypeDescriptor] {
        &self.argument_types
    }

    /// `None` only when built with `MissingKeyPolicy::Lenient` against a
    /// backend that accepts a missing return type.
    pub fn return_type(&self) -> Option<&TypeDescriptor> {
        self.return_type.as_ref()
    }

    pub fn prepared(&self) -> &H {
        &self.prepared
    }

    /// Tears the descriptor down: the backend handle first, then the return
    /// type tree, then each argument tree in order, then the argument list.
    /// Returns the number of aggregate nodes freed.
    pub fn release(self) -> usize {
        let CallDescriptor {
            return_type,
            argument_types,
            prepared,
        } = self;
        drop(prepared);
        let released = return_type.map_or(0, release_type) + release_all(argument_types);
        log::debug!("released call descriptor ({} aggregate node(s))", released);
        released
    }

    /// Multi-line dump of the signature, with struct layouts.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "return type:");
        match &self.return_type {
            Some(ty) => indent_into(&mut out, &ty.render_tree()),
            None => {
                let _ = writeln!(out, "  (none)");
            }
        }
        for (index, ty) in self.argument_types.iter().enumerate() {
            let _ = writeln!(out, "argument {}:", index);
            indent_into(&mut out, &ty.render_tree());
        }
        out
    }
}

fn indent_into(out: &mut String, text: &str) {
    for line in text.lines() {
        let _ = writeln!(out, "  {}", line);
    }
}

impl CallDescriptor<PreparedCif> {
    /// Invokes `fun` through the prepared cif.
    ///
    /// # Safety
    ///
    /// Same contract as [`PreparedCif::call`]: `fun`, `args` and `R` must
    /// all match the signature this descriptor was built from.
    pub unsafe fn call<R>(&self, fun: CodePtr, args: &[Arg]) -> Result<R, BackendError> {
        self.prepared.call(fun, args)
    }
}

impl<H> fmt::Display for CallDescriptor<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(")?;
        for (i, ty) in self.argument_types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", ty)?;
        }
        write!(f, ")")?;
        match &self.return_type {
            Some(ty) => write!(f, " -> {}", ty),
            None => Ok(()),
        }
    }
}
