use ffisig_types::{PrimitiveType, TypeDescriptor};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum BackendError {
    #[error("The backend rejected a type definition")]
    #[diagnostic(code("BACKEND-001"), help("empty structs cannot be passed by value"))]
    Typedef,

    #[error("The backend does not support the requested calling convention")]
    #[diagnostic(code("BACKEND-002"))]
    Abi,

    #[error("'void' is only valid as a return type, found in {location}")]
    #[diagnostic(code("BACKEND-003"))]
    VoidNotAllowed { location: String },

    #[error("No return type was given")]
    #[diagnostic(code("BACKEND-004"), help("use \"void\" for functions that return nothing"))]
    MissingReturnType,

    #[error("'{primitive}' is not supported on this target")]
    #[diagnostic(code("BACKEND-005"))]
    Unsupported { primitive: PrimitiveType },

    #[error("Expected {expected} argument(s), got {found}")]
    #[diagnostic(code("BACKEND-006"))]
    ArgumentCount { expected: usize, found: usize },
}

/// A native call facility that can turn assembled descriptor trees into a
/// prepared, invocable call interface.
///
/// `prepare` may write layout information (aggregate size and alignment)
/// back into the trees it is given. It must not keep references to them:
/// the trees stay owned by the caller.
pub trait Backend {
    type Handle;

    fn prepare(
        &self,
        return_type: Option<&mut TypeDescriptor>,
        argument_types: &mut [TypeDescriptor],
    ) -> Result<Self::Handle, BackendError>;
}

impl<B: Backend + ?Sized> Backend for &B {
    type Handle = B::Handle;

    fn prepare(
        &self,
        return_type: Option<&mut TypeDescriptor>,
        argument_types: &mut [TypeDescriptor],
    ) -> Result<Self::Handle, BackendError> {
        (**self).prepare(return_type, argument_types)
    }
}

/// Rejects `void` anywhere in an argument tree or inside a struct, which
/// no backend can lay out. Returns where it was found.
pub fn check_void_placement(
    return_type: Option<&TypeDescriptor>,
    argument_types: &[TypeDescriptor],
) -> Result<(), BackendError> {
    for (index, ty) in argument_types.iter().enumerate() {
        if let Some(path) = ty.find_void() {
            return Err(BackendError::VoidNotAllowed {
                location: describe_path(&format!("argument {}", index), &path),
            });
        }
    }
    if let Some(ty) = return_type {
        if let Some(path) = ty.find_void().filter(|path| !path.is_empty()) {
            return Err(BackendError::VoidNotAllowed {
                location: describe_path("the return type", &path),
            });
        }
    }
    Ok(())
}

fn describe_path(root: &str, path: &[usize]) -> String {
    path.iter()
        .rev()
        .fold(String::new(), |acc, index| format!("{}field {} of ", acc, index))
        + root
}
