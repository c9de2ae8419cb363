//! The libffi backend.
//!
//! Descriptor trees are mirrored into `libffi::middle::Type`s, prepared with
//! `ffi_prep_cif`, and the struct layouts libffi computes are copied back
//! into the trees.

use crate::backend::{check_void_placement, Backend, BackendError};
use ffisig_types::{PrimitiveType, TypeDescriptor};
use libffi::low;
use libffi::middle::{Arg, CodePtr, Type};
use std::fmt;
use std::mem::{ManuallyDrop, MaybeUninit};
use std::os::raw::c_void;

impl From<low::Error> for BackendError {
    fn from(err: low::Error) -> Self {
        match err {
            low::Error::Typedef => BackendError::Typedef,
            low::Error::Abi => BackendError::Abi,
        }
    }
}

/// Prepares call interfaces for the platform's default calling convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibffiBackend;

impl Backend for LibffiBackend {
    type Handle = PreparedCif;

    fn prepare(
        &self,
        return_type: Option<&mut TypeDescriptor>,
        argument_types: &mut [TypeDescriptor],
    ) -> Result<PreparedCif, BackendError> {
        let Some(return_type) = return_type else {
            return Err(BackendError::MissingReturnType);
        };
        check_void_placement(Some(&*return_type), argument_types)?;

        let result = ffi_type_for(return_type)?;
        let args = argument_types
            .iter()
            .map(ffi_type_for)
            .collect::<Result<Vec<_>, _>>()?;
        let mut raw_args: Vec<*mut low::ffi_type> = args.iter().map(Type::as_raw_ptr).collect();
        let mut cif: Box<low::ffi_cif> = Box::default();

        // SAFETY: every pointer handed over is owned by `args`/`result`
        // (or is one of libffi's static primitive types) and is kept alive
        // alongside the cif in the returned `PreparedCif`.
        unsafe {
            low::prep_cif(
                &mut *cif,
                low::ffi_abi_FFI_DEFAULT_ABI,
                raw_args.len(),
                result.as_raw_ptr(),
                raw_args.as_mut_ptr(),
            )?;
        }

        // SAFETY: prep_cif succeeded, so every struct type reachable from
        // these pointers has been laid out and has a valid elements array.
        unsafe {
            record_layout(return_type, result.as_raw_ptr());
            for (ty, raw) in argument_types.iter_mut().zip(&raw_args) {
                record_layout(ty, *raw);
            }
        }

        log::debug!(
            "prepared cif: {} argument(s), return size {}",
            raw_args.len(),
            cif.rtype_size()
        );
        Ok(PreparedCif {
            cif,
            raw_args,
            args,
            result,
        })
    }
}

fn ffi_type_for(ty: &TypeDescriptor) -> Result<Type, BackendError> {
    match ty {
        TypeDescriptor::Primitive(primitive) => primitive_type(**primitive),
        TypeDescriptor::Aggregate(aggregate) => {
            let fields = aggregate
                .children
                .iter()
                .map(ffi_type_for)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Type::structure(fields))
        }
    }
}

fn primitive_type(primitive: PrimitiveType) -> Result<Type, BackendError> {
    let ty = match primitive {
        PrimitiveType::Void => Type::void(),
        PrimitiveType::Pointer => Type::pointer(),
        PrimitiveType::UChar => Type::c_uchar(),
        PrimitiveType::SChar => Type::c_schar(),
        PrimitiveType::UShort => Type::c_ushort(),
        PrimitiveType::SShort => Type::c_short(),
        PrimitiveType::UInt => Type::c_uint(),
        PrimitiveType::SInt => Type::c_int(),
        PrimitiveType::ULong => Type::c_ulong(),
        PrimitiveType::SLong => Type::c_long(),
        PrimitiveType::U8 => Type::u8(),
        PrimitiveType::I8 => Type::i8(),
        PrimitiveType::U16 => Type::u16(),
        PrimitiveType::I16 => Type::i16(),
        PrimitiveType::U32 => Type::u32(),
        PrimitiveType::I32 => Type::i32(),
        PrimitiveType::U64 => Type::u64(),
        PrimitiveType::I64 => Type::i64(),
        PrimitiveType::F32 => Type::f32(),
        PrimitiveType::F64 => Type::f64(),
        #[cfg(not(any(target_arch = "arm", target_arch = "aarch64")))]
        PrimitiveType::LongDouble => Type::longdouble(),
        #[cfg(any(target_arch = "arm", target_arch = "aarch64"))]
        PrimitiveType::LongDouble => return Err(BackendError::Unsupported { primitive }),
    };
    Ok(ty)
}

/// Copies the size and alignment libffi computed for every struct in `raw`
/// into the matching aggregate of `ty`.
///
/// # Safety
///
/// `raw` must be the type built from `ty` by [`ffi_type_for`] and must have
/// been through a successful `prep_cif`.
unsafe fn record_layout(ty: &mut TypeDescriptor, raw: *const low::ffi_type) {
    let Some(aggregate) = ty.as_aggregate_mut() else {
        return;
    };
    let raw = &*raw;
    aggregate.size = raw.size;
    aggregate.alignment = raw.alignment;
    for (index, child) in aggregate.children.iter_mut().enumerate() {
        record_layout(child, *raw.elements.add(index));
    }
}

/// A call interface prepared by [`LibffiBackend`].
///
/// Owns the `ffi_cif` and every libffi type it points at. The cif is boxed so
/// its address stays put for as long as this value lives, which closures
/// prepared from [`PreparedCif::as_raw_ptr`] rely on.
pub struct PreparedCif {
    cif: Box<low::ffi_cif>,
    raw_args: Vec<*mut low::ffi_type>,
    args: Vec<Type>,
    result: Type,
}

// SAFETY: after preparation nothing mutates the cif or the type storage;
// libffi only reads them during a call. The raw pointers all point into
// storage owned by this value.
unsafe impl Send for PreparedCif {}
unsafe impl Sync for PreparedCif {}

/// Return buffer for `ffi_call`. libffi writes integral results narrower
/// than a register as a full `ffi_arg`.
#[repr(C)]
union ReturnSlot<R> {
    value: ManuallyDrop<R>,
    #[allow(dead_code)]
    widened: low::ffi_arg,
}

impl PreparedCif {
    pub fn argument_count(&self) -> usize {
        self.raw_args.len()
    }

    /// Size in bytes of the return value, zero for `void`.
    pub fn return_size(&self) -> usize {
        self.cif.rtype_size()
    }

    /// The raw cif, for use with libffi's closure API. Valid while `self` is.
    pub fn as_raw_ptr(&self) -> *mut low::ffi_cif {
        &*self.cif as *const low::ffi_cif as *mut low::ffi_cif
    }

    /// Calls `fun` with `args`, one pointer per declared argument.
    ///
    /// # Safety
    ///
    /// `fun` must have the signature this cif was prepared for, each `Arg`
    /// must point at a value of the matching argument type, and `R` must
    /// match the return type (`()` for `void`).
    pub unsafe fn call<R>(&self, fun: CodePtr, args: &[Arg]) -> Result<R, BackendError> {
        if args.len() != self.argument_count() {
            return Err(BackendError::ArgumentCount {
                expected: self.argument_count(),
                found: args.len(),
            });
        }

        let mut slot = MaybeUninit::<ReturnSlot<R>>::uninit();
        libffi::raw::ffi_call(
            self.as_raw_ptr(),
            Some(*fun.as_fun()),
            slot.as_mut_ptr() as *mut c_void,
            args.as_ptr() as *mut *mut c_void,
        );
        Ok(ManuallyDrop::into_inner(slot.assume_init().value))
    }
}

impl fmt::Debug for PreparedCif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedCif")
            .field("nargs", &self.cif.nargs)
            .field("args", &self.args.len())
            .field("return_size", &self.return_size())
            .field("result", &self.result)
            .finish()
    }
}

trait CifExt {
    fn rtype_size(&self) -> usize;
}

impl CifExt for low::ffi_cif {
    fn rtype_size(&self) -> usize {
        if self.rtype.is_null() {
            return 0;
        }
        // SAFETY: a prepared cif's rtype points at a live ffi_type.
        let rtype = unsafe { &*self.rtype };
        // libffi gives `ffi_type_void` a size of 1.
        if rtype.type_ as u32 == libffi::raw::FFI_TYPE_VOID as u32 {
            0
        } else {
            rtype.size
        }
    }
}
