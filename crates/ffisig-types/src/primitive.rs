use std::fmt;

/// The closed set of built-in machine types a signature may name.
///
/// Each variant has exactly one shared instance, see [`PrimitiveType::singleton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PrimitiveType {
    Void,
    Pointer,
    UChar,
    SChar,
    UShort,
    SShort,
    UInt,
    SInt,
    ULong,
    SLong,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    /// C `long double`, which is not 128 bits wide on every platform.
    LongDouble,
}

/// Backing storage for the singletons, indexed by discriminant.
static SINGLETONS: [PrimitiveType; 21] = PrimitiveType::ALL;

impl PrimitiveType {
    /// Every primitive type, in discriminant order.
    pub const ALL: [PrimitiveType; 21] = [
        PrimitiveType::Void,
        PrimitiveType::Pointer,
        PrimitiveType::UChar,
        PrimitiveType::SChar,
        PrimitiveType::UShort,
        PrimitiveType::SShort,
        PrimitiveType::UInt,
        PrimitiveType::SInt,
        PrimitiveType::ULong,
        PrimitiveType::SLong,
        PrimitiveType::U8,
        PrimitiveType::I8,
        PrimitiveType::U16,
        PrimitiveType::I16,
        PrimitiveType::U32,
        PrimitiveType::I32,
        PrimitiveType::U64,
        PrimitiveType::I64,
        PrimitiveType::F32,
        PrimitiveType::F64,
        PrimitiveType::LongDouble,
    ];

    /// The name used for this type in signature text.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Void => "void",
            PrimitiveType::Pointer => "ptr",
            PrimitiveType::UChar => "uchar",
            PrimitiveType::SChar => "char",
            PrimitiveType::UShort => "ushort",
            PrimitiveType::SShort => "short",
            PrimitiveType::UInt => "uint",
            PrimitiveType::SInt => "int",
            PrimitiveType::ULong => "ulong",
            PrimitiveType::SLong => "long",
            PrimitiveType::U8 => "u8",
            PrimitiveType::I8 => "i8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::I16 => "i16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::I32 => "i32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::I64 => "i64",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::LongDouble => "f128",
        }
    }

    /// Resolves a type name. Matching is exact: case-sensitive, full length.
    pub fn from_name(name: &str) -> Option<PrimitiveType> {
        let primitive = match name {
            "void" => PrimitiveType::Void,
            "ptr" => PrimitiveType::Pointer,
            "uchar" => PrimitiveType::UChar,
            "char" => PrimitiveType::SChar,
            "ushort" => PrimitiveType::UShort,
            "short" => PrimitiveType::SShort,
            "uint" => PrimitiveType::UInt,
            "int" => PrimitiveType::SInt,
            "ulong" => PrimitiveType::ULong,
            "long" => PrimitiveType::SLong,
            "u8" => PrimitiveType::U8,
            "i8" => PrimitiveType::I8,
            "u16" => PrimitiveType::U16,
            "i16" => PrimitiveType::I16,
            "u32" => PrimitiveType::U32,
            "i32" => PrimitiveType::I32,
            "u64" => PrimitiveType::U64,
            "i64" => PrimitiveType::I64,
            "f32" => PrimitiveType::F32,
            "f64" => PrimitiveType::F64,
            "f128" => PrimitiveType::LongDouble,
            _ => return None,
        };
        Some(primitive)
    }

    /// The shared instance for this type. Every call with the same variant
    /// returns the same address.
    pub fn singleton(self) -> &'static PrimitiveType {
        &SINGLETONS[self as usize]
    }

    /// Resolves a type name straight to its singleton.
    pub fn lookup(name: &str) -> Option<&'static PrimitiveType> {
        Self::from_name(name).map(Self::singleton)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
