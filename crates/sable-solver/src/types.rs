//! Type identities and the intrinsic type table.

use serde::Serialize;

use crate::def::DefId;

/// Interned type handle. Equal ids mean equal types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Placeholder given to anything whose resolution failed. It converts to
    /// and from every type so one failure does not cascade.
    pub const ERROR: TypeId = TypeId(0);
    pub const VOID: TypeId = TypeId(1);
    pub const BOOL: TypeId = TypeId(2);
    pub const STRING: TypeId = TypeId(3);
    pub const U8: TypeId = TypeId(4);
    pub const U16: TypeId = TypeId(5);
    pub const U32: TypeId = TypeId(6);
    pub const U64: TypeId = TypeId(7);
    pub const I8: TypeId = TypeId(8);
    pub const I16: TypeId = TypeId(9);
    pub const I32: TypeId = TypeId(10);
    pub const I64: TypeId = TypeId(11);
    pub const F32: TypeId = TypeId(12);
    pub const F64: TypeId = TypeId(13);

    /// First id handed out for non-intrinsic types.
    pub const FIRST_USER: u32 = 64;

    pub const fn is_error(self) -> bool {
        self.0 == Self::ERROR.0
    }

    pub const fn is_intrinsic(self) -> bool {
        self.0 > Self::ERROR.0 && self.0 < Self::FIRST_USER
    }

    pub fn intrinsic(self) -> Option<IntrinsicKind> {
        IntrinsicKind::ALL.into_iter().find(|k| k.type_id() == self)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum NumericFamily {
    Unsigned,
    Signed,
    Float,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IntrinsicKind {
    Void,
    Bool,
    String,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl IntrinsicKind {
    pub const ALL: [IntrinsicKind; 13] = [
        IntrinsicKind::Void,
        IntrinsicKind::Bool,
        IntrinsicKind::String,
        IntrinsicKind::U8,
        IntrinsicKind::U16,
        IntrinsicKind::U32,
        IntrinsicKind::U64,
        IntrinsicKind::I8,
        IntrinsicKind::I16,
        IntrinsicKind::I32,
        IntrinsicKind::I64,
        IntrinsicKind::F32,
        IntrinsicKind::F64,
    ];

    pub const NUMERIC: [IntrinsicKind; 10] = [
        IntrinsicKind::U8,
        IntrinsicKind::U16,
        IntrinsicKind::U32,
        IntrinsicKind::U64,
        IntrinsicKind::I8,
        IntrinsicKind::I16,
        IntrinsicKind::I32,
        IntrinsicKind::I64,
        IntrinsicKind::F32,
        IntrinsicKind::F64,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            IntrinsicKind::Void => "Void",
            IntrinsicKind::Bool => "Bool",
            IntrinsicKind::String => "String",
            IntrinsicKind::U8 => "U8",
            IntrinsicKind::U16 => "U16",
            IntrinsicKind::U32 => "U32",
            IntrinsicKind::U64 => "U64",
            IntrinsicKind::I8 => "I8",
            IntrinsicKind::I16 => "I16",
            IntrinsicKind::I32 => "I32",
            IntrinsicKind::I64 => "I64",
            IntrinsicKind::F32 => "F32",
            IntrinsicKind::F64 => "F64",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub const fn type_id(self) -> TypeId {
        match self {
            IntrinsicKind::Void => TypeId::VOID,
            IntrinsicKind::Bool => TypeId::BOOL,
            IntrinsicKind::String => TypeId::STRING,
            IntrinsicKind::U8 => TypeId::U8,
            IntrinsicKind::U16 => TypeId::U16,
            IntrinsicKind::U32 => TypeId::U32,
            IntrinsicKind::U64 => TypeId::U64,
            IntrinsicKind::I8 => TypeId::I8,
            IntrinsicKind::I16 => TypeId::I16,
            IntrinsicKind::I32 => TypeId::I32,
            IntrinsicKind::I64 => TypeId::I64,
            IntrinsicKind::F32 => TypeId::F32,
            IntrinsicKind::F64 => TypeId::F64,
        }
    }

    pub const fn family(self) -> Option<NumericFamily> {
        match self {
            IntrinsicKind::U8 | IntrinsicKind::U16 | IntrinsicKind::U32 | IntrinsicKind::U64 => {
                Some(NumericFamily::Unsigned)
            }
            IntrinsicKind::I8 | IntrinsicKind::I16 | IntrinsicKind::I32 | IntrinsicKind::I64 => {
                Some(NumericFamily::Signed)
            }
            IntrinsicKind::F32 | IntrinsicKind::F64 => Some(NumericFamily::Float),
            IntrinsicKind::Void | IntrinsicKind::Bool | IntrinsicKind::String => None,
        }
    }

    /// Width in bits; 0 for non-numeric types.
    pub const fn width(self) -> u32 {
        match self {
            IntrinsicKind::U8 | IntrinsicKind::I8 => 8,
            IntrinsicKind::U16 | IntrinsicKind::I16 => 16,
            IntrinsicKind::U32 | IntrinsicKind::I32 | IntrinsicKind::F32 => 32,
            IntrinsicKind::U64 | IntrinsicKind::I64 | IntrinsicKind::F64 => 64,
            IntrinsicKind::Void | IntrinsicKind::Bool | IntrinsicKind::String => 0,
        }
    }

    pub const fn is_numeric(self) -> bool {
        self.family().is_some()
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self.family(),
            Some(NumericFamily::Unsigned | NumericFamily::Signed)
        )
    }

    /// Inclusive value range of an integer type.
    pub const fn integer_range(self) -> Option<(i128, i128)> {
        let bits = self.width();
        match self.family() {
            Some(NumericFamily::Unsigned) => Some((0, (1i128 << bits) - 1)),
            Some(NumericFamily::Signed) => Some((-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)),
            _ => None,
        }
    }

    pub const fn fits(self, value: i128) -> bool {
        match self.integer_range() {
            Some((min, max)) => value >= min && value <= max,
            None => false,
        }
    }
}

/// What an interned `TypeId` stands for.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeData {
    Error,
    Intrinsic(IntrinsicKind),
    /// The not-yet-widened type of an integer literal expression.
    IntLiteral(i128),
    /// A user type declaration or template instance.
    Declared(DefId),
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
