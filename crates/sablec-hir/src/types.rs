//! Semantic types.
//!
//! Types are interned: a [`TypeId`] is an index into the [`TypeInterner`]
//! and equality of ids is equality of types. Struct and enum bodies live in
//! side tables keyed by [`StructId`]/[`EnumId`], so the interned kind for a
//! nominal type is just its id.

use indexmap::IndexSet;
use sablec_util::{define_idx, IndexVec, Symbol};

define_idx!(
    /// Interned type handle. Identity comparison is type equality.
    TypeId
);
define_idx!(StructId);
define_idx!(EnumId);

/// Primitive integer kinds: signed/unsigned at 32-bit and pointer width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntKind {
    I32,
    U32,
    Isize,
    Usize,
}

impl IntKind {
    pub fn is_signed(self) -> bool {
        matches!(self, IntKind::I32 | IntKind::Isize)
    }

    pub fn name(self) -> &'static str {
        match self {
            IntKind::I32 => "i32",
            IntKind::U32 => "u32",
            IntKind::Isize => "isize",
            IntKind::Usize => "usize",
        }
    }
}

/// Structural shape of a type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Int(IntKind),
    Bool,
    Char,
    /// String slice. Scalar at the ABI level.
    Str,
    Unit,
    Never,
    Struct(StructId),
    Enum(EnumId),
    Array { elem: TypeId, len: u64 },
    Ref { pointee: TypeId, mutable: bool },
}

/// A struct field: declared name and type, in canonical declaration order.
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: Symbol,
    pub ty: TypeId,
}

#[derive(Clone, Debug)]
pub struct StructDef {
    pub name: Symbol,
    pub fields: Vec<FieldDef>,
}

/// A C-like enum: unit variants with explicit discriminants over `repr`.
#[derive(Clone, Debug)]
pub struct EnumDef {
    pub name: Symbol,
    pub repr: IntKind,
    pub variants: Vec<VariantDef>,
}

#[derive(Clone, Debug)]
pub struct VariantDef {
    pub name: Symbol,
    pub discr: u64,
}

/// Canonicalizing type table.
pub struct TypeInterner {
    kinds: IndexSet<TypeKind>,
    pub structs: IndexVec<StructId, StructDef>,
    pub enums: IndexVec<EnumId, EnumDef>,
}

impl TypeInterner {
    pub fn new() -> Self {
        Self {
            kinds: IndexSet::new(),
            structs: IndexVec::new(),
            enums: IndexVec::new(),
        }
    }

    /// Canonicalize `kind`; equal kinds always yield the same id.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        let (index, _) = self.kinds.insert_full(kind);
        TypeId(index as u32)
    }

    pub fn kind(&self, ty: TypeId) -> &TypeKind {
        self.kinds
            .get_index(ty.0 as usize)
            .expect("TypeId out of range")
    }

    // Shorthand constructors for the primitives.

    pub fn int(&mut self, kind: IntKind) -> TypeId {
        self.intern(TypeKind::Int(kind))
    }

    pub fn i32(&mut self) -> TypeId {
        self.int(IntKind::I32)
    }

    pub fn u32(&mut self) -> TypeId {
        self.int(IntKind::U32)
    }

    pub fn usize_ty(&mut self) -> TypeId {
        self.int(IntKind::Usize)
    }

    pub fn bool(&mut self) -> TypeId {
        self.intern(TypeKind::Bool)
    }

    pub fn char(&mut self) -> TypeId {
        self.intern(TypeKind::Char)
    }

    pub fn str(&mut self) -> TypeId {
        self.intern(TypeKind::Str)
    }

    pub fn unit(&mut self) -> TypeId {
        self.intern(TypeKind::Unit)
    }

    pub fn never(&mut self) -> TypeId {
        self.intern(TypeKind::Never)
    }

    pub fn array(&mut self, elem: TypeId, len: u64) -> TypeId {
        self.intern(TypeKind::Array { elem, len })
    }

    pub fn make_ref(&mut self, pointee: TypeId, mutable: bool) -> TypeId {
        self.intern(TypeKind::Ref { pointee, mutable })
    }

    /// Register a struct definition, returning its id and interned type.
    pub fn declare_struct(&mut self, name: Symbol, fields: Vec<FieldDef>) -> (StructId, TypeId) {
        let id = self.structs.push(StructDef { name, fields });
        let ty = self.intern(TypeKind::Struct(id));
        (id, ty)
    }

    /// Register an enum definition, returning its id and interned type.
    pub fn declare_enum(
        &mut self,
        name: Symbol,
        repr: IntKind,
        variants: Vec<VariantDef>,
    ) -> (EnumId, TypeId) {
        let id = self.enums.push(EnumDef { name, repr, variants });
        let ty = self.intern(TypeKind::Enum(id));
        (id, ty)
    }

    // Queries.

    pub fn is_never(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Never)
    }

    pub fn is_unit(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Unit)
    }

    /// Structs and arrays: types that live in memory, not in a register.
    pub fn is_aggregate(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Struct(_) | TypeKind::Array { .. })
    }

    pub fn is_primitive(&self, ty: TypeId) -> bool {
        matches!(
            self.kind(ty),
            TypeKind::Int(_) | TypeKind::Bool | TypeKind::Char | TypeKind::Str | TypeKind::Unit
        )
    }

    pub fn is_bool(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Bool)
    }

    pub fn int_kind(&self, ty: TypeId) -> Option<IntKind> {
        match self.kind(ty) {
            TypeKind::Int(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_signed_int(&self, ty: TypeId) -> bool {
        self.int_kind(ty).is_some_and(|k| k.is_signed())
    }

    pub fn field_ty(&self, ty: TypeId, index: u32) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Struct(id) => self.structs[*id].fields.get(index as usize).map(|f| f.ty),
            _ => None,
        }
    }

    pub fn field_count(&self, ty: TypeId) -> Option<usize> {
        match self.kind(ty) {
            TypeKind::Struct(id) => Some(self.structs[*id].fields.len()),
            _ => None,
        }
    }

    pub fn element_ty(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Array { elem, .. } => Some(*elem),
            _ => None,
        }
    }

    pub fn array_len(&self, ty: TypeId) -> Option<u64> {
        match self.kind(ty) {
            TypeKind::Array { len, .. } => Some(*len),
            _ => None,
        }
    }

    pub fn pointee(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Ref { pointee, .. } => Some(*pointee),
            _ => None,
        }
    }

    /// The repr integer kind an enum value carries at the MIR level.
    pub fn enum_repr(&self, ty: TypeId) -> Option<IntKind> {
        match self.kind(ty) {
            TypeKind::Enum(id) => Some(self.enums[*id].repr),
            _ => None,
        }
    }

    /// Human-readable name, used by the MIR pretty-printer.
    pub fn display_name(&self, ty: TypeId) -> String {
        match self.kind(ty) {
            TypeKind::Int(kind) => kind.name().to_owned(),
            TypeKind::Bool => "bool".to_owned(),
            TypeKind::Char => "char".to_owned(),
            TypeKind::Str => "str".to_owned(),
            TypeKind::Unit => "()".to_owned(),
            TypeKind::Never => "!".to_owned(),
            TypeKind::Struct(id) => self.structs[*id].name.as_str().to_owned(),
            TypeKind::Enum(id) => self.enums[*id].name.as_str().to_owned(),
            TypeKind::Array { elem, len } => {
                format!("[{}; {}]", self.display_name(*elem), len)
            }
            TypeKind::Ref { pointee, mutable } => {
                let m = if *mutable { "mut " } else { "" };
                format!("&{}{}", m, self.display_name(*pointee))
            }
        }
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_canonicalizes() {
        let mut tys = TypeInterner::new();
        let a = tys.i32();
        let b = tys.i32();
        assert_eq!(a, b);

        let r1 = tys.make_ref(a, false);
        let r2 = tys.make_ref(b, false);
        assert_eq!(r1, r2);

        let rm = tys.make_ref(a, true);
        assert_ne!(r1, rm);
    }

    #[test]
    fn aggregate_classification() {
        let mut tys = TypeInterner::new();
        let i32_ty = tys.i32();
        let arr = tys.array(i32_ty, 4);
        let (_, pair) = tys.declare_struct(
            Symbol::intern("Pair"),
            vec![
                FieldDef { name: Symbol::intern("x"), ty: i32_ty },
                FieldDef { name: Symbol::intern("y"), ty: i32_ty },
            ],
        );
        let r = tys.make_ref(pair, false);

        assert!(tys.is_aggregate(arr));
        assert!(tys.is_aggregate(pair));
        assert!(!tys.is_aggregate(i32_ty));
        assert!(!tys.is_aggregate(r));
    }

    #[test]
    fn struct_field_queries() {
        let mut tys = TypeInterner::new();
        let i32_ty = tys.i32();
        let bool_ty = tys.bool();
        let (_, s) = tys.declare_struct(
            Symbol::intern("S"),
            vec![
                FieldDef { name: Symbol::intern("a"), ty: i32_ty },
                FieldDef { name: Symbol::intern("b"), ty: bool_ty },
            ],
        );
        assert_eq!(tys.field_ty(s, 0), Some(i32_ty));
        assert_eq!(tys.field_ty(s, 1), Some(bool_ty));
        assert_eq!(tys.field_ty(s, 2), None);
        assert_eq!(tys.field_count(s), Some(2));
    }

    #[test]
    fn enum_repr_is_its_integer() {
        let mut tys = TypeInterner::new();
        let (_, color) = tys.declare_enum(
            Symbol::intern("Color"),
            IntKind::U32,
            vec![
                VariantDef { name: Symbol::intern("Red"), discr: 0 },
                VariantDef { name: Symbol::intern("Green"), discr: 1 },
            ],
        );
        assert_eq!(tys.enum_repr(color), Some(IntKind::U32));
        assert!(!tys.is_aggregate(color));
    }

    #[test]
    fn display_names() {
        let mut tys = TypeInterner::new();
        let i32_ty = tys.i32();
        let arr = tys.array(i32_ty, 3);
        let r = tys.make_ref(arr, true);
        assert_eq!(tys.display_name(r), "&mut [i32; 3]");
    }
}
