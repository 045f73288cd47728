//! Type display and canonical naming.

use crate::def::DefinitionStore;
use crate::intern::TypeInterner;
use crate::types::{TypeData, TypeId};

pub struct TypeFormatter<'a> {
    interner: &'a TypeInterner,
    defs: &'a DefinitionStore,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(interner: &'a TypeInterner, defs: &'a DefinitionStore) -> Self {
        TypeFormatter { interner, defs }
    }

    pub fn format(&self, ty: TypeId) -> String {
        match self.interner.lookup(ty) {
            Some(TypeData::Intrinsic(kind)) => kind.name().to_string(),
            Some(TypeData::IntLiteral(value)) => value.to_string(),
            Some(TypeData::Declared(def)) => self
                .defs
                .get_name(def)
                .unwrap_or_else(|| format!("<def {}>", def.0)),
            Some(TypeData::Error) | None => "<error>".to_string(),
        }
    }

    /// Comma-separated list, as used in call-site diagnostics.
    pub fn format_list(&self, types: &[TypeId]) -> String {
        types
            .iter()
            .map(|ty| self.format(*ty))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `App.fn2(U8)`: qualified name plus parameter types.
    pub fn overload_key(&self, qualified_name: &str, params: &[TypeId]) -> String {
        let params: Vec<String> = params.iter().map(|ty| self.format(*ty)).collect();
        format!("{}({})", qualified_name, params.join(","))
    }

    pub fn instance_name(&self, base: &str, args: &[TypeId]) -> String {
        let args: Vec<String> = args.iter().map(|ty| self.format(*ty)).collect();
        canonical_instance_name(base, &args)
    }
}

/// Template name plus its joined type-argument names: `Struct<U8>`.
pub fn canonical_instance_name(base: &str, args: &[String]) -> String {
    format!("{}<{}>", base, args.join(","))
}
