//! The resolved declaration graph handed back to the caller.
//!
//! Everything here is plain data: type handles are rendered to display
//! strings and definitions are named by overload key (functions) or
//! qualified name (everything else), so the unit can be serialized and
//! compared without the interner that produced it.

use sable_binder::{DeclOrder, Locality};
use sable_common::{Diagnostic, Span};
use sable_solver::{DefId, DefKind, ReferenceTarget, TypeId};
use serde::Serialize;

use crate::context::ResolverContext;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedUnit {
    /// Top-level declarations in source order.
    pub declarations: Vec<ResolvedDeclaration>,
    /// Template instances ordered by canonical name.
    pub instances: Vec<ResolvedDeclaration>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDeclaration {
    pub kind: DefKind,
    pub name: String,
    pub qualified_name: String,
    pub span: Span,
    pub locality: Locality,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub type_args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_of: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ResolvedField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ResolvedOption>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ResolvedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub var_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overload_key: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<ResolvedDeclaration>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ResolvedUse>,
    pub failed: bool,

    #[serde(skip)]
    pub def: DefId,
    #[serde(skip)]
    pub template: Option<DefId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedField {
    pub name: String,
    pub ty: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedOption {
    pub name: String,
    pub value: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedUse {
    pub name: String,
    pub span: Span,
    pub target: UseTarget,
    #[serde(skip)]
    pub def: Option<DefId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum UseTarget {
    /// Overload key for functions, qualified name otherwise.
    Declaration(String),
    Cast(String),
    External(String),
    Error,
}

impl ResolvedUnit {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Every declaration, depth first, followed by the instances.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedDeclaration> {
        self.declarations
            .iter()
            .flat_map(ResolvedDeclaration::walk)
            .chain(self.instances.iter().flat_map(ResolvedDeclaration::walk))
    }

    /// First declaration whose qualified name or overload key is `key`.
    pub fn find(&self, key: &str) -> Option<&ResolvedDeclaration> {
        self.iter()
            .find(|d| d.qualified_name == key || d.overload_key.as_deref() == Some(key))
    }

    pub fn find_def(&self, def: DefId) -> Option<&ResolvedDeclaration> {
        self.iter().find(|d| d.def == def)
    }

    pub fn diagnostic_codes(&self) -> Vec<u32> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl ResolvedDeclaration {
    /// This declaration and everything nested in it, depth first.
    pub fn walk(&self) -> Box<dyn Iterator<Item = &ResolvedDeclaration> + '_> {
        Box::new(std::iter::once(self).chain(self.members.iter().flat_map(Self::walk)))
    }

    pub fn member(&self, name: &str) -> Option<&ResolvedDeclaration> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Targets of every use named `name`, in source order.
    pub fn uses_of(&self, name: &str) -> Vec<&UseTarget> {
        self.references
            .iter()
            .filter(|r| r.name == name)
            .map(|r| &r.target)
            .collect()
    }
}

/// Snapshot the context into a `ResolvedUnit`.
pub(crate) fn collect(ctx: &ResolverContext<'_>) -> ResolvedUnit {
    let declarations = ctx
        .slots
        .get()
        .map(|slots| {
            slots
                .iter()
                .filter_map(|id| ctx.item(*id))
                .filter_map(|item| item.def.get().copied())
                .filter_map(|def| declaration(ctx, def))
                .collect()
        })
        .unwrap_or_default();

    let mut instances: Vec<ResolvedDeclaration> = ctx
        .defs
        .all_ids()
        .into_iter()
        .filter(|def| ctx.defs.get(*def).is_some_and(|info| info.instance_of.is_some()))
        .filter_map(|def| declaration(ctx, def))
        .collect();
    instances.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));

    ResolvedUnit {
        declarations,
        instances,
        diagnostics: ctx.take_diagnostics(),
    }
}

fn declaration(ctx: &ResolverContext<'_>, def: DefId) -> Option<ResolvedDeclaration> {
    let info = ctx.defs.get(def)?;
    let format = |ty: TypeId| ctx.format_type(ty);

    let mut ordered: Vec<(DeclOrder, DefId)> = info
        .members
        .iter()
        .filter_map(|member| ctx.defs.get(*member).map(|m| (m.order, *member)))
        .collect();
    ordered.sort();
    let members = ordered
        .into_iter()
        .filter_map(|(_, member)| declaration(ctx, member))
        .collect();

    let mut references: Vec<ResolvedUse> = info
        .references
        .iter()
        .map(|reference| {
            let (target, def) = match &reference.target {
                ReferenceTarget::Definition(target) => {
                    (UseTarget::Declaration(def_key(ctx, *target)), Some(*target))
                }
                ReferenceTarget::Cast(kind) => (UseTarget::Cast(kind.name().to_string()), None),
                ReferenceTarget::External(name) => (UseTarget::External(name.clone()), None),
                ReferenceTarget::Error => (UseTarget::Error, None),
            };
            ResolvedUse {
                name: reference.name.clone(),
                span: reference.span,
                target,
                def,
            }
        })
        .collect();
    references.sort_by_key(|reference| reference.span);

    let failed = info.failed || ctx.item_of_def(def).is_some_and(|item| !item.is_complete());
    let (return_type, overload_key) = if info.kind == DefKind::Function {
        (info.return_type.map(format), info.overload_key.clone())
    } else {
        (None, None)
    };

    Some(ResolvedDeclaration {
        kind: info.kind,
        name: info.name.clone(),
        qualified_name: info.qualified_name.clone(),
        span: info.span,
        locality: info.locality,
        type_params: info.type_params.clone(),
        type_args: info.type_args.iter().map(|ty| format(*ty)).collect(),
        instance_of: info.instance_of.and_then(|t| ctx.defs.get(t)).map(|t| t.qualified_name),
        fields: info
            .fields
            .iter()
            .map(|f| ResolvedField {
                name: f.name.clone(),
                ty: format(f.ty),
            })
            .collect(),
        options: info
            .options
            .iter()
            .map(|o| ResolvedOption {
                name: o.name.clone(),
                value: o.value,
            })
            .collect(),
        params: info
            .params
            .iter()
            .map(|p| ResolvedField {
                name: p.name.clone(),
                ty: format(p.ty),
            })
            .collect(),
        return_type,
        var_type: info.var_type.map(format),
        overload_key,
        members,
        references,
        failed,
        def,
        template: info.instance_of,
    })
}

fn def_key(ctx: &ResolverContext<'_>, def: DefId) -> String {
    ctx.defs
        .get(def)
        .map(|info| info.overload_key.unwrap_or(info.qualified_name))
        .unwrap_or_default()
}
