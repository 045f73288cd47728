//! Expression typing.
//!
//! Integer literals keep their literal type here so that overload and
//! conversion checks can see the value; storing one in an untyped variable
//! widens it to the configured default integer type.

use sable_binder::Namespace;
use sable_common::{DiagnosticCode, Span};
use sable_solver::{
    IntrinsicKind, MatchKind, ReferenceTarget, TypeData, TypeId, classify_intrinsic, widens,
};
use sable_syntax::{BinaryOp, Expr, ExprKind, NamePath, join_path};

use crate::resolver::{ItemResolver, PathLookup};
use crate::work_item::{Phase, PhaseResult};

impl<'a, 'ctx> ItemResolver<'a, 'ctx> {
    pub(crate) fn resolve_expr(&mut self, expr: &Expr) -> PhaseResult<TypeId> {
        match &expr.kind {
            ExprKind::Int(value) => Ok(self.ctx.types.int_literal(*value)),
            ExprKind::Bool(_) => Ok(TypeId::BOOL),
            ExprKind::Str(_) => Ok(TypeId::STRING),
            ExprKind::Name(path) => self.resolve_name(path, expr.span),
            ExprKind::Call {
                callee,
                type_args,
                args,
            } => self.resolve_call(callee, type_args, args, expr.span),
            ExprKind::Binary { op, lhs, rhs } => self.resolve_binary(*op, lhs, rhs, expr.span),
        }
    }

    /// A variable, parameter, enum option or module member, followed by any
    /// number of field accesses.
    fn resolve_name(&mut self, path: &NamePath, span: Span) -> PhaseResult<TypeId> {
        let display = join_path(path);
        let (symbol, consumed) = match self.lookup_path(self.scope, path, Namespace::Value)? {
            PathLookup::Found(symbols) => match symbols.first() {
                Some(symbol) => (*symbol, path.len()),
                None => return Ok(self.unresolved(&display, span)),
            },
            PathLookup::Value { symbol, consumed } => (symbol, consumed),
            PathLookup::External => {
                self.error(DiagnosticCode::UnresolvedExternalSymbol, span, &[&display]);
                self.reference(display, span, ReferenceTarget::Error);
                return Ok(TypeId::ERROR);
            }
            PathLookup::Missing { .. } => return Ok(self.unresolved(&display, span)),
        };

        let mut ty = self.value_type(symbol)?;
        let target = match self.target_def(symbol) {
            Some(def) => ReferenceTarget::Definition(def),
            None => ReferenceTarget::Error,
        };
        self.reference(join_path(&path[..consumed]), span, target);

        for field in &path[consumed..] {
            if ty.is_error() {
                return Ok(TypeId::ERROR);
            }
            match self.field_type(ty, field)? {
                Some(field_ty) => ty = field_ty,
                None => return Ok(self.unresolved(&display, span)),
            }
        }
        Ok(ty)
    }

    /// Type of field `name` on a value of struct type `ty`.
    fn field_type(&mut self, ty: TypeId, name: &str) -> PhaseResult<Option<TypeId>> {
        let Some(def) = self.ctx.types.as_def(ty) else {
            return Ok(None);
        };
        self.ctx.require_def(def, Phase::Build)?;
        Ok(self
            .ctx
            .defs
            .get_fields(def)
            .and_then(|fields| fields.into_iter().find(|f| f.name == name))
            .map(|f| f.ty))
    }

    fn resolve_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        span: Span,
    ) -> PhaseResult<TypeId> {
        let left = self.resolve_expr(lhs)?;
        let right = self.resolve_expr(rhs)?;
        if left.is_error() || right.is_error() {
            return Ok(TypeId::ERROR);
        }

        let types = &self.ctx.types;
        if let (Some(a), Some(b)) = (types.as_int_literal(left), types.as_int_literal(right)) {
            let folded = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div => a.checked_div(b),
            };
            return Ok(match folded {
                Some(value) => types.int_literal(value),
                None => self.ctx.default_integer().type_id(),
            });
        }
        if let Some(result) = self.intrinsic_arithmetic(op, left, right) {
            return Ok(result);
        }
        self.resolve_operator_call(op, [(left, lhs.span), (right, rhs.span)], span)
    }

    /// Built-in arithmetic: numerics of one family widen to the wider
    /// operand, a literal adopts the other operand's type if it fits, and
    /// `String + String` concatenates.
    fn intrinsic_arithmetic(&self, op: BinaryOp, left: TypeId, right: TypeId) -> Option<TypeId> {
        let types = &self.ctx.types;
        match (types.lookup(left)?, types.lookup(right)?) {
            (TypeData::Intrinsic(a), TypeData::Intrinsic(b)) if a == b => {
                let concat = a == IntrinsicKind::String && op == BinaryOp::Add;
                (a.is_numeric() || concat).then_some(left)
            }
            (TypeData::Intrinsic(a), TypeData::Intrinsic(b)) => {
                if widens(a, b) {
                    Some(right)
                } else if widens(b, a) {
                    Some(left)
                } else {
                    None
                }
            }
            (TypeData::IntLiteral(_), TypeData::Intrinsic(kind)) if kind.is_numeric() => {
                (classify_intrinsic(types, left, right) != MatchKind::NoMatch).then_some(right)
            }
            (TypeData::Intrinsic(kind), TypeData::IntLiteral(_)) if kind.is_numeric() => {
                (classify_intrinsic(types, right, left) != MatchKind::NoMatch).then_some(left)
            }
            _ => None,
        }
    }
}
