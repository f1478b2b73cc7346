//! Scope shrinking and escape detection.

use crate::ids::{TVar, UVar};
use crate::kind::Kind;
use crate::scheme::Polarity;
use crate::scope::Scope;
use crate::ty::{t_closed_effrow, view, RowEnd, Ty, TyCtx, TyCtxMut};

/// Walks `t`; for every rigid mentioned outside `scope`, returns that rigid
/// as the escaping variable. For every uvar reachable in `t`, narrows
/// its scope to its intersection with `scope` via `filter_scope_pred`; if
/// that would have to drop a rigid that actually occurs in the uvar's own
/// (already-set) content, that rigid is reported as the escape instead.
///
/// Takes a single `ctx: &mut impl TyCtxMut` rather than a separate
/// `uvars: &mut UVarStore` alongside a read-only `ctx` — the store being
/// narrowed and the store `view` reads through must be the same object, and
/// a generic `ctx` plus an independently-threaded `&mut UVarStore` can only
/// alias that way via interior mutability or by being two different stores
/// (silently wrong). Bundling both facets behind one `TyCtxMut` borrow lets
/// every call below reborrow (`&*ctx` for reads, `ctx` itself for writes)
/// without ever holding two conflicting borrows of the same cell array.
pub fn try_shrink_scope<C: TyCtxMut>(ctx: &mut C, scope: &Scope, t: &Ty) -> Result<(), TVar> {
    match view(&*ctx, t) {
        Ty::Var(v) => {
            if scope.mem(v) {
                Ok(())
            } else {
                log::debug!("scope escape: {:?} is free but not in scope", v);
                Err(v)
            }
        }
        Ty::UVar(_, u) => shrink_uvar(ctx, scope, u),
        Ty::Effect(vars) => check_vars(scope, &vars),
        Ty::EffRow(vars, end) => {
            check_vars(scope, &vars)?;
            match end {
                RowEnd::Closed => Ok(()),
                RowEnd::UVar(_, u) => shrink_uvar(ctx, scope, u),
                RowEnd::Var(v) => {
                    if scope.mem(v) {
                        Ok(())
                    } else {
                        Err(v)
                    }
                }
                RowEnd::App(t) => try_shrink_scope(ctx, scope, &t),
            }
        }
        Ty::PureArrow(sch, t) => {
            shrink_scheme(ctx, scope, &sch)?;
            try_shrink_scope(ctx, scope, &t)
        }
        Ty::Arrow(sch, t, rho) => {
            shrink_scheme(ctx, scope, &sch)?;
            try_shrink_scope(ctx, scope, &t)?;
            try_shrink_scope(ctx, scope, &rho)
        }
        Ty::Handler(a, tp, itp, ieff, otp, oeff) => {
            for sub in [&a, &tp, &itp, &ieff, &otp, &oeff] {
                try_shrink_scope(ctx, scope, sub)?;
            }
            Ok(())
        }
        Ty::Label(e, tp, rho) => {
            try_shrink_scope(ctx, scope, &e)?;
            try_shrink_scope(ctx, scope, &tp)?;
            try_shrink_scope(ctx, scope, &rho)
        }
        Ty::App(f, a) => {
            try_shrink_scope(ctx, scope, &f)?;
            try_shrink_scope(ctx, scope, &a)
        }
    }
}

fn check_vars(scope: &Scope, vars: &std::collections::BTreeSet<TVar>) -> Result<(), TVar> {
    for &v in vars {
        if !scope.mem(v) {
            return Err(v);
        }
    }
    Ok(())
}

fn shrink_scheme<C: TyCtxMut>(ctx: &mut C, scope: &Scope, sch: &crate::scheme::Scheme) -> Result<(), TVar> {
    // Bound target variables of the scheme are locally in scope; widen the
    // scope with them before checking the body and named parameters.
    let mut inner = scope.clone();
    for &(v, _) in &sch.targs {
        inner = inner.add(v);
    }
    for np in &sch.named {
        shrink_scheme(ctx, &inner, &np.scheme)?;
    }
    try_shrink_scope(ctx, &inner, &sch.body)
}

fn shrink_uvar<C: TyCtxMut>(ctx: &mut C, scope: &Scope, u: UVar) -> Result<(), TVar> {
    let content = ctx.uvars().content(u).map(|(t, _)| t.clone());
    if let Some(content) = content {
        // Already set: an escape here is only real if the offending rigid
        // actually occurs in the content, so delegate to the content walk
        // rather than narrowing a cell that is no longer mutable anyway.
        return try_shrink_scope(ctx, scope, &content);
    }
    // An unset uvar may legally have scope entries with no mention anywhere
    // yet — narrowing is always safe for an unset cell, since there is no
    // content that could escape.
    ctx.uvars_mut().filter_scope_pred(u, |v| scope.mem(v));
    Ok(())
}

/// Walks a proper type, flipping `polarity` under an arrow's domain; at
/// every position whose polarity equals `target`, a **closed** effect row
/// encountered there has its end replaced with a fresh uvar of row kind
/// allocated in `scope`. A closed row at the opposite polarity is left
/// closed. `open_down` fixes `target` at `Polarity::Negative` (used for a
/// function's argument side during subsumption, so a latent row nested
/// inside that argument's own argument side — itself negative-under-negative,
/// i.e. positive — is left alone); `open_up` fixes `target` at
/// `Polarity::Positive` (used for its result side).
pub fn open_rows<C: TyCtxMut>(
    ctx: &mut C,
    scope: &Scope,
    level: u32,
    t: &Ty,
    polarity: Polarity,
    target: Polarity,
) -> Ty {
    match view(&*ctx, t) {
        Ty::EffRow(vars, RowEnd::Closed) if polarity == target => {
            let u = ctx.uvars_mut().fresh(Kind::EffRow, scope.clone(), level);
            Ty::EffRow(vars, RowEnd::UVar(crate::perm::Perm::identity(), u))
        }
        other @ Ty::EffRow(_, _) => other,
        Ty::PureArrow(sch, t) => {
            let sch2 = open_rows_scheme(ctx, scope, level, &sch, polarity.flip(), target);
            let t2 = open_rows(ctx, scope, level, &t, polarity, target);
            crate::ty::t_pure_arrow(sch2, t2)
        }
        Ty::Arrow(sch, t, rho) => {
            let sch2 = open_rows_scheme(ctx, scope, level, &sch, polarity.flip(), target);
            let t2 = open_rows(ctx, scope, level, &t, polarity, target);
            let rho2 = open_rows(ctx, scope, level, &rho, polarity, target);
            crate::ty::t_arrow(&*ctx, sch2, t2, rho2)
        }
        Ty::Handler(a, tp, itp, ieff, otp, oeff) => crate::ty::t_handler(
            open_rows(ctx, scope, level, &a, polarity, target),
            open_rows(ctx, scope, level, &tp, polarity, target),
            open_rows(ctx, scope, level, &itp, polarity.flip(), target),
            open_rows(ctx, scope, level, &ieff, polarity.flip(), target),
            open_rows(ctx, scope, level, &otp, polarity, target),
            open_rows(ctx, scope, level, &oeff, polarity, target),
        ),
        Ty::Label(e, tp, rho) => crate::ty::t_label(
            open_rows(ctx, scope, level, &e, polarity, target),
            open_rows(ctx, scope, level, &tp, polarity, target),
            open_rows(ctx, scope, level, &rho, polarity, target),
        ),
        other => other,
    }
}

fn open_rows_scheme<C: TyCtxMut>(
    ctx: &mut C,
    scope: &Scope,
    level: u32,
    sch: &crate::scheme::Scheme,
    polarity: Polarity,
    target: Polarity,
) -> crate::scheme::Scheme {
    let mut named = Vec::with_capacity(sch.named.len());
    for np in &sch.named {
        named.push(crate::scheme::NamedParam {
            name: np.name.clone(),
            scheme: open_rows_scheme(ctx, scope, level, &np.scheme, polarity.flip(), target),
        });
    }
    let body = open_rows(ctx, scope, level, &sch.body, polarity, target);
    crate::scheme::Scheme { targs: sch.targs.clone(), named, body }
}

pub fn open_down<C: TyCtxMut>(ctx: &mut C, scope: &Scope, level: u32, t: &Ty) -> Ty {
    open_rows(ctx, scope, level, t, Polarity::Negative, Polarity::Negative)
}

pub fn open_up<C: TyCtxMut>(ctx: &mut C, scope: &Scope, level: u32, t: &Ty) -> Ty {
    open_rows(ctx, scope, level, t, Polarity::Positive, Polarity::Positive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::KindStore;
    use crate::name::TypeParamName;
    use crate::rigid::RigidRegistry;
    use crate::uvar::UVarStore;

    struct TestCtx {
        kinds: KindStore,
        uvars: UVarStore,
        rigids: RigidRegistry,
    }

    impl TyCtx for TestCtx {
        fn kinds(&self) -> &KindStore { &self.kinds }
        fn uvars(&self) -> &UVarStore { &self.uvars }
        fn rigids(&self) -> &RigidRegistry { &self.rigids }
    }

    impl TyCtxMut for TestCtx {
        fn uvars_mut(&mut self) -> &mut UVarStore { &mut self.uvars }
        fn kinds_mut(&mut self) -> &mut KindStore { &mut self.kinds }
    }

    fn fresh_ctx() -> TestCtx {
        TestCtx { kinds: KindStore::new(), uvars: UVarStore::new(), rigids: RigidRegistry::new() }
    }

    #[test]
    fn escape_is_detected_and_names_the_offending_rigid() {
        let mut ctx = fresh_ctx();
        let a = ctx.rigids.fresh(Kind::Type, 0, TypeParamName::Named("a".into()));
        let scope_with_a = Scope::initial().add(a);
        let scope_without_a = Scope::initial();
        let result = try_shrink_scope(&mut ctx, &scope_without_a, &Ty::Var(a));
        assert_eq!(result, Err(a));
        let ok = try_shrink_scope(&mut ctx, &scope_with_a, &Ty::Var(a));
        assert!(ok.is_ok());
    }

    #[test]
    fn shrinking_an_unset_uvars_scope_never_fails() {
        let mut ctx = fresh_ctx();
        let a = ctx.rigids.fresh(Kind::Type, 0, TypeParamName::Anonymous);
        let b = ctx.rigids.fresh(Kind::Type, 5, TypeParamName::Anonymous);
        let wide_scope = Scope::initial().add(a).add(b);
        let u = ctx.uvars.fresh(Kind::Type, wide_scope, 0);
        let narrow_scope = Scope::initial().add(a);
        let result = try_shrink_scope(&mut ctx, &narrow_scope, &Ty::UVar(crate::perm::Perm::identity(), u));
        assert!(result.is_ok());
        assert!(!ctx.uvars.scope(u).mem(b));
    }

    #[test]
    fn an_escape_inside_an_already_set_uvar_names_the_offending_rigid() {
        let mut ctx = fresh_ctx();
        let a = ctx.rigids.fresh(Kind::Type, 0, TypeParamName::Named("a".into()));
        let wide_scope = Scope::initial().add(a);
        let u = ctx.uvars.fresh(Kind::Type, wide_scope, 0);
        ctx.uvars.raw_set(&crate::perm::Perm::identity(), u, Ty::Var(a), &Kind::Type);
        let narrow_scope = Scope::initial();
        let result = try_shrink_scope(&mut ctx, &narrow_scope, &Ty::UVar(crate::perm::Perm::identity(), u));
        assert_eq!(result, Err(a));
    }

    #[test]
    fn open_down_replaces_a_closed_row_in_negative_position() {
        let mut ctx = fresh_ctx();
        let closed = t_closed_effrow(&ctx, std::collections::BTreeSet::new());
        let opened = open_down(&mut ctx, &Scope::initial(), 0, &closed);
        match view(&ctx, &opened) {
            Ty::EffRow(_, RowEnd::UVar(_, _)) => {}
            other => panic!("expected an opened row, got {:?}", other),
        }
    }

    #[test]
    fn open_down_leaves_a_nested_positive_row_closed_but_opens_the_negative_one() {
        let mut ctx = fresh_ctx();
        let unit = ctx.rigids.fresh(Kind::Type, 0, TypeParamName::Anonymous);
        let trivial_scheme = || crate::scheme::Scheme { targs: vec![], named: vec![], body: Ty::Var(unit) };

        // inner_fn: "Unit ->{} Unit", its own row at positive polarity once
        // nested under the outer arrow's (contravariant) domain.
        let inner_row = t_closed_effrow(&ctx, std::collections::BTreeSet::new());
        let inner_fn = crate::ty::t_arrow(&ctx, trivial_scheme(), Ty::Var(unit), inner_row);

        // outer_fn: "inner_fn ->{} Unit", its own row at negative polarity.
        let outer_row = t_closed_effrow(&ctx, std::collections::BTreeSet::new());
        let outer_scheme = crate::scheme::Scheme { targs: vec![], named: vec![], body: inner_fn };
        let outer_fn = crate::ty::t_arrow(&ctx, outer_scheme, Ty::Var(unit), outer_row);

        let opened = open_down(&mut ctx, &Scope::initial(), 0, &outer_fn);
        match view(&ctx, &opened) {
            Ty::Arrow(sch, _, rho) => {
                match *rho {
                    Ty::EffRow(_, RowEnd::UVar(_, _)) => {}
                    other => panic!("expected the outer (negative) row to be opened, got {:?}", other),
                }
                match &sch.body {
                    Ty::Arrow(_, _, inner_rho) => match inner_rho.as_ref() {
                        Ty::EffRow(_, RowEnd::Closed) => {}
                        other => panic!("expected the inner (positive) row to stay closed, got {:?}", other),
                    },
                    other => panic!("expected a nested arrow, got {:?}", other),
                }
            }
            other => panic!("expected an arrow, got {:?}", other),
        }
    }
}
