//! Human-readable rendering of kinds, types and schemes.
//!
//! `Ty`'s `Debug` impl renders the raw term (uvars shown as `<?n>`, useful
//! when debugging the store itself); `Displayed` instead walks through
//! `view`/`whnf` so a set uvar prints as whatever it resolved to, the way a
//! diagnostic aimed at a user would want.

use std::fmt;

use crate::scheme::Scheme;
use crate::ty::{whnf, RowView, Ty, TyCtx, Whnf};

/// Wraps a value together with the context needed to resolve it while
/// printing. Obtained via `.display(ctx)`.
pub struct Displayed<'a, T, C> {
    value: &'a T,
    ctx: &'a C,
}

pub trait Display: Sized {
    fn display<'a, C: TyCtx>(&'a self, ctx: &'a C) -> Displayed<'a, Self, C> {
        Displayed { value: self, ctx }
    }
}

impl Display for Ty {}
impl Display for Scheme {}

impl<'a, C: TyCtx> fmt::Display for Displayed<'a, Ty, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_ty(f, self.ctx, self.value)
    }
}

impl<'a, C: TyCtx> fmt::Display for Displayed<'a, Scheme, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_scheme(f, self.ctx, self.value)
    }
}

fn fmt_row_tail(f: &mut fmt::Formatter, ctx: &impl TyCtx, t: &Ty) -> fmt::Result {
    match crate::ty::row_view(ctx, t) {
        RowView::Pure => Ok(()),
        RowView::UVar(_, u) => write!(f, "|{:?}", u),
        RowView::Var(v) => write!(f, "|{:?}", v),
        RowView::App(t1, t2) => write!(f, "|{}{}", Printer(ctx, &t1), Printer(ctx, &t2)),
        RowView::Cons(v, tail) => {
            write!(f, ",{:?}", v)?;
            fmt_row_tail(f, ctx, &tail)
        }
    }
}

fn fmt_row_head(f: &mut fmt::Formatter, ctx: &impl TyCtx, t: &Ty) -> fmt::Result {
    write!(f, "{{")?;
    match crate::ty::row_view(ctx, t) {
        RowView::Pure => {}
        RowView::UVar(_, u) => write!(f, "{:?}", u)?,
        RowView::Var(v) => write!(f, "{:?}", v)?,
        RowView::App(t1, t2) => write!(f, "{}{}", Printer(ctx, &t1), Printer(ctx, &t2))?,
        RowView::Cons(v, tail) => {
            write!(f, "{:?}", v)?;
            fmt_row_tail(f, ctx, &tail)?;
        }
    }
    write!(f, "}}")
}

struct Printer<'a, C>(&'a C, &'a Ty);

impl<'a, C: TyCtx> fmt::Display for Printer<'a, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_ty(f, self.0, self.1)
    }
}

fn fmt_ty(f: &mut fmt::Formatter, ctx: &impl TyCtx, t: &Ty) -> fmt::Result {
    match whnf(ctx, t) {
        Whnf::Neutral(head, args) => {
            write!(f, "{:?}", head)?;
            for a in args.iter().rev() {
                write!(f, " {}", Printer(ctx, a))?;
            }
            Ok(())
        }
        Whnf::Effect(vars) => {
            write!(f, "{{")?;
            for (i, v) in vars.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{:?}", v)?;
            }
            write!(f, "}}")
        }
        Whnf::EffRow(vars, end) => fmt_row_head(f, ctx, &Ty::EffRow(vars, end)),
        Whnf::PureArrow(sch, body) => write!(f, "({} -> {})", Displayed { value: &sch, ctx }, Printer(ctx, &body)),
        Whnf::Arrow(sch, body, rho) => {
            write!(f, "({} -", Displayed { value: &sch, ctx })?;
            fmt_row_head(f, ctx, &rho)?;
            write!(f, "> {})", Printer(ctx, &body))
        }
        Whnf::Handler(a, tp, itp, ieff, otp, oeff) => write!(
            f,
            "Handler[{}, {}, {}, {}, {}, {}]",
            Printer(ctx, &a),
            Printer(ctx, &tp),
            Printer(ctx, &itp),
            Printer(ctx, &ieff),
            Printer(ctx, &otp),
            Printer(ctx, &oeff)
        ),
        Whnf::Label(e, tp, rho) => {
            write!(f, "Label[{}, {}, ", Printer(ctx, &e), Printer(ctx, &tp))?;
            fmt_row_head(f, ctx, &rho)?;
            write!(f, "]")
        }
    }
}

fn fmt_scheme(f: &mut fmt::Formatter, ctx: &impl TyCtx, sch: &Scheme) -> fmt::Result {
    if sch.is_monomorphic() {
        return fmt_ty(f, ctx, &sch.body);
    }
    write!(f, "forall")?;
    for (v, _) in &sch.targs {
        write!(f, " {:?}", v)?;
    }
    write!(f, ". ")?;
    for np in &sch.named {
        write!(f, "{{{:?}: {}}} -> ", np.name, Displayed { value: &np.scheme, ctx })?;
    }
    fmt_ty(f, ctx, &sch.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::Builtins;
    use crate::kind::{Kind, KindStore};
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

    #[test]
    fn a_resolved_uvar_prints_as_its_content_not_as_a_metavariable() {
        let mut rigids = RigidRegistry::new();
        let builtins = Builtins::new(&mut rigids);
        let mut uvars = UVarStore::new();
        let u = uvars.fresh(Kind::Type, crate::scope::Scope::initial(), 0);
        uvars.raw_set(&crate::perm::Perm::identity(), u, builtins.t_unit(), &Kind::Type);
        let ctx = TestCtx { kinds: KindStore::new(), uvars, rigids };
        let t = Ty::UVar(crate::perm::Perm::identity(), u);
        let rendered = format!("{}", t.display(&ctx));
        assert!(rendered.contains("Unit"));
    }
}
