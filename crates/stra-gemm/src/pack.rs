use stra_base::{MatRef, Operand, StraNum};

#[inline(always)]
unsafe fn pack_single<T: StraNum>(p: MatRef<T>, row0: usize, col0: usize, mr: usize, k: usize, pack_mr: usize, dst: *mut T) {
    let (rs, cs) = (p.rs(), p.cs());
    let src = p.ptr().add(row0 * rs + col0 * cs);
    for q in 0..k {
        let src_q = src.add(q * cs);
        let dst_q = dst.add(q * pack_mr);
        for r in 0..mr {
            *dst_q.add(r) = *src_q.add(r * rs);
        }
        for r in mr..pack_mr {
            *dst_q.add(r) = T::ZERO;
        }
    }
}

#[inline(always)]
unsafe fn pack_combined<T: StraNum>(
    p: MatRef<T>,
    s: MatRef<T>,
    coef: T,
    row0: usize,
    col0: usize,
    mr: usize,
    k: usize,
    pack_mr: usize,
    dst: *mut T,
) {
    let (p_rs, p_cs) = (p.rs(), p.cs());
    let (s_rs, s_cs) = (s.rs(), s.cs());
    let p_src = p.ptr().add(row0 * p_rs + col0 * p_cs);
    let s_src = s.ptr().add(row0 * s_rs + col0 * s_cs);
    for q in 0..k {
        let p_q = p_src.add(q * p_cs);
        let s_q = s_src.add(q * s_cs);
        let dst_q = dst.add(q * pack_mr);
        for r in 0..mr {
            *dst_q.add(r) = *p_q.add(r * p_rs) + coef * *s_q.add(r * s_rs);
        }
        for r in mr..pack_mr {
            *dst_q.add(r) = T::ZERO;
        }
    }
}

/// Packs the `mr x k` block of `op` at `(row0, col0)` into `dst`:
/// `dst[q * pack_mr + r] = P(row0 + r, col0 + q) + coef * S(row0 + r, col0 + q)`,
/// rows `mr..pack_mr` zero padded. A single operand never reads a second source.
///
/// B panels are packed through the transposed operand, so one routine serves both sides.
///
/// # Safety
/// `row0 + mr <= op.rows()`, `col0 + k <= op.cols()`, `mr <= pack_mr` and
/// `dst` is writable for `k * pack_mr` elements
pub(crate) unsafe fn pack2d<T: StraNum>(
    op: &Operand<T>,
    row0: usize,
    col0: usize,
    mr: usize,
    k: usize,
    pack_mr: usize,
    dst: *mut T,
) {
    debug_assert!(mr <= pack_mr);
    debug_assert!(row0 + mr <= op.rows() && col0 + k <= op.cols());
    match *op {
        Operand::Single(p) => pack_single(p, row0, col0, mr, k, pack_mr, dst),
        Operand::Combined { primary, secondary, coef } => {
            pack_combined(primary, secondary, coef, row0, col0, mr, k, pack_mr, dst)
        }
    }
}
