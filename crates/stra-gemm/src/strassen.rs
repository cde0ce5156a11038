use stra_base::{Dest, MatMut, MatRef, Operand, Result, StraError, StraNum, StraPar, ThreadComm};

use crate::gemm::{check_shapes, BlockedGemm, PlainGemm};
use crate::kernel::StraKernel;
use crate::straprim::{straprim, PackBufs};

/// One of the seven products: `dest += (A-combination) * (B-combination)`.
struct SubProduct<'a, T> {
    name: &'static str,
    a: Operand<'a, T>,
    b_t: Operand<'a, T>,
    dest: Dest<'a, T>,
}

impl<'a, T: StraNum> SubProduct<'a, T> {
    fn new(name: &'static str, a: Operand<'a, T>, b: Operand<'a, T>, dest: Dest<'a, T>) -> Self {
        Self { name, a, b_t: b.t(), dest }
    }
}

/// The seven products of the 2x2 split of even-sized `A`, `B`, `C`,
/// every target coefficient scaled by `alpha`.
fn schedule<'a, T: StraNum>(a: MatRef<'a, T>, b: MatRef<'a, T>, c: MatMut<'a, T>, alpha: T) -> Result<[SubProduct<'a, T>; 7]> {
    let (a00, a01, a10, a11) = (a.quadrant(0, 0), a.quadrant(0, 1), a.quadrant(1, 0), a.quadrant(1, 1));
    let (b00, b01, b10, b11) = (b.quadrant(0, 0), b.quadrant(0, 1), b.quadrant(1, 0), b.quadrant(1, 1));
    let (c00, c01, c10, c11) = (c.quadrant(0, 0), c.quadrant(0, 1), c.quadrant(1, 0), c.quadrant(1, 1));
    let one = T::ONE;
    let neg = -T::ONE;

    Ok([
        SubProduct::new(
            "M1",
            Operand::combined(a00, a11, one)?,
            Operand::combined(b00, b11, one)?,
            Dest::dual(c00, alpha, c11, alpha)?,
        ),
        SubProduct::new("M2", Operand::combined(a10, a11, one)?, b00.into(), Dest::dual(c10, alpha, c11, -alpha)?),
        SubProduct::new("M3", a00.into(), Operand::combined(b01, b11, neg)?, Dest::dual(c01, alpha, c11, alpha)?),
        SubProduct::new("M4", a11.into(), Operand::combined(b10, b00, neg)?, Dest::dual(c00, alpha, c10, alpha)?),
        SubProduct::new("M5", Operand::combined(a00, a01, one)?, b11.into(), Dest::dual(c00, -alpha, c01, alpha)?),
        SubProduct::new(
            "M6",
            Operand::combined(a10, a00, neg)?,
            Operand::combined(b00, b01, one)?,
            Dest::single(c11, alpha),
        ),
        SubProduct::new(
            "M7",
            Operand::combined(a01, a11, neg)?,
            Operand::combined(b10, b11, one)?,
            Dest::single(c00, alpha),
        ),
    ])
}

/// Adds the parts of `alpha * A * B` outside the even `md x kd x nd` region:
/// the depth remainder of the leading block, the trailing columns, then the trailing rows.
pub(crate) fn dynamic_peeling<T: StraNum, G: PlainGemm<T>>(
    peel: &G,
    par: &StraPar,
    alpha: T,
    a: MatRef<T>,
    b: MatRef<T>,
    c: MatMut<T>,
    md: usize,
    kd: usize,
    nd: usize,
) -> Result<()> {
    let (m, k, n) = (a.rows(), a.cols(), b.cols());
    if kd < k && md > 0 && nd > 0 {
        tracing::debug!(m = md, n = nd, k = k - kd, "peeling depth remainder");
        peel.gemm(par, alpha, a.sub(0, kd, md, k - kd)?, b.sub(kd, 0, k - kd, nd)?, T::ONE, c.sub(0, 0, md, nd)?)?;
    }
    if nd < n {
        tracing::debug!(m, n = n - nd, k, "peeling trailing columns");
        peel.gemm(par, alpha, a, b.sub(0, nd, k, n - nd)?, T::ONE, c.sub(0, nd, m, n - nd)?)?;
    }
    if md < m && nd > 0 {
        tracing::debug!(m = m - md, n = nd, k, "peeling trailing rows");
        peel.gemm(par, alpha, a.sub(md, 0, m - md, k)?, b.sub(0, 0, k, nd)?, T::ONE, c.sub(md, 0, m - md, nd)?)?;
    }
    Ok(())
}

/// One-level Strassen `C = alpha * A * B + beta * C`, peeling with the blocked GEMM.
pub fn strassen<T: StraNum, K: StraKernel<T>>(
    kernel: &K,
    par: &StraPar,
    alpha: T,
    a: MatRef<T>,
    b: MatRef<T>,
    beta: T,
    c: MatMut<T>,
) -> Result<()> {
    strassen_with(kernel, &BlockedGemm(kernel), par, alpha, a, b, beta, c)
}

/// One-level Strassen with an explicit plain GEMM for the odd remainders.
///
/// `C` is scaled by `beta` first. The seven products then run inside one fork-join
/// region in program order, since every quadrant of `C` is the target of several of
/// them. Dynamic peeling runs after the region joins.
#[tracing::instrument(level = "debug", skip_all, fields(m = a.rows(), n = b.cols(), k = a.cols(), kernel = K::NAME))]
pub fn strassen_with<T: StraNum, K: StraKernel<T>, G: PlainGemm<T>>(
    kernel: &K,
    peel: &G,
    par: &StraPar,
    alpha: T,
    a: MatRef<T>,
    b: MatRef<T>,
    beta: T,
    c: MatMut<T>,
) -> Result<()> {
    let (m, n, k) = check_shapes(&a, &b, &c)?;
    if !kernel.stra_implemented() {
        tracing::error!(kernel = K::NAME, "kernel has no strassen operator");
        return Err(StraError::StraKernelUnimplemented(K::NAME));
    }
    if m == 0 || n == 0 {
        return Ok(());
    }
    unsafe { c.scale(beta) };
    if k == 0 || alpha == T::ZERO {
        return Ok(());
    }

    let (md, kd, nd) = (m - m % 2, k - k % 2, n - n % 2);
    if md > 0 && kd > 0 && nd > 0 {
        let steps = schedule(a.sub(0, 0, md, kd)?, b.sub(0, 0, kd, nd)?, c.sub(0, 0, md, nd)?, alpha)?;
        let (hm, hn, hk) = (md / 2, nd / 2, kd / 2);

        let comm = ThreadComm::new(*par);
        let mut bufs = PackBufs::<T>::new::<K>(par, hn);
        let (pack_a, pack_b) = bufs.ptrs();
        let (nc, pack_nc) = (bufs.nc, bufs.pack_nc);
        comm.run(|worker| {
            for step in steps.iter() {
                if worker.t_id == 0 {
                    tracing::trace!(step = step.name, m = hm, n = hn, k = hk, "issuing sub-product");
                }
                unsafe {
                    straprim(kernel, worker, hm, hn, hk, &step.a, &step.b_t, &step.dest, nc, pack_nc, pack_a, pack_b);
                }
            }
        });
    }

    dynamic_peeling(peel, par, alpha, a, b, c, md, kd, nd)
}
