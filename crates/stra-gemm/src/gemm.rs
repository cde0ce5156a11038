use stra_base::{Dest, MatMut, MatRef, Operand, Result, StraError, StraNum, StraPar, ThreadComm};

use crate::kernel::StraKernel;
use crate::straprim::{straprim, PackBufs};

/// Plain `C = alpha * A * B + beta * C`, used for dynamic peeling and as the non-Strassen path.
pub trait PlainGemm<T: StraNum>: Sync {
    fn gemm(&self, par: &StraPar, alpha: T, a: MatRef<T>, b: MatRef<T>, beta: T, c: MatMut<T>) -> Result<()>;
}

/// [`PlainGemm`] backed by the blocked primitive.
#[derive(Copy, Clone, Debug)]
pub struct BlockedGemm<'k, K>(pub &'k K);

impl<T: StraNum, K: StraKernel<T>> PlainGemm<T> for BlockedGemm<'_, K> {
    fn gemm(&self, par: &StraPar, alpha: T, a: MatRef<T>, b: MatRef<T>, beta: T, c: MatMut<T>) -> Result<()> {
        gemm(self.0, par, alpha, a, b, beta, c)
    }
}

pub(crate) fn check_shapes<T: StraNum>(a: &MatRef<T>, b: &MatRef<T>, c: &MatMut<T>) -> Result<(usize, usize, usize)> {
    let (m, k, n) = (a.rows(), a.cols(), b.cols());
    if b.rows() != k || c.rows() != m || c.cols() != n {
        return Err(StraError::DimensionMismatch(format!(
            "A is {}x{}, B is {}x{}, C is {}x{}",
            a.rows(),
            a.cols(),
            b.rows(),
            b.cols(),
            c.rows(),
            c.cols()
        )));
    }
    Ok((m, n, k))
}

/// Blocked `C = alpha * A * B + beta * C` as one blocked-primitive call.
#[tracing::instrument(level = "debug", skip_all, fields(m = a.rows(), n = b.cols(), k = a.cols(), kernel = K::NAME))]
pub fn gemm<T: StraNum, K: StraKernel<T>>(
    kernel: &K,
    par: &StraPar,
    alpha: T,
    a: MatRef<T>,
    b: MatRef<T>,
    beta: T,
    c: MatMut<T>,
) -> Result<()> {
    let (m, n, k) = check_shapes(&a, &b, &c)?;
    if m == 0 || n == 0 {
        return Ok(());
    }
    unsafe { c.scale(beta) };
    if k == 0 || alpha == T::ZERO {
        return Ok(());
    }

    let comm = ThreadComm::new(*par);
    let mut bufs = PackBufs::<T>::new::<K>(par, n);
    let (pack_a, pack_b) = bufs.ptrs();
    let (nc, pack_nc) = (bufs.nc, bufs.pack_nc);
    let a = Operand::Single(a);
    let b_t = Operand::Single(b.t());
    let dest = Dest::single(c, alpha);
    comm.run(|worker| unsafe {
        straprim(kernel, worker, m, n, k, &a, &b_t, &dest, nc, pack_nc, pack_a, pack_b);
    });
    Ok(())
}
