use stra_base::{get_range, round_up, Dest, Operand, PackBuf, StraNum, StraPar, SyncPtr, Worker};

use crate::kernel::StraKernel;
use crate::macro_kernel::{fused_macro_kernel, rank_k_macro_kernel};
use crate::pack::pack2d;

/// Column panel width for an `n`-wide problem.
pub(crate) fn get_nc<T: StraNum, K: StraKernel<T>>(n: usize, jc_nt: usize) -> usize {
    if jc_nt > 1 {
        ((n.max(1) - 1) / (K::NR * jc_nt) + 1) * K::NR
    } else {
        K::NC.min(round_up(n.max(1), K::NR))
    }
}

/// Scratch panels for one blocked-primitive invocation, shared by every call issued
/// from the same fork-join region.
pub(crate) struct PackBufs<T> {
    pub(crate) nc: usize,
    pub(crate) pack_nc: usize,
    pack_a: PackBuf<T>,
    pack_b: PackBuf<T>,
}

impl<T: StraNum> PackBufs<T> {
    pub(crate) fn new<K: StraKernel<T>>(par: &StraPar, n: usize) -> Self {
        let nc = get_nc::<T, K>(n, par.jc_nt);
        let pack_nc = nc / K::NR * K::PACK_NR;
        let a_size = K::KC * (K::PACK_MC + 1) * par.jc_nt * par.ic_nt;
        let b_size = K::KC * (pack_nc + 1) * par.jc_nt;
        tracing::debug!(nc, pack_nc, a_size, b_size, kernel = K::NAME, "allocating pack buffers");
        Self { nc, pack_nc, pack_a: PackBuf::zeroed(a_size), pack_b: PackBuf::zeroed(b_size) }
    }

    pub(crate) fn ptrs(&mut self) -> (SyncPtr<T>, SyncPtr<T>) {
        (self.pack_a.sync_ptr(), self.pack_b.sync_ptr())
    }
}

/// The blocked primitive: `dest += A * B` over the loop nest
/// jc (column panels) / pc (depth panels) / ic (row panels) / jr / ir.
///
/// `b_t` is the transposed B operand, so B panels pack with the same routine as A.
/// Every thread of the team calls this with the same arguments.
///
/// # Safety
/// `a` is `m x k`, `b_t` is `n x k`, `dest` is `m x n`, the buffers come from a
/// [`PackBufs`] sized for `n` and the worker's team.
pub(crate) unsafe fn straprim<T: StraNum, K: StraKernel<T>>(
    kernel: &K,
    worker: &Worker,
    m: usize,
    n: usize,
    k: usize,
    a: &Operand<T>,
    b_t: &Operand<T>,
    dest: &Dest<T>,
    nc: usize,
    pack_nc: usize,
    pack_a: SyncPtr<T>,
    pack_b: SyncPtr<T>,
) {
    debug_assert!(a.rows() == m && a.cols() == k);
    debug_assert!(b_t.rows() == n && b_t.cols() == k);
    debug_assert!(dest.rows() == m && dest.cols() == n);

    let pack_a = pack_a.add((worker.jc_id * worker.ic_nt + worker.ic_id) * K::PACK_MC * K::KC);
    let pack_b = pack_b.add(worker.jc_id * pack_nc * K::KC);

    for jc in get_range(0, n, nc, worker.jc_id, worker.jc_nt) {
        let jb = nc.min(n - jc);

        for pc in (0..k).step_by(K::KC) {
            let pb = K::KC.min(k - pc);
            let is_last_pc = pc + K::KC >= k;

            for j in get_range(0, jb, K::NR, worker.ic_jr, worker.pc_comm_nt()) {
                let jp = j / K::NR * K::PACK_NR;
                pack2d(b_t, jc + j, pc, K::NR.min(jb - j), pb, K::PACK_NR, pack_b.add(jp * pb));
            }
            worker.pc_barrier();

            for ic in get_range(0, m, K::MC, worker.ic_id, worker.ic_nt) {
                let ib = K::MC.min(m - ic);

                for i in get_range(0, ib, K::MR, worker.jr_id, worker.jr_nt) {
                    let ip = i / K::MR * K::PACK_MR;
                    pack2d(a, ic + i, pc, K::MR.min(ib - i), pb, K::PACK_MR, pack_a.add(ip * pb));
                }
                worker.ic_barrier();

                let block = dest.sub_unchecked(ic, jc, ib, jb);
                if is_last_pc {
                    fused_macro_kernel(kernel, worker, ib, jb, pb, pack_a, pack_b, &block);
                } else {
                    rank_k_macro_kernel(kernel, worker, ib, jb, pb, pack_a, pack_b, &block);
                }
                worker.ic_barrier();
            }
            worker.pc_barrier();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::RefKernel;

    #[test]
    fn nc_follows_team_width() {
        type K = RefKernel<6, 8>;
        assert_eq!(get_nc::<f64, K>(100, 1), 104);
        assert_eq!(get_nc::<f64, K>(10_000, 1), <K as StraKernel<f64>>::NC);
        assert_eq!(get_nc::<f64, K>(100, 3), 40);
        assert_eq!(get_nc::<f64, K>(1, 4), 8);
        assert_eq!(get_nc::<f64, K>(0, 1), 8);
    }
}
