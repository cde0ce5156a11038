use stra_base::{get_range, Dest, StraNum, Worker};

use crate::kernel::{AuxInfo, StraKernel, MAX_TILE_LEN};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum KernelOp {
    Fused,
    RankK,
}

/// Last depth panel: accumulates the finished product into the destination block(s).
///
/// # Safety
/// `pack_a` holds the packed `m x k` row panel, `pack_b` the packed `k x n` column panel,
/// and `dest` is an `m x n` block only this thread's row panel team writes.
pub(crate) unsafe fn fused_macro_kernel<T: StraNum, K: StraKernel<T>>(
    kernel: &K,
    worker: &Worker,
    m: usize,
    n: usize,
    k: usize,
    pack_a: *const T,
    pack_b: *const T,
    dest: &Dest<T>,
) {
    macro_kernel(kernel, KernelOp::Fused, worker, m, n, k, pack_a, pack_b, dest)
}

/// Every depth panel but the last: accumulates a partial rank-k update.
///
/// # Safety
/// same as [`fused_macro_kernel`]
pub(crate) unsafe fn rank_k_macro_kernel<T: StraNum, K: StraKernel<T>>(
    kernel: &K,
    worker: &Worker,
    m: usize,
    n: usize,
    k: usize,
    pack_a: *const T,
    pack_b: *const T,
    dest: &Dest<T>,
) {
    macro_kernel(kernel, KernelOp::RankK, worker, m, n, k, pack_a, pack_b, dest)
}

#[inline]
unsafe fn call_kernel<T: StraNum, K: StraKernel<T>>(
    kernel: &K,
    op: KernelOp,
    k: usize,
    a: *const T,
    b: *const T,
    c_list: &[*mut T],
    ldc: usize,
    alpha_list: &[T],
    aux: &AuxInfo<T>,
) {
    match op {
        KernelOp::Fused => kernel.stra_op(k, a, b, c_list, ldc, alpha_list, aux),
        KernelOp::RankK => kernel.rank_k(k, a, b, c_list, ldc, alpha_list, aux),
    }
}

unsafe fn macro_kernel<T: StraNum, K: StraKernel<T>>(
    kernel: &K,
    op: KernelOp,
    worker: &Worker,
    m: usize,
    n: usize,
    k: usize,
    pack_a: *const T,
    pack_b: *const T,
    dest: &Dest<T>,
) {
    let ic_comm_nt = worker.ic_comm_nt();
    let (c0, alpha0) = dest.first();
    let second = dest.second();
    let ldc = c0.ld();
    // rejects tiles larger than ctmp at compile time
    let _ = K::TILE_FITS;
    let mut ctmp = [T::ZERO; MAX_TILE_LEN];
    let tile_len = K::MR * K::NR;

    for j in get_range(0, n, K::NR, worker.jr_id, ic_comm_nt) {
        let jp = j / K::NR * K::PACK_NR;
        let jb = K::NR.min(n - j);
        let b_panel = pack_b.add(jp * k);
        let mut aux = AuxInfo {
            is_last_pc: op == KernelOp::Fused,
            ib: K::MR,
            jb,
            b_next: pack_b.wrapping_add((jp + ic_comm_nt * K::PACK_NR) * k),
        };

        for i in (0..m).step_by(K::MR) {
            let ip = i / K::MR * K::PACK_MR;
            let ib = K::MR.min(m - i);
            aux.ib = ib;
            let a_panel = pack_a.add(ip * k);

            if ib == K::MR && jb == K::NR {
                match second {
                    None => call_kernel(kernel, op, k, a_panel, b_panel, &[c0.ptr_at(i, j)], ldc, &[alpha0], &aux),
                    Some((c1, alpha1)) => call_kernel(
                        kernel,
                        op,
                        k,
                        a_panel,
                        b_panel,
                        &[c0.ptr_at(i, j), c1.ptr_at(i, j)],
                        ldc,
                        &[alpha0, alpha1],
                        &aux,
                    ),
                }
            } else {
                // corner case: the ib x jb block into a private buffer, then scatter-add it
                ctmp[..tile_len].iter_mut().for_each(|x| *x = T::ZERO);
                call_kernel(kernel, op, k, a_panel, b_panel, &[ctmp.as_mut_ptr()], K::MR, &[T::ONE], &aux);
                for jj in 0..jb {
                    for ii in 0..ib {
                        let v = ctmp[jj * K::MR + ii];
                        *c0.ptr_at(i + ii, j + jj) += alpha0 * v;
                        if let Some((c1, alpha1)) = second {
                            *c1.ptr_at(i + ii, j + jj) += alpha1 * v;
                        }
                    }
                }
            }
        }
    }
}
