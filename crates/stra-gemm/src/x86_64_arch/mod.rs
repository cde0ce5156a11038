use core::arch::x86_64::*;

use seq_macro::seq;

use crate::kernel::{AuxInfo, StraKernel};

const MR: usize = 6;
const NR: usize = 8;

/// AVX2/FMA `6x8` double precision tile.
///
/// Only construct through [`HaswellD6x8::new`], which checks the cpu features.
#[derive(Copy, Clone, Debug)]
pub struct HaswellD6x8 {
    _private: (),
}

impl HaswellD6x8 {
    pub fn new() -> Option<Self> {
        if stra_base::has_f64_fma_compute() {
            Some(Self { _private: () })
        } else {
            None
        }
    }
}

#[target_feature(enable = "avx,avx2,fma")]
unsafe fn ukernel_6x8(k: usize, a: *const f64, b: *const f64, b_next: *const f64, acc: &mut [f64; MR * NR]) {
    let mut c = [_mm256_setzero_pd(); 2 * MR];
    let mut a_cur = a;
    let mut b_cur = b;
    for _ in 0..k {
        let b0 = _mm256_loadu_pd(b_cur);
        let b1 = _mm256_loadu_pd(b_cur.add(4));
        seq!(I in 0..6 {
            let a_i = _mm256_broadcast_sd(&*a_cur.add(I));
            c[2 * I] = _mm256_fmadd_pd(a_i, b0, c[2 * I]);
            c[2 * I + 1] = _mm256_fmadd_pd(a_i, b1, c[2 * I + 1]);
        });
        a_cur = a_cur.add(MR);
        b_cur = b_cur.add(NR);
    }
    _mm_prefetch::<_MM_HINT_T0>(b_next as *const i8);
    let acc_ptr = acc.as_mut_ptr();
    seq!(I in 0..6 {
        _mm256_storeu_pd(acc_ptr.add(I * NR), c[2 * I]);
        _mm256_storeu_pd(acc_ptr.add(I * NR + 4), c[2 * I + 1]);
    });
}

impl StraKernel<f64> for HaswellD6x8 {
    const NAME: &'static str = "haswell_d6x8";

    const MC: usize = 72;
    const NC: usize = 4080;
    const KC: usize = 256;
    const MR: usize = MR;
    const NR: usize = NR;

    unsafe fn stra_op(
        &self,
        k: usize,
        a: *const f64,
        b: *const f64,
        c_list: &[*mut f64],
        ldc: usize,
        alpha_list: &[f64],
        aux: &AuxInfo<f64>,
    ) {
        debug_assert_eq!(c_list.len(), alpha_list.len());
        debug_assert!(aux.ib <= MR && aux.jb <= NR);
        if aux.is_last_pc {
            for &c in c_list {
                for j in 0..aux.jb {
                    _mm_prefetch::<_MM_HINT_T0>(c.add(j * ldc) as *const i8);
                }
            }
        }
        // row-major tile
        let mut acc = [0f64; MR * NR];
        ukernel_6x8(k, a, b, aux.b_next, &mut acc);
        for (&c, &alpha) in c_list.iter().zip(alpha_list) {
            for j in 0..aux.jb {
                let c_j = c.add(j * ldc);
                for i in 0..aux.ib {
                    *c_j.add(i) += alpha * acc[i * NR + j];
                }
            }
        }
    }
}
