use stra_base::StraNum;

use crate::kernel::{AuxInfo, StraKernel};

/// Portable `ROWS x COLS` register tile.
#[derive(Copy, Clone, Debug, Default)]
pub struct RefKernel<const ROWS: usize, const COLS: usize>;

impl<T: StraNum, const ROWS: usize, const COLS: usize> StraKernel<T> for RefKernel<ROWS, COLS> {
    const NAME: &'static str = "reference";

    const MC: usize = 96;
    const NC: usize = 2048;
    const KC: usize = 256;
    const MR: usize = ROWS;
    const NR: usize = COLS;

    unsafe fn stra_op(&self, k: usize, a: *const T, b: *const T, c_list: &[*mut T], ldc: usize, alpha_list: &[T], aux: &AuxInfo<T>) {
        debug_assert_eq!(c_list.len(), alpha_list.len());
        debug_assert!(aux.ib <= ROWS && aux.jb <= COLS);
        // rows and columns past the tile extent are padding, skip them
        let (ib, jb) = (aux.ib, aux.jb);
        let mut acc = [[T::ZERO; COLS]; ROWS];
        for p in 0..k {
            let a_p = a.add(p * ROWS);
            let b_p = b.add(p * COLS);
            for (i, acc_i) in acc.iter_mut().enumerate().take(ib) {
                let a_ip = *a_p.add(i);
                for (j, acc_ij) in acc_i.iter_mut().enumerate().take(jb) {
                    *acc_ij += a_ip * *b_p.add(j);
                }
            }
        }
        for (&c, &alpha) in c_list.iter().zip(alpha_list) {
            for j in 0..jb {
                for i in 0..ib {
                    *c.add(i + j * ldc) += alpha * acc[i][j];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_kernel_accumulates_into_two_targets() {
        // 2x2 tile, k = 2: A = [[1, 2], [3, 4]], B = [[1, 0], [0, 1]]
        let a = [1f64, 3.0, 2.0, 4.0];
        let b = [1f64, 0.0, 0.0, 1.0];
        let mut c0 = [1f64; 6];
        let mut c1 = [0f64; 6];
        let aux = AuxInfo { is_last_pc: true, ib: 2, jb: 2, b_next: b.as_ptr() };
        let kernel = RefKernel::<2, 2>;
        unsafe {
            kernel.stra_op(2, a.as_ptr(), b.as_ptr(), &[c0.as_mut_ptr(), c1.as_mut_ptr()], 3, &[1.0, -2.0], &aux);
        }
        assert_eq!(c0, [2.0, 4.0, 1.0, 3.0, 5.0, 1.0]);
        assert_eq!(c1, [-2.0, -6.0, 0.0, -4.0, -8.0, 0.0]);
    }

    #[test]
    fn partial_extent_leaves_padding_untouched() {
        let kernel = RefKernel::<3, 2>;
        // k = 1: A column [1, 2, 3], B row [10, 20]
        let a = [1f64, 2.0, 3.0];
        let b = [10f64, 20.0];
        let mut c = [f64::NAN; 6];
        c[0] = 0.0;
        c[1] = 0.0;
        let aux = AuxInfo { is_last_pc: true, ib: 2, jb: 1, b_next: b.as_ptr() };
        unsafe {
            kernel.stra_op(1, a.as_ptr(), b.as_ptr(), &[c.as_mut_ptr()], 3, &[1.0], &aux);
        }
        assert_eq!(&c[..2], &[10.0, 20.0]);
        assert!(c[2..].iter().all(|x| x.is_nan()));
    }
}
