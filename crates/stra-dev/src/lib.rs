use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ABLayout {
    NN,
    NT,
    TN,
    TT,
}

impl ABLayout {
    pub const ALL: [ABLayout; 4] = [ABLayout::NN, ABLayout::NT, ABLayout::TN, ABLayout::TT];
}

/// Element strides `(a_rs, a_cs, b_rs, b_cs, c_rs, c_cs)` of column-major storage
/// for `op(A): m x k`, `op(B): k x n`, `C: m x n`.
pub fn layout_to_strides(layout: &ABLayout, m: usize, n: usize, k: usize) -> (usize, usize, usize, usize, usize, usize) {
    let (lda, ldb, ldc) = layout_to_lds(layout, m, n, k);
    match layout {
        ABLayout::NN => (1, lda, 1, ldb, 1, ldc),
        ABLayout::NT => (1, lda, ldb, 1, 1, ldc),
        ABLayout::TN => (lda, 1, 1, ldb, 1, ldc),
        ABLayout::TT => (lda, 1, ldb, 1, 1, ldc),
    }
}

/// Tight leading dimensions `(lda, ldb, ldc)`, at least 1.
pub fn layout_to_lds(layout: &ABLayout, m: usize, n: usize, k: usize) -> (usize, usize, usize) {
    let (lda, ldb) = match layout {
        ABLayout::NN => (m, k),
        ABLayout::NT => (m, n),
        ABLayout::TN => (k, k),
        ABLayout::TT => (k, n),
    };
    (lda.max(1), ldb.max(1), m.max(1))
}

/// Transpose flags as BLAS characters.
pub fn layout_to_trans(layout: &ABLayout) -> (char, char) {
    match layout {
        ABLayout::NN => ('N', 'N'),
        ABLayout::NT => ('N', 'T'),
        ABLayout::TN => ('T', 'N'),
        ABLayout::TT => ('T', 'T'),
    }
}

pub trait Bound {
    type X: rand::distributions::uniform::SampleUniform;
    fn min_value() -> Self::X;
    fn max_value() -> Self::X;
    fn my_sample(dist: &Uniform<Self::X>, rng: &mut StdRng) -> Self;
}

impl Bound for f32 {
    type X = f32;
    fn min_value() -> Self {
        -2.0
    }
    fn max_value() -> Self {
        2.0
    }
    fn my_sample(dist: &Uniform<Self>, rng: &mut StdRng) -> Self {
        dist.sample(rng)
    }
}

impl Bound for f64 {
    type X = f64;
    fn min_value() -> Self {
        -10.0
    }
    fn max_value() -> Self {
        10.0
    }
    fn my_sample(dist: &Uniform<Self>, rng: &mut StdRng) -> Self {
        dist.sample(rng)
    }
}

pub fn random_matrix_uniform<T>(arr: &mut [T])
where
    T: Bound,
{
    random_matrix_uniform_seeded(arr, 43)
}

pub fn random_matrix_uniform_seeded<T>(arr: &mut [T], seed: u64)
where
    T: Bound,
{
    let t0 = T::min_value();
    let t1 = T::max_value();
    let mut x = StdRng::seed_from_u64(seed);
    let un_dist = Uniform::new(t0, t1);
    arr.iter_mut().for_each(|p| *p = T::my_sample(&un_dist, &mut x));
}

pub trait Diff {
    fn diff(&self, other: &Self) -> f64;
}

impl Diff for f32 {
    fn diff(&self, other: &Self) -> f64 {
        let diff_abs = (self - other).abs();
        let diff_rel = diff_abs / self.abs();
        diff_abs.min(diff_rel) as f64
    }
}

impl Diff for f64 {
    fn diff(&self, other: &Self) -> f64 {
        let diff_abs = (self - other).abs();
        let diff_rel = diff_abs / self.abs();
        diff_abs.min(diff_rel)
    }
}

/// Largest element-wise difference, each taken as the smaller of absolute and relative error.
pub fn max_abs_diff<T: Copy + std::fmt::Debug>(ap: &[T], bp: &[T]) -> f64
where
    T: Diff,
{
    assert_eq!(ap.len(), bp.len());
    let mut diff = 0_f64;
    for (a, b) in ap.iter().zip(bp.iter()) {
        let cur_diff = a.diff(b);
        // nan never compares greater
        if cur_diff.is_nan() {
            return f64::INFINITY;
        }
        if cur_diff > diff {
            diff = cur_diff;
        }
    }
    diff
}

macro_rules! def_fallback {
    ($t:ty, $fallback:ident, $check:ident) => {
        /// Naive triple loop, `C = alpha * A * B + beta * C`; `beta == 0` overwrites C.
        ///
        /// # Safety
        /// every strided element of A, B and C in range must be valid
        pub unsafe fn $fallback(
            m: usize,
            n: usize,
            k: usize,
            alpha: $t,
            a: *const $t,
            a_rs: usize,
            a_cs: usize,
            b: *const $t,
            b_rs: usize,
            b_cs: usize,
            beta: $t,
            c: *mut $t,
            c_rs: usize,
            c_cs: usize,
        ) {
            for i in 0..m {
                for j in 0..n {
                    let mut dx = 0.0;
                    for p in 0..k {
                        dx += *a.add(a_rs * i + a_cs * p) * *b.add(b_rs * p + b_cs * j);
                    }
                    let c_ij = c.add(c_rs * i + c_cs * j);
                    *c_ij = if beta == 0.0 { alpha * dx } else { alpha * dx + beta * *c_ij };
                }
            }
        }

        /// Runs the naive multiply into `c_ref` (holding the original C) and compares with `c`.
        ///
        /// # Safety
        /// same as the fallback
        pub unsafe fn $check(
            m: usize,
            n: usize,
            k: usize,
            alpha: $t,
            a: *const $t,
            a_rs: usize,
            a_cs: usize,
            b: *const $t,
            b_rs: usize,
            b_cs: usize,
            beta: $t,
            c: &[$t],
            c_rs: usize,
            c_cs: usize,
            c_ref: &mut [$t],
        ) -> f64 {
            $fallback(m, n, k, alpha, a, a_rs, a_cs, b, b_rs, b_cs, beta, c_ref.as_mut_ptr(), c_rs, c_cs);
            max_abs_diff(c, c_ref)
        }
    };
}

def_fallback!(f64, gemm_fallback_f64, check_gemm_f64);
def_fallback!(f32, gemm_fallback_f32, check_gemm_f32);

/// Zero, odd and tile-boundary sizes for the Strassen equivalence grid.
pub fn strassen_dims() -> Vec<usize> {
    vec![0, 1, 2, 3, 7, 8, 9, 63, 64, 65]
}

pub fn generate_m_dims(mc: usize, mr: usize) -> Vec<usize> {
    let mut a_dims = vec![];
    for m in 1..mr {
        a_dims.push(m);
        a_dims.push(m + 2 * mr);
    }
    a_dims.push(mc + 29);
    a_dims
}

pub fn generate_n_dims(nc: usize, nr: usize) -> Vec<usize> {
    let mut a_dims = vec![];
    for n in (1..nr).step_by(2) {
        a_dims.push(n);
        a_dims.push(n + 3 * nr);
    }
    a_dims.push(nc + 1);
    a_dims
}

// there is no register tile along k, 8 stands in for the unroll factor
pub fn generate_k_dims(kc: usize) -> Vec<usize> {
    let mut a_dims = vec![];
    let kr = 8;
    for k in (1..kr).step_by(3) {
        a_dims.push(k);
        a_dims.push(k + 50);
    }
    a_dims.push(kc + 3);
    a_dims
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_matches_hand_product() {
        // A = [[1, 2], [3, 4]], B = [[5, 6], [7, 8]], column-major
        let a = [1f64, 3.0, 2.0, 4.0];
        let b = [5f64, 7.0, 6.0, 8.0];
        let mut c = [1f64; 4];
        unsafe {
            gemm_fallback_f64(2, 2, 2, 1.0, a.as_ptr(), 1, 2, b.as_ptr(), 1, 2, 1.0, c.as_mut_ptr(), 1, 2);
        }
        assert_eq!(c, [20.0, 44.0, 23.0, 51.0]);
    }

    #[test]
    fn diff_reports_nan() {
        assert_eq!(max_abs_diff(&[1f64, 2.0], &[1.0, 2.0]), 0.0);
        assert_eq!(max_abs_diff(&[1f64, 2.0], &[1.0, f64::NAN]), f64::INFINITY);
    }
}
