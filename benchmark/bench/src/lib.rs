use stra_base::{Result, StraPar, Trans};
use stra_dev::ABLayout;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GemmBackend {
    Blocked,
    Strassen,
}

pub fn gemm_backend_from_str(backend_str: &str) -> Option<GemmBackend> {
    match backend_str {
        "blocked" | "gemm" => Some(GemmBackend::Blocked),
        "strassen" | "stra" => Some(GemmBackend::Strassen),
        _ => None,
    }
}

pub fn layout_from_str(layout_str: &str) -> Option<ABLayout> {
    match layout_str {
        "nn" => Some(ABLayout::NN),
        "nt" => Some(ABLayout::NT),
        "tn" => Some(ABLayout::TN),
        "tt" => Some(ABLayout::TT),
        _ => None,
    }
}

/// Storage extents of A and B for a layout, `(rows, cols)` of the stored matrices.
pub fn stored_sizes(layout: &ABLayout, m: usize, n: usize, k: usize) -> (usize, usize) {
    let (lda, ldb, _) = stra_dev::layout_to_lds(layout, m, n, k);
    let a_cols = match layout {
        ABLayout::NN | ABLayout::NT => k,
        ABLayout::TN | ABLayout::TT => m,
    };
    let b_cols = match layout {
        ABLayout::NN | ABLayout::TN => n,
        ABLayout::NT | ABLayout::TT => k,
    };
    (lda * a_cols.max(1), ldb * b_cols.max(1))
}

pub trait BenchScalar: Copy + 'static {
    #[allow(clippy::too_many_arguments)]
    fn dispatch(
        backend: GemmBackend,
        trans_a: Trans,
        trans_b: Trans,
        m: usize,
        n: usize,
        k: usize,
        alpha: Self,
        a: &[Self],
        lda: usize,
        b: &[Self],
        ldb: usize,
        beta: Self,
        c: &mut [Self],
        ldc: usize,
        par: &StraPar,
    ) -> Result<()>;
}

macro_rules! impl_bench_scalar {
    ($t:ty, $gemm:ident, $strassen:ident) => {
        impl BenchScalar for $t {
            fn dispatch(
                backend: GemmBackend,
                trans_a: Trans,
                trans_b: Trans,
                m: usize,
                n: usize,
                k: usize,
                alpha: Self,
                a: &[Self],
                lda: usize,
                b: &[Self],
                ldb: usize,
                beta: Self,
                c: &mut [Self],
                ldc: usize,
                par: &StraPar,
            ) -> Result<()> {
                match backend {
                    GemmBackend::Blocked => {
                        stra_gemm::$gemm(trans_a, trans_b, m, n, k, alpha, a, lda, b, ldb, beta, c, ldc, par)
                    }
                    GemmBackend::Strassen => {
                        stra_gemm::$strassen(trans_a, trans_b, m, n, k, alpha, a, lda, b, ldb, beta, c, ldc, par)
                    }
                }
            }
        }
    };
}

impl_bench_scalar!(f64, dgemm, dstrassen);
impl_bench_scalar!(f32, sgemm, sstrassen);

/// Runs one multiply with the layout's leading dimensions.
#[allow(clippy::too_many_arguments)]
pub fn dispatch_gemm<T: BenchScalar>(
    backend: GemmBackend,
    layout: &ABLayout,
    m: usize,
    n: usize,
    k: usize,
    alpha: T,
    a: &[T],
    b: &[T],
    beta: T,
    c: &mut [T],
    par: &StraPar,
) -> Result<()> {
    let (lda, ldb, ldc) = stra_dev::layout_to_lds(layout, m, n, k);
    let (t_a, t_b) = stra_dev::layout_to_trans(layout);
    let trans_a = Trans::from_char(t_a).unwrap_or(Trans::N);
    let trans_b = Trans::from_char(t_b).unwrap_or(Trans::N);
    T::dispatch(backend, trans_a, trans_b, m, n, k, alpha, a, lda, b, ldb, beta, c, ldc, par)
}
