//! Parallel cache-blocked GEMM with a one-level Strassen layer whose operand
//! additions are fused into packing and whose output updates are fused into the
//! micro-kernel.
//!
//! All matrices are column-major with a leading dimension.

#[cfg(target_arch = "x86_64")]
pub(crate) mod x86_64_arch;

pub(crate) mod gemm;
pub(crate) mod kernel;
pub(crate) mod macro_kernel;
pub(crate) mod pack;
pub(crate) mod reference;
pub(crate) mod straprim;
pub(crate) mod strassen;

pub use gemm::{gemm, BlockedGemm, PlainGemm};
pub use kernel::{AuxInfo, StraKernel};
pub use reference::RefKernel;
pub use strassen::{strassen, strassen_with};
#[cfg(target_arch = "x86_64")]
pub use x86_64_arch::HaswellD6x8;

pub use stra_base::{MatMut, MatRef, Result, StraError, StraPar, Trans};

use paste::paste;

/// Runs `$body` with `$k` bound to the best kernel for the scalar type.
macro_rules! dispatch_kernel {
    (f64, $k:ident => $body:expr) => {{
        #[cfg(target_arch = "x86_64")]
        {
            if let Some($k) = HaswellD6x8::new() {
                return $body;
            }
        }
        let $k = RefKernel::<6, 8>;
        $body
    }};
    (f32, $k:ident => $body:expr) => {{
        let $k = RefKernel::<8, 4>;
        $body
    }};
}

macro_rules! def_stra_api {
    ($t:tt, $p:ident) => {
        paste! {
            /// Blocked `C = alpha * op(A) * op(B) + beta * C`.
            ///
            /// `op(A)` is `m x k`, `op(B)` is `k x n`, `C` is `m x n`; every slice is
            /// checked against its leading dimension before anything is written.
            pub fn [<$p gemm>](
                trans_a: Trans,
                trans_b: Trans,
                m: usize,
                n: usize,
                k: usize,
                alpha: $t,
                a: &[$t],
                lda: usize,
                b: &[$t],
                ldb: usize,
                beta: $t,
                c: &mut [$t],
                ldc: usize,
                par: &StraPar,
            ) -> Result<()> {
                let a = MatRef::from_slice(a, m, k, lda, trans_a)?;
                let b = MatRef::from_slice(b, k, n, ldb, trans_b)?;
                let c = MatMut::from_slice(c, m, n, ldc)?;
                dispatch_kernel!($t, kernel => gemm(&kernel, par, alpha, a, b, beta, c))
            }

            /// One-level Strassen `C = alpha * op(A) * op(B) + beta * C`, same arguments
            /// as the blocked variant.
            pub fn [<$p strassen>](
                trans_a: Trans,
                trans_b: Trans,
                m: usize,
                n: usize,
                k: usize,
                alpha: $t,
                a: &[$t],
                lda: usize,
                b: &[$t],
                ldb: usize,
                beta: $t,
                c: &mut [$t],
                ldc: usize,
                par: &StraPar,
            ) -> Result<()> {
                let a = MatRef::from_slice(a, m, k, lda, trans_a)?;
                let b = MatRef::from_slice(b, k, n, ldb, trans_b)?;
                let c = MatMut::from_slice(c, m, n, ldc)?;
                dispatch_kernel!($t, kernel => strassen(&kernel, par, alpha, a, b, beta, c))
            }
        }
    };
}

def_stra_api!(f64, d);
def_stra_api!(f32, s);
