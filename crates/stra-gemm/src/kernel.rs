use stra_base::{StraNum, PACK_ALIGN};

/// Largest `MR * NR` a kernel may declare; corner tiles live in a stack buffer of this size.
pub const MAX_TILE_LEN: usize = 256;

/// Side information for one micro-tile.
#[derive(Copy, Clone, Debug)]
pub struct AuxInfo<T> {
    /// the destinations receive their final update in this call
    pub is_last_pc: bool,
    /// actual rows of the tile, `<= MR`
    pub ib: usize,
    /// actual columns of the tile, `<= NR`
    pub jb: usize,
    /// next packed B micro-panel this thread reads, for prefetching only
    pub b_next: *const T,
}

/// Register-tile capability the blocked loop nest is built around.
///
/// Packed A holds `k` columns of `PACK_MR` values, packed B holds `k` rows of
/// `PACK_NR` values. Destinations are column-major tiles with column stride
/// `ldc`; only the leading `aux.ib x aux.jb` block is touched. Both operators accumulate:
/// `c_list[t][i + j * ldc] += alpha_list[t] * sum_p a[p * PACK_MR + i] * b[p * PACK_NR + j]`.
pub trait StraKernel<T: StraNum>: Sync {
    const NAME: &'static str;

    const MC: usize;
    const NC: usize;
    const KC: usize;
    const MR: usize;
    const NR: usize;
    const PACK_MR: usize = Self::MR;
    const PACK_NR: usize = Self::NR;
    const ALIGN_SIZE: usize = PACK_ALIGN;
    const PACK_MC: usize = (Self::MC + Self::MR - 1) / Self::MR * Self::PACK_MR;
    const TILE_FITS: () = assert!(Self::MR * Self::NR <= MAX_TILE_LEN, "register tile exceeds MAX_TILE_LEN");

    /// Whether [`StraKernel::stra_op`] supports two destinations.
    /// The Strassen driver refuses kernels that return `false`.
    fn stra_implemented(&self) -> bool {
        true
    }

    /// Fused operator, used on the last depth panel.
    ///
    /// # Safety
    /// `a`, `b` must hold `k` packed steps, every destination must hold an `aux.ib x aux.jb` tile,
    /// `c_list.len() == alpha_list.len()` and `1 <= c_list.len() <= 2`.
    unsafe fn stra_op(&self, k: usize, a: *const T, b: *const T, c_list: &[*mut T], ldc: usize, alpha_list: &[T], aux: &AuxInfo<T>);

    /// Semiring rank-k update, used on every depth panel but the last.
    ///
    /// # Safety
    /// same as [`StraKernel::stra_op`]
    unsafe fn rank_k(&self, k: usize, a: *const T, b: *const T, c_list: &[*mut T], ldc: usize, alpha_list: &[T], aux: &AuxInfo<T>) {
        self.stra_op(k, a, b, c_list, ldc, alpha_list, aux)
    }
}
