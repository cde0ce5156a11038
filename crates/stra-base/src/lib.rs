//! # This crate is only for internal use in the stra project
//! Nothing is expected to be used outside this module
//! No semver guarantees

use core::fmt::Debug;
use core::ops::{Add, AddAssign, Mul, Neg, Sub};
use once_cell::sync::Lazy;

pub mod comm;
pub mod error;
pub mod pool;
pub mod view;

pub use comm::{get_range, ThreadComm, Worker};
pub use error::{Result, StraError};
pub use pool::{PackBuf, SyncPtr, PACK_ALIGN};
pub use view::{Dest, MatMut, MatRef, Operand, Trans};

pub trait StraNum:
    Copy
    + Send
    + Sync
    + 'static
    + Debug
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + AddAssign
{
    const ZERO: Self;
    const ONE: Self;
}

macro_rules! impl_stra_num {
    ($($t:ty),*) => {
        $(
            impl StraNum for $t {
                const ZERO: Self = 0.0;
                const ONE: Self = 1.0;
            }
        )*
    };
}

impl_stra_num!(f32, f64);

#[cfg(target_arch = "x86_64")]
#[derive(Copy, Clone, Debug)]
pub struct CpuFeatures {
    pub avx: bool,
    pub avx2: bool,
    pub fma: bool,
}

#[cfg(not(target_arch = "x86_64"))]
#[derive(Copy, Clone, Debug)]
pub struct CpuFeatures {
    pub dummy: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HWModel {
    Reference,
    Haswell,
}

impl HWModel {
    pub fn from_cpu_ft(_cpu_ft: CpuFeatures) -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if _cpu_ft.avx && _cpu_ft.avx2 && _cpu_ft.fma {
                return HWModel::Haswell;
            }
        }
        HWModel::Reference
    }
}

pub struct HWConfig {
    pub cpu_ft: CpuFeatures,
    pub hw_model: HWModel,
}

#[inline]
fn detect_hw_config() -> HWConfig {
    #[cfg(target_arch = "x86_64")]
    {
        let cpuid = raw_cpuid::CpuId::new();
        let (avx, fma) = match cpuid.get_feature_info() {
            Some(info) => (info.has_avx(), info.has_fma()),
            None => (false, false),
        };
        let avx2 = cpuid.get_extended_feature_info().map(|info| info.has_avx2()).unwrap_or(false);
        let cpu_ft = CpuFeatures { avx, avx2, fma };
        let hw_model = HWModel::from_cpu_ft(cpu_ft);
        tracing::debug!(?cpu_ft, ?hw_model, "detected hardware config");
        HWConfig { cpu_ft, hw_model }
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        let cpu_ft = CpuFeatures { dummy: false };
        HWConfig { cpu_ft, hw_model: HWModel::Reference }
    }
}

#[cfg(feature = "debug_cpu_features")]
fn apply_debug_cpu_features(hw_config: &mut HWConfig) {
    #[cfg(target_arch = "x86_64")]
    {
        if std::env::var("STRA_AVX2_OFF").is_ok() {
            hw_config.cpu_ft.avx2 = false;
        }
        if std::env::var("STRA_FMA_OFF").is_ok() {
            hw_config.cpu_ft.fma = false;
        }
        hw_config.hw_model = HWModel::from_cpu_ft(hw_config.cpu_ft);
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        let _ = hw_config;
    }
}

#[cfg(not(feature = "debug_cpu_features"))]
pub static RUNTIME_HW_CONFIG: Lazy<HWConfig> = Lazy::new(detect_hw_config);
#[cfg(feature = "debug_cpu_features")]
pub static RUNTIME_HW_CONFIG: Lazy<HWConfig> = Lazy::new(|| {
    let mut hw_config = detect_hw_config();
    apply_debug_cpu_features(&mut hw_config);
    hw_config
});

pub fn has_f64_fma_compute() -> bool {
    RUNTIME_HW_CONFIG.hw_model == HWModel::Haswell
}

pub const STRA_JC_NT: &str = "STRA_JC_NT";
pub const STRA_IC_NT: &str = "STRA_IC_NT";
pub const STRA_JR_NT: &str = "STRA_JR_NT";

/// Team sizes of the four communicator levels:
/// column panel (jc), depth panel (pc), row panel (ic), row micro panel (jr).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StraPar {
    pub jc_nt: usize,
    pub pc_nt: usize,
    pub ic_nt: usize,
    pub jr_nt: usize,
}

impl Default for StraPar {
    fn default() -> Self {
        Self { jc_nt: 1, pc_nt: 1, ic_nt: 1, jr_nt: 1 }
    }
}

impl StraPar {
    pub fn new(jc_nt: usize, ic_nt: usize, jr_nt: usize) -> Result<Self> {
        Self::with_pc(jc_nt, 1, ic_nt, jr_nt)
    }

    pub fn with_pc(jc_nt: usize, pc_nt: usize, ic_nt: usize, jr_nt: usize) -> Result<Self> {
        if jc_nt == 0 || pc_nt == 0 || ic_nt == 0 || jr_nt == 0 {
            return Err(StraError::InvalidConfig(format!(
                "thread counts must be positive, got jc: {}, pc: {}, ic: {}, jr: {}",
                jc_nt, pc_nt, ic_nt, jr_nt
            )));
        }
        // the depth loop is sequential, every pc sibling would redo the same rank-k update
        if pc_nt != 1 {
            return Err(StraError::InvalidConfig(format!("depth panel parallelism is not supported, pc: {}", pc_nt)));
        }
        Ok(Self { jc_nt, pc_nt, ic_nt, jr_nt })
    }

    /// Reads `STRA_JC_NT`, `STRA_IC_NT` and `STRA_JR_NT`, each defaulting to 1.
    pub fn from_env() -> Self {
        let jc_nt = read_nt_env(STRA_JC_NT);
        let ic_nt = read_nt_env(STRA_IC_NT);
        let jr_nt = read_nt_env(STRA_JR_NT);
        Self { jc_nt, pc_nt: 1, ic_nt, jr_nt }
    }

    #[inline]
    pub fn num_threads(&self) -> usize {
        self.jc_nt * self.pc_nt * self.ic_nt * self.jr_nt
    }
}

fn read_nt_env(name: &str) -> usize {
    match std::env::var(name) {
        Ok(x) => match x.trim().parse::<usize>() {
            Ok(nt) if nt > 0 => nt,
            _ => {
                tracing::warn!(name, value = %x, "ignoring invalid thread count, using 1");
                1
            }
        },
        Err(_) => 1,
    }
}

#[inline]
pub fn round_up(x: usize, unit: usize) -> usize {
    (x + unit - 1) / unit * unit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn par_rejects_zero_and_depth_split() {
        assert!(matches!(StraPar::new(0, 1, 1), Err(StraError::InvalidConfig(_))));
        assert!(matches!(StraPar::with_pc(1, 2, 1, 1), Err(StraError::InvalidConfig(_))));
        let par = StraPar::new(2, 3, 2).unwrap();
        assert_eq!(par.num_threads(), 12);
        assert_eq!(StraPar::default().num_threads(), 1);
    }

    #[test]
    fn par_from_env_defaults_to_one() {
        std::env::remove_var(STRA_JC_NT);
        std::env::set_var(STRA_IC_NT, "3");
        std::env::set_var(STRA_JR_NT, "not-a-number");
        let par = StraPar::from_env();
        std::env::remove_var(STRA_IC_NT);
        std::env::remove_var(STRA_JR_NT);
        assert_eq!(par, StraPar { jc_nt: 1, pc_nt: 1, ic_nt: 3, jr_nt: 1 });
    }

    #[test]
    fn round_up_units() {
        assert_eq!(round_up(0, 8), 0);
        assert_eq!(round_up(1, 8), 8);
        assert_eq!(round_up(16, 8), 16);
        assert_eq!(round_up(17, 6), 18);
    }
}
