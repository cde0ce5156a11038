//! Non-owning strided views over caller matrices.
//!
//! Storage is column-major with a leading dimension. A transposed operand is the
//! same storage with row and column strides swapped, so read views carry both
//! strides and downstream code never branches on a transpose flag. Outputs are
//! always column-major.

use core::marker::PhantomData;

use crate::{Result, StraError, StraNum};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Trans {
    N,
    T,
}

impl Trans {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'n' | 'N' => Some(Trans::N),
            't' | 'T' => Some(Trans::T),
            _ => None,
        }
    }
}

fn check_storage(len: usize, rows: usize, cols: usize, ld: usize, what: &str) -> Result<()> {
    if ld < rows.max(1) {
        return Err(StraError::OutOfBounds(format!("{}: leading dimension {} < rows {}", what, ld, rows)));
    }
    let required = if rows == 0 || cols == 0 { 0 } else { ld * (cols - 1) + rows };
    if len < required {
        return Err(StraError::OutOfBounds(format!(
            "{}: slice of length {} cannot hold {}x{} with ld {}",
            what, len, rows, cols, ld
        )));
    }
    Ok(())
}

fn check_sub(r0: usize, c0: usize, rows: usize, cols: usize, p_rows: usize, p_cols: usize) -> Result<()> {
    if r0 + rows > p_rows || c0 + cols > p_cols {
        return Err(StraError::OutOfBounds(format!(
            "sub view [{}..{}, {}..{}] exceeds parent {}x{}",
            r0,
            r0 + rows,
            c0,
            c0 + cols,
            p_rows,
            p_cols
        )));
    }
    Ok(())
}

/// Read-only view of a logical `rows x cols` matrix.
#[derive(Copy, Clone, Debug)]
pub struct MatRef<'a, T> {
    ptr: *const T,
    rows: usize,
    cols: usize,
    rs: usize,
    cs: usize,
    _marker: PhantomData<&'a T>,
}

unsafe impl<T: Sync> Send for MatRef<'_, T> {}
unsafe impl<T: Sync> Sync for MatRef<'_, T> {}

impl<'a, T: StraNum> MatRef<'a, T> {
    /// View of `op(X)` where `X` is stored column-major in `data` with leading dimension `ld`.
    /// `rows x cols` is the logical extent after `trans` is applied.
    pub fn from_slice(data: &'a [T], rows: usize, cols: usize, ld: usize, trans: Trans) -> Result<Self> {
        let (s_rows, s_cols) = match trans {
            Trans::N => (rows, cols),
            Trans::T => (cols, rows),
        };
        check_storage(data.len(), s_rows, s_cols, ld, "matrix")?;
        let (rs, cs) = match trans {
            Trans::N => (1, ld),
            Trans::T => (ld, 1),
        };
        Ok(Self { ptr: data.as_ptr(), rows, cols, rs, cs, _marker: PhantomData })
    }

    /// # Safety
    /// every `ptr + i*rs + j*cs` with `i < rows`, `j < cols` must be readable for `'a`
    pub unsafe fn from_raw(ptr: *const T, rows: usize, cols: usize, rs: usize, cs: usize) -> Self {
        Self { ptr, rows, cols, rs, cs, _marker: PhantomData }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }
    #[inline]
    pub fn rs(&self) -> usize {
        self.rs
    }
    #[inline]
    pub fn cs(&self) -> usize {
        self.cs
    }

    #[inline]
    pub fn t(self) -> Self {
        Self { ptr: self.ptr, rows: self.cols, cols: self.rows, rs: self.cs, cs: self.rs, _marker: PhantomData }
    }

    pub fn sub(self, r0: usize, c0: usize, rows: usize, cols: usize) -> Result<Self> {
        check_sub(r0, c0, rows, cols, self.rows, self.cols)?;
        Ok(unsafe { self.sub_unchecked(r0, c0, rows, cols) })
    }

    /// # Safety
    /// `r0 + rows <= self.rows()` and `c0 + cols <= self.cols()`
    #[inline]
    pub unsafe fn sub_unchecked(self, r0: usize, c0: usize, rows: usize, cols: usize) -> Self {
        let ptr = if rows == 0 || cols == 0 { self.ptr } else { self.ptr.add(r0 * self.rs + c0 * self.cs) };
        Self { ptr, rows, cols, rs: self.rs, cs: self.cs, _marker: PhantomData }
    }

    /// Quadrant `(qi, qj)` of the largest even-sized leading region.
    pub fn quadrant(self, qi: usize, qj: usize) -> Self {
        assert!(qi < 2 && qj < 2);
        let (hr, hc) = (self.rows / 2, self.cols / 2);
        unsafe { self.sub_unchecked(qi * hr, qj * hc, hr, hc) }
    }

    #[inline]
    pub fn ptr(&self) -> *const T {
        self.ptr
    }

    /// # Safety
    /// `i < rows` and `j < cols`
    #[inline]
    pub unsafe fn get_unchecked(&self, i: usize, j: usize) -> T {
        *self.ptr.add(i * self.rs + j * self.cs)
    }

    pub fn get(&self, i: usize, j: usize) -> Option<T> {
        if i < self.rows && j < self.cols {
            Some(unsafe { self.get_unchecked(i, j) })
        } else {
            None
        }
    }
}

/// Writable view of a column-major `rows x cols` block with leading dimension `ld`.
///
/// Views are `Copy` so that disjoint blocks of one output can be handed to the
/// thread team; element writes are `unsafe` and the caller guarantees that no two
/// threads touch the same element concurrently.
#[derive(Copy, Clone, Debug)]
pub struct MatMut<'a, T> {
    ptr: *mut T,
    rows: usize,
    cols: usize,
    ld: usize,
    _marker: PhantomData<&'a mut T>,
}

unsafe impl<T: Send> Send for MatMut<'_, T> {}
unsafe impl<T: Sync> Sync for MatMut<'_, T> {}

impl<'a, T: StraNum> MatMut<'a, T> {
    pub fn from_slice(data: &'a mut [T], rows: usize, cols: usize, ld: usize) -> Result<Self> {
        check_storage(data.len(), rows, cols, ld, "output matrix")?;
        Ok(Self { ptr: data.as_mut_ptr(), rows, cols, ld, _marker: PhantomData })
    }

    /// # Safety
    /// every `ptr + i + j*ld` with `i < rows`, `j < cols` must be writable for `'a`
    pub unsafe fn from_raw(ptr: *mut T, rows: usize, cols: usize, ld: usize) -> Self {
        Self { ptr, rows, cols, ld, _marker: PhantomData }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }
    #[inline]
    pub fn ld(&self) -> usize {
        self.ld
    }

    pub fn sub(self, r0: usize, c0: usize, rows: usize, cols: usize) -> Result<Self> {
        check_sub(r0, c0, rows, cols, self.rows, self.cols)?;
        Ok(unsafe { self.sub_unchecked(r0, c0, rows, cols) })
    }

    /// # Safety
    /// `r0 + rows <= self.rows()` and `c0 + cols <= self.cols()`
    #[inline]
    pub unsafe fn sub_unchecked(self, r0: usize, c0: usize, rows: usize, cols: usize) -> Self {
        let ptr = if rows == 0 || cols == 0 { self.ptr } else { self.ptr.add(r0 + c0 * self.ld) };
        Self { ptr, rows, cols, ld: self.ld, _marker: PhantomData }
    }

    pub fn quadrant(self, qi: usize, qj: usize) -> Self {
        assert!(qi < 2 && qj < 2);
        let (hr, hc) = (self.rows / 2, self.cols / 2);
        unsafe { self.sub_unchecked(qi * hr, qj * hc, hr, hc) }
    }

    /// # Safety
    /// `i < rows` and `j < cols`
    #[inline]
    pub unsafe fn ptr_at(&self, i: usize, j: usize) -> *mut T {
        self.ptr.add(i + j * self.ld)
    }

    /// `C = beta * C`, writing exact zeros when `beta == 0`.
    ///
    /// # Safety
    /// no other thread accesses the block during the call
    pub unsafe fn scale(&self, beta: T) {
        if beta == T::ONE {
            return;
        }
        for j in 0..self.cols {
            for i in 0..self.rows {
                let p = self.ptr_at(i, j);
                *p = if beta == T::ZERO { T::ZERO } else { beta * *p };
            }
        }
    }
}

/// An A or B operand of one blocked-primitive call: a plain view or the
/// combination `primary + coef * secondary`, formed while packing.
#[derive(Copy, Clone, Debug)]
pub enum Operand<'a, T> {
    Single(MatRef<'a, T>),
    Combined { primary: MatRef<'a, T>, secondary: MatRef<'a, T>, coef: T },
}

impl<'a, T: StraNum> Operand<'a, T> {
    /// A zero coefficient collapses to [`Operand::Single`], so the secondary view is never read.
    pub fn combined(primary: MatRef<'a, T>, secondary: MatRef<'a, T>, coef: T) -> Result<Self> {
        if primary.rows() != secondary.rows() || primary.cols() != secondary.cols() {
            return Err(StraError::DimensionMismatch(format!(
                "combined operand {}x{} vs {}x{}",
                primary.rows(),
                primary.cols(),
                secondary.rows(),
                secondary.cols()
            )));
        }
        if coef == T::ZERO {
            return Ok(Operand::Single(primary));
        }
        Ok(Operand::Combined { primary, secondary, coef })
    }

    #[inline]
    pub fn primary(&self) -> MatRef<'a, T> {
        match self {
            Operand::Single(p) => *p,
            Operand::Combined { primary, .. } => *primary,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.primary().rows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.primary().cols()
    }

    pub fn t(self) -> Self {
        match self {
            Operand::Single(p) => Operand::Single(p.t()),
            Operand::Combined { primary, secondary, coef } => {
                Operand::Combined { primary: primary.t(), secondary: secondary.t(), coef }
            }
        }
    }
}

impl<'a, T> From<MatRef<'a, T>> for Operand<'a, T> {
    fn from(m: MatRef<'a, T>) -> Self {
        Operand::Single(m)
    }
}

/// Output targets of one blocked-primitive call: `C0 += alpha0 * AB` and optionally `C1 += alpha1 * AB`.
#[derive(Copy, Clone, Debug)]
pub enum Dest<'a, T> {
    Single { c: MatMut<'a, T>, alpha: T },
    Dual { c0: MatMut<'a, T>, alpha0: T, c1: MatMut<'a, T>, alpha1: T },
}

impl<'a, T: StraNum> Dest<'a, T> {
    pub fn single(c: MatMut<'a, T>, alpha: T) -> Self {
        Dest::Single { c, alpha }
    }

    /// A zero `alpha1` collapses to [`Dest::Single`].
    pub fn dual(c0: MatMut<'a, T>, alpha0: T, c1: MatMut<'a, T>, alpha1: T) -> Result<Self> {
        if c0.rows() != c1.rows() || c0.cols() != c1.cols() || c0.ld() != c1.ld() {
            return Err(StraError::DimensionMismatch(format!(
                "dual destination {}x{} (ld {}) vs {}x{} (ld {})",
                c0.rows(),
                c0.cols(),
                c0.ld(),
                c1.rows(),
                c1.cols(),
                c1.ld()
            )));
        }
        if alpha1 == T::ZERO {
            return Ok(Dest::Single { c: c0, alpha: alpha0 });
        }
        Ok(Dest::Dual { c0, alpha0, c1, alpha1 })
    }

    #[inline]
    pub fn first(&self) -> (MatMut<'a, T>, T) {
        match self {
            Dest::Single { c, alpha } => (*c, *alpha),
            Dest::Dual { c0, alpha0, .. } => (*c0, *alpha0),
        }
    }

    #[inline]
    pub fn second(&self) -> Option<(MatMut<'a, T>, T)> {
        match self {
            Dest::Single { .. } => None,
            Dest::Dual { c1, alpha1, .. } => Some((*c1, *alpha1)),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.first().0.rows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.first().0.cols()
    }

    /// The same block of every target.
    ///
    /// # Safety
    /// `r0 + rows <= self.rows()` and `c0 + cols <= self.cols()`
    pub unsafe fn sub_unchecked(&self, r0: usize, c0: usize, rows: usize, cols: usize) -> Self {
        match *self {
            Dest::Single { c, alpha } => Dest::Single { c: c.sub_unchecked(r0, c0, rows, cols), alpha },
            Dest::Dual { c0: t0, alpha0, c1: t1, alpha1 } => Dest::Dual {
                c0: t0.sub_unchecked(r0, c0, rows, cols),
                alpha0,
                c1: t1.sub_unchecked(r0, c0, rows, cols),
                alpha1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_bounds_are_checked() {
        let a = vec![0f64; 11];
        assert!(MatRef::from_slice(&a, 3, 4, 3, Trans::N).is_err());
        assert!(MatRef::from_slice(&a, 3, 4, 2, Trans::N).is_err());
        assert!(MatRef::from_slice(&a, 3, 4, 3, Trans::T).is_err());
        assert!(MatRef::from_slice(&a, 4, 2, 2, Trans::T).is_ok());
        assert!(MatRef::from_slice(&a[..0], 0, 7, 1, Trans::N).is_ok());
        let mut c = vec![0f64; 12];
        assert!(MatMut::from_slice(&mut c, 3, 4, 3).is_ok());
        assert!(MatMut::from_slice(&mut c, 4, 4, 3).is_err());
    }

    #[test]
    fn transposed_view_reads_storage_rows() {
        // stored 2x3 column-major: [[1, 3, 5], [2, 4, 6]]
        let a = [1f64, 2.0, 3.0, 4.0, 5.0, 6.0];
        let at = MatRef::from_slice(&a, 3, 2, 2, Trans::T).unwrap();
        assert_eq!(at.get(0, 1), Some(2.0));
        assert_eq!(at.get(2, 0), Some(5.0));
        assert_eq!(at.t().get(1, 2), Some(6.0));
        assert_eq!(at.get(3, 0), None);
    }

    #[test]
    fn sub_view_rejects_overflow() {
        let a = vec![0f32; 20];
        let v = MatRef::from_slice(&a, 4, 5, 4, Trans::N).unwrap();
        assert!(v.sub(1, 1, 3, 4).is_ok());
        assert!(matches!(v.sub(2, 0, 3, 1), Err(StraError::OutOfBounds(_))));
        assert!(matches!(v.sub(0, 3, 1, 3), Err(StraError::OutOfBounds(_))));
    }

    #[test]
    fn quadrants_reassemble_original() {
        let (m, n, ld) = (7, 9, 8);
        let a: Vec<f64> = (0..ld * n).map(|x| x as f64 * 0.5 - 3.0).collect();
        let v = MatRef::from_slice(&a, m, n, ld, Trans::N).unwrap();
        let (hm, hn) = (m / 2, n / 2);
        let mut out = vec![f64::NAN; ld * n];
        for qi in 0..2 {
            for qj in 0..2 {
                let q = v.quadrant(qi, qj);
                assert_eq!((q.rows(), q.cols()), (hm, hn));
                for j in 0..hn {
                    for i in 0..hm {
                        out[(qi * hm + i) + (qj * hn + j) * ld] = q.get(i, j).unwrap();
                    }
                }
            }
        }
        let r_rows = v.sub(2 * hm, 0, m - 2 * hm, n).unwrap();
        let r_cols = v.sub(0, 2 * hn, 2 * hm, n - 2 * hn).unwrap();
        for j in 0..n {
            for i in 0..r_rows.rows() {
                out[(2 * hm + i) + j * ld] = r_rows.get(i, j).unwrap();
            }
        }
        for j in 0..r_cols.cols() {
            for i in 0..r_cols.rows() {
                out[i + (2 * hn + j) * ld] = r_cols.get(i, j).unwrap();
            }
        }
        for j in 0..n {
            for i in 0..m {
                assert_eq!(out[i + j * ld].to_bits(), a[i + j * ld].to_bits());
            }
        }
    }

    #[test]
    fn zero_coefficient_collapses() {
        let a = [1f64; 4];
        let b = [2f64; 6];
        let p = MatRef::from_slice(&a, 2, 2, 2, Trans::N).unwrap();
        let q = MatRef::from_slice(&b, 2, 3, 2, Trans::N).unwrap();
        assert!(matches!(Operand::combined(p, p, 0.0), Ok(Operand::Single(_))));
        assert!(matches!(Operand::combined(p, p, -1.0), Ok(Operand::Combined { .. })));
        assert!(matches!(Operand::combined(p, q, 1.0), Err(StraError::DimensionMismatch(_))));

        let mut c0 = [0f64; 4];
        let mut c1 = [0f64; 4];
        let c0 = MatMut::from_slice(&mut c0, 2, 2, 2).unwrap();
        let c1 = MatMut::from_slice(&mut c1, 2, 2, 2).unwrap();
        assert!(matches!(Dest::dual(c0, 1.0, c1, 0.0), Ok(Dest::Single { .. })));
        let d = Dest::dual(c0, 1.0, c1, -1.0).unwrap();
        assert_eq!(d.first().1, 1.0);
        assert_eq!(d.second().map(|x| x.1), Some(-1.0));
    }

    #[test]
    fn scale_zeroes_nan() {
        let mut c = [f64::NAN, 1.0, 2.0, 3.0];
        let v = MatMut::from_slice(&mut c, 2, 2, 2).unwrap();
        unsafe { v.scale(0.0) };
        assert_eq!(c, [0.0; 4]);
        let mut c = [1f32, 2.0, 3.0, 4.0];
        let v = MatMut::from_slice(&mut c, 1, 2, 2).unwrap();
        unsafe { v.scale(2.0) };
        assert_eq!(c, [2.0, 2.0, 6.0, 4.0]);
    }

    #[test]
    fn mat_mut_quadrant_writes_through_ld() {
        // 5x4 block inside storage with ld 6
        let mut c = vec![0f64; 6 * 4];
        let v = MatMut::from_slice(&mut c, 5, 4, 6).unwrap();
        assert_eq!((v.rows(), v.cols(), v.ld()), (5, 4, 6));
        let q11 = v.quadrant(1, 1);
        assert_eq!((q11.rows(), q11.cols(), q11.ld()), (2, 2, 6));
        unsafe {
            *q11.ptr_at(1, 0) = 7.0;
            let s = v.sub(4, 3, 1, 1).unwrap();
            *s.ptr_at(0, 0) = 9.0;
        }
        assert!(matches!(v.sub(4, 0, 2, 1), Err(StraError::OutOfBounds(_))));
        // quadrant (1, 1) starts at (2, 2), its (1, 0) element is (3, 2)
        assert_eq!(c[3 + 2 * 6], 7.0);
        assert_eq!(c[4 + 3 * 6], 9.0);
        assert_eq!(c.iter().filter(|&&x| x != 0.0).count(), 2);
    }
}
