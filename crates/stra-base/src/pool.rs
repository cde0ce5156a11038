use aligned_vec::{avec, AVec, ConstAlign};

use crate::StraNum;

pub const PACK_ALIGN: usize = 64;

/// Aligned, zero-initialized scratch storage for packed operand panels.
///
/// Owned by one blocked-primitive call; each thread writes only the region its
/// coordinates select, so the team shares the buffer through a [`SyncPtr`].
pub struct PackBuf<T> {
    buf: AVec<T, ConstAlign<PACK_ALIGN>>,
}

impl<T: StraNum> PackBuf<T> {
    pub fn zeroed(len: usize) -> Self {
        let buf = avec![[PACK_ALIGN]| T::ZERO; len];
        Self { buf }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn sync_ptr(&mut self) -> SyncPtr<T> {
        SyncPtr(self.buf.as_mut_ptr())
    }

    pub fn as_slice(&self) -> &[T] {
        &self.buf
    }
}

#[derive(Copy, Clone, Debug)]
pub struct SyncPtr<T>(pub *mut T);

unsafe impl<T> Send for SyncPtr<T> {}
unsafe impl<T> Sync for SyncPtr<T> {}

impl<T> SyncPtr<T> {
    /// # Safety
    /// the offset must stay within the allocation behind the pointer
    #[inline]
    pub unsafe fn add(self, offset: usize) -> *mut T {
        self.0.add(offset)
    }
}
