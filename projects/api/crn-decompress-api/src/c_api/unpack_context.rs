//! Unpack context management for the C API.
//!
//! A context is created by [`crnd_unpack_begin`] and released by [`crnd_unpack_end`].
//! Live contexts are tracked by address, so a released or foreign pointer is rejected
//! unless a later context happens to reuse the same allocation.

use super::error::CrndErrorCode;
use super::info::data_slice;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::ffi::c_void;
use core::ptr;
use core::slice;
use crn_decompress::Unpacker;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Opaque unpack context.
///
/// A context must not be used from two threads at once; separate contexts are independent.
#[repr(C)]
pub struct CrndUnpackContext {
    // Private field to ensure it's opaque
    _private: [u8; 0],
}

/// Internal representation of the unpack context.
///
/// The data is borrowed for as long as the caller keeps the context alive.
struct UnpackContextInner {
    unpacker: Unpacker<'static>,
}

/// Addresses of all live contexts.
static LIVE_CONTEXTS: Mutex<BTreeSet<usize>> = Mutex::new(BTreeSet::new());

fn live_contexts() -> MutexGuard<'static, BTreeSet<usize>> {
    LIVE_CONTEXTS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Creates an unpack context, decoding the tables and palettes of the file.
///
/// # Returns
///
/// The context, or null if the data is invalid.
/// Release it with [`crnd_unpack_end`].
///
/// # Safety
///
/// - `data` must be valid for reads of `size` bytes until the context is released
#[unsafe(no_mangle)]
pub unsafe extern "C" fn crnd_unpack_begin(data: *const c_void, size: u32) -> *mut c_void {
    let Ok(data) = (unsafe { data_slice(data, size) }) else {
        return ptr::null_mut();
    };
    let Ok(unpacker) = Unpacker::new(data) else {
        return ptr::null_mut();
    };

    let context = Box::into_raw(Box::new(UnpackContextInner { unpacker })) as *mut c_void;
    live_contexts().insert(context as usize);
    context
}

/// Releases an unpack context.
///
/// # Returns
///
/// `true` if the context was live; `false` for null or unknown contexts.
/// A released context may alias a later one whose allocation reuses its address.
///
/// # Safety
///
/// - `context` must be null or a pointer returned by [`crnd_unpack_begin`]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn crnd_unpack_end(context: *mut c_void) -> bool {
    if context.is_null() || !live_contexts().remove(&(context as usize)) {
        return false;
    }
    unsafe {
        drop(Box::from_raw(context as *mut UnpackContextInner));
    }
    true
}

/// Unpacks one level into DXT blocks.
///
/// # Parameters
///
/// - `context`: A live context from [`crnd_unpack_begin`]
/// - `dst`: Array of one output buffer per face
/// - `dst_size`: Size of each output buffer in bytes
/// - `row_pitch`: Bytes between block rows; 0 for tightly packed rows
/// - `level_index`: The level to unpack
///
/// # Returns
///
/// `true` on success. On failure the buffers may be partially written.
///
/// # Safety
///
/// - `dst` must point to as many buffer pointers as the texture has faces
/// - Every buffer must be valid for writes of `dst_size` bytes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn crnd_unpack_level(
    context: *mut c_void,
    dst: *mut *mut c_void,
    dst_size: u32,
    row_pitch: u32,
    level_index: u32,
) -> bool {
    let code =
        unsafe { crnd_unpack_level_with_error(context, dst, dst_size, row_pitch, level_index) };
    code == CrndErrorCode::Success
}

/// [`crnd_unpack_level`], reporting why it failed.
///
/// # Safety
///
/// Same as [`crnd_unpack_level`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn crnd_unpack_level_with_error(
    context: *mut c_void,
    dst: *mut *mut c_void,
    dst_size: u32,
    row_pitch: u32,
    level_index: u32,
) -> CrndErrorCode {
    if context.is_null() || !live_contexts().contains(&(context as usize)) {
        return CrndErrorCode::InvalidContext;
    }
    if dst.is_null() {
        return CrndErrorCode::NullOutputPointer;
    }

    let inner = unsafe { &*(context as *const UnpackContextInner) };
    let faces = inner.unpacker.texture_info().faces as usize;
    let pointers = unsafe { slice::from_raw_parts(dst as *const *mut c_void, faces) };
    if pointers.iter().any(|face| face.is_null()) {
        return CrndErrorCode::NullOutputPointer;
    }

    let mut buffers: Vec<&mut [u8]> = pointers
        .iter()
        .map(|&face| unsafe { slice::from_raw_parts_mut(face as *mut u8, dst_size as usize) })
        .collect();
    inner
        .unpacker
        .unpack_level(&mut buffers, row_pitch, level_index)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crn_decompress::CrnFormat;
    use crn_decompress::test_prelude::CrnBuilder;

    fn begin(data: &[u8]) -> *mut c_void {
        unsafe { crnd_unpack_begin(data.as_ptr() as *const c_void, data.len() as u32) }
    }

    #[test]
    fn begin_rejects_malformed_data() {
        let data = CrnBuilder::solid(CrnFormat::Dxt1, 8, 8).build();
        assert!(begin(&data[..data.len() - 1]).is_null());
        assert!(begin(&[0u8; 128]).is_null());
        assert!(unsafe { crnd_unpack_begin(ptr::null(), 100) }.is_null());
    }

    #[test]
    fn unpacks_every_face() {
        let builder = CrnBuilder::patterned(CrnFormat::Dxt5, 12, 12, 77).with_faces(6);
        let data = builder.build();
        let context = begin(&data);
        assert!(!context.is_null());

        let expected = builder.expected_level(0);
        let mut faces = vec![vec![0u8; expected[0].len()]; 6];
        let mut pointers: Vec<*mut c_void> =
            faces.iter_mut().map(|f| f.as_mut_ptr() as *mut c_void).collect();
        assert!(unsafe {
            crnd_unpack_level(context, pointers.as_mut_ptr(), expected[0].len() as u32, 0, 0)
        });
        assert_eq!(faces, expected);
        assert!(unsafe { crnd_unpack_end(context) });
    }

    #[test]
    fn small_destination_fails() {
        let data = CrnBuilder::solid(CrnFormat::Dxt1, 8, 8).build();
        let context = begin(&data);
        let mut face = vec![0u8; 31];
        let mut pointers = [face.as_mut_ptr() as *mut c_void];
        assert_eq!(
            unsafe { crnd_unpack_level_with_error(context, pointers.as_mut_ptr(), 31, 0, 0) },
            CrndErrorCode::DestinationTooSmall
        );
        assert!(unsafe { crnd_unpack_end(context) });
    }

    #[test]
    fn level_index_out_of_range_fails() {
        let data = CrnBuilder::solid(CrnFormat::Dxt1, 8, 8).with_mip_levels(2).build();
        let context = begin(&data);
        let mut face = vec![0u8; 32];
        let mut pointers = [face.as_mut_ptr() as *mut c_void];
        assert_eq!(
            unsafe { crnd_unpack_level_with_error(context, pointers.as_mut_ptr(), 32, 0, 2) },
            CrndErrorCode::InvalidLevelIndex
        );
        assert!(unsafe { crnd_unpack_level(context, pointers.as_mut_ptr(), 32, 0, 1) });
        assert!(unsafe { crnd_unpack_end(context) });
    }

    #[test]
    fn end_succeeds_exactly_once() {
        let data = CrnBuilder::solid(CrnFormat::Dxt5A, 4, 4).build();
        let context = begin(&data);
        assert!(unsafe { crnd_unpack_end(context) });
        assert!(!unsafe { crnd_unpack_end(context) });
        assert!(!unsafe { crnd_unpack_end(ptr::null_mut()) });

        let mut face = [0u8; 8];
        let mut pointers = [face.as_mut_ptr() as *mut c_void];
        assert_eq!(
            unsafe { crnd_unpack_level_with_error(context, pointers.as_mut_ptr(), 8, 0, 0) },
            CrndErrorCode::InvalidContext
        );
    }

    #[test]
    fn context_at_reused_address_belongs_to_new_owner() {
        let first = CrnBuilder::solid(CrnFormat::Dxt5A, 4, 4).build();
        let mut second = CrnBuilder::solid(CrnFormat::Dxt5A, 4, 4);
        second.alpha_endpoints = vec![(0x40, 0x40)];
        let second = second.build();
        let old = begin(&first);
        assert!(unsafe { crnd_unpack_end(old) });

        let context = begin(&second);
        let mut face = [0u8; 8];
        let mut pointers = [face.as_mut_ptr() as *mut c_void];
        assert!(unsafe { crnd_unpack_level(context, pointers.as_mut_ptr(), 8, 0, 0) });
        assert_eq!(face[0], 0x40);

        // Ending through the stale pointer only succeeds when it aliases the new context.
        let aliased = old == context;
        assert_eq!(unsafe { crnd_unpack_end(old) }, aliased);
        assert_eq!(unsafe { crnd_unpack_end(context) }, !aliased);
    }

    #[test]
    fn independent_contexts_run_concurrently() {
        let files: Vec<_> = (0..4)
            .map(|seed| CrnBuilder::patterned(CrnFormat::DxnYX, 32, 16, seed))
            .collect();

        std::thread::scope(|scope| {
            for builder in &files {
                scope.spawn(move || {
                    let data = builder.build();
                    let context = begin(&data);
                    let expected = builder.expected_level(0);
                    let mut face = vec![0u8; expected[0].len()];
                    let mut pointers = [face.as_mut_ptr() as *mut c_void];
                    assert!(unsafe {
                        crnd_unpack_level(context, pointers.as_mut_ptr(), face.len() as u32, 0, 0)
                    });
                    assert_eq!(face, expected[0]);
                    assert!(unsafe { crnd_unpack_end(context) });
                });
            }
        });
    }
}
