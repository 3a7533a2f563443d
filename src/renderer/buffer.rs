use gfx_hal::{buffer, prelude::*, Backend, Limits};
use std::mem::{self, ManuallyDrop};
use std::ptr;

use crate::error::InitError;

/// Vertex buffer handle plus the host data it will be filled with.
pub struct Buffer<'a, B: Backend, T> {
    pub device: &'a B::Device,
    pub buf: ManuallyDrop<B::Buffer>,
    pub content: &'a [T],
    pub len: u64,
}

impl<'a, B: Backend, T> Buffer<'a, B, T> {
    pub fn new(
        device: &'a B::Device,
        content: &'a [T],
        limits: &Limits,
    ) -> Result<Self, InitError> {
        let buffer_len = content.len() as u64 * mem::size_of::<T>() as u64;
        if buffer_len == 0 {
            return Err(InitError::resource("vertex buffer", "empty vertex data"));
        }
        let memory_size = padded_size(buffer_len, limits.non_coherent_atom_size as u64);

        let buf = unsafe { device.create_buffer(memory_size, buffer::Usage::VERTEX) }
            .map_err(|err| InitError::resource("vertex buffer", err))?;
        log::debug!("created vertex buffer ({} bytes)", memory_size);

        Ok(Buffer {
            device,
            buf: ManuallyDrop::new(buf),
            content,
            len: buffer_len,
        })
    }
}

/// Rounds `len` up to a whole number of non-coherent atoms so the flush
/// after upload covers the entire range.
fn padded_size(len: u64, atom: u64) -> u64 {
    let atom = atom.max(1);
    ((len + atom - 1) / atom) * atom
}

impl<'a, B: Backend, T> Drop for Buffer<'a, B, T> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_buffer(ManuallyDrop::into_inner(ptr::read(&self.buf)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::padded_size;

    #[test]
    fn triangle_fits_in_one_atom() {
        assert_eq!(padded_size(36, 64), 64);
        assert_eq!(padded_size(36, 256), 256);
    }

    #[test]
    fn aligned_sizes_are_unchanged() {
        assert_eq!(padded_size(128, 64), 128);
        assert_eq!(padded_size(36, 1), 36);
    }

    #[test]
    fn zero_atom_is_treated_as_byte_granular() {
        assert_eq!(padded_size(36, 0), 36);
    }
}
