use gfx_hal::{adapter::MemoryType, memory as m, prelude::*, Backend, MemoryTypeId};
use std::iter;
use std::mem::ManuallyDrop;
use std::ptr;

use super::buffer::Buffer;
use crate::error::InitError;

/// Host-visible memory bound to a buffer and filled with its content once.
pub struct Memory<'a, B: Backend, T> {
    pub buffer: ManuallyDrop<Buffer<'a, B, T>>,
    memory: ManuallyDrop<B::Memory>,
}

impl<'a, B: Backend, T> Memory<'a, B, T> {
    pub fn new(
        mut buffer: Buffer<'a, B, T>,
        memory_types: &[MemoryType],
    ) -> Result<Self, InitError> {
        let memory = Self::upload(&mut buffer, memory_types)?;
        Ok(Memory {
            buffer: ManuallyDrop::new(buffer),
            memory: ManuallyDrop::new(memory),
        })
    }

    fn upload(
        buffer: &mut Buffer<'a, B, T>,
        memory_types: &[MemoryType],
    ) -> Result<B::Memory, InitError> {
        let device = buffer.device;
        unsafe {
            let buffer_req = device.get_buffer_requirements(&buffer.buf);
            let upload_type = upload_type(memory_types, &buffer_req).ok_or_else(|| {
                InitError::resource("vertex memory", "no CPU visible memory type")
            })?;
            let memory = device
                .allocate_memory(upload_type, buffer_req.size)
                .map_err(|err| InitError::resource("vertex memory", err))?;

            if let Err(err) = Self::fill(device, buffer, &memory) {
                device.free_memory(memory);
                return Err(err);
            }
            log::debug!("uploaded {} bytes of vertex data", buffer.len);
            Ok(memory)
        }
    }

    unsafe fn fill(
        device: &B::Device,
        buffer: &mut Buffer<'a, B, T>,
        memory: &B::Memory,
    ) -> Result<(), InitError> {
        device
            .bind_buffer_memory(memory, 0, &mut buffer.buf)
            .map_err(|err| InitError::resource("vertex memory binding", err))?;
        let mapping = device
            .map_memory(memory, m::Segment::ALL)
            .map_err(|err| InitError::resource("vertex memory mapping", err))?;
        ptr::copy_nonoverlapping(
            buffer.content.as_ptr() as *const u8,
            mapping,
            buffer.len as usize,
        );
        let flushed = device
            .flush_mapped_memory_ranges(iter::once((memory, m::Segment::ALL)))
            .map_err(|err| InitError::resource("vertex memory flush", err));
        device.unmap_memory(memory);
        flushed
    }
}

/// First memory type allowed by `buffer_req` that the host can write to.
fn upload_type(properties: &[MemoryType], buffer_req: &m::Requirements) -> Option<MemoryTypeId> {
    properties
        .iter()
        .enumerate()
        .position(|(id, mem_type)| {
            buffer_req.type_mask & (1 << id) != 0
                && mem_type.properties.contains(m::Properties::CPU_VISIBLE)
        })
        .map(MemoryTypeId::from)
}

impl<'a, B: Backend, T> Drop for Memory<'a, B, T> {
    fn drop(&mut self) {
        unsafe {
            let device = self.buffer.device;
            ManuallyDrop::drop(&mut self.buffer);
            device.free_memory(ManuallyDrop::into_inner(ptr::read(&self.memory)))
        }
    }
}
