//! Memory-mapped accelerator registers
//!
//! The PIO ports sit behind a bus bridge at a fixed physical address. The
//! window is reached through a device file (`/dev/mem`, or a UIO node
//! exported for the bridge) and mapped shared, read-write, with `O_SYNC` so
//! the kernel maps it uncached.
//!
//! Unsafe code is confined to the mapping, the two volatile accessors, and
//! the unmapping in `Drop`.

use crate::backend::{BackendType, RegisterBus};
use crate::config::AcceleratorConfig;
use crate::error::{Result, SsdError};
use rustix::fd::OwnedFd;
use rustix::fs::{Mode, OFlags};
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use ssd_chip::{regs, Register};
use std::path::Path;
use std::ptr::NonNull;

/// Mapped physical window
#[derive(Debug)]
pub struct MmioWindow {
    /// Start of the page-aligned mapping
    map_ptr: NonNull<u8>,
    /// Length of the page-aligned mapping
    map_len: usize,
    /// Distance from `map_ptr` to the requested base
    delta: usize,
    /// Bytes usable from the requested base
    span: usize,
    _fd: OwnedFd,
    base: u64,
}

impl MmioWindow {
    /// Map `span` bytes at physical `base` through `device`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The device file cannot be opened (missing, or not root)
    /// - `span` is zero
    /// - mmap fails
    pub fn open(device: &Path, base: u64, span: usize) -> Result<Self> {
        if span == 0 {
            return Err(SsdError::register_access("window span is 0"));
        }

        tracing::debug!("Mapping {span:#x} bytes at {base:#x} via {}", device.display());

        let fd = rustix::fs::open(
            device,
            OFlags::RDWR | OFlags::SYNC | OFlags::CLOEXEC,
            Mode::empty(),
        )
        .map_err(|e| {
            SsdError::register_access(format!(
                "Cannot open {}: {e}. Is the bridge enabled and are you root?",
                device.display()
            ))
        })?;

        let page = rustix::param::page_size() as u64;
        let aligned = base & !(page - 1);
        let delta = usize::try_from(base - aligned)
            .map_err(|_| SsdError::register_access("page offset does not fit usize"))?;
        let map_len = delta + span;

        // SAFETY: mmap of a device window.
        // - fd was just opened read-write and is kept alive in the struct
        // - map_len is non-zero (span > 0)
        // - offset is page-aligned (masked above)
        // - MAP_SHARED so writes reach the device, not a private copy
        // - rustix returns Err on failure; unmapped in Drop
        let addr = unsafe {
            mmap(
                std::ptr::null_mut(),
                map_len,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                &fd,
                aligned,
            )
        }
        .map_err(|e| SsdError::register_access(format!("mmap at {aligned:#x} failed: {e}")))?;

        let map_ptr = NonNull::new(addr.cast::<u8>())
            .ok_or_else(|| SsdError::register_access("mmap returned a null mapping"))?;

        tracing::info!(
            "Mapped accelerator window {base:#x}..{:#x} at {map_ptr:p}",
            base + span as u64
        );

        Ok(Self {
            map_ptr,
            map_len,
            delta,
            span,
            _fd: fd,
            base,
        })
    }

    fn register_ptr(&self, offset: usize) -> Result<*mut u32> {
        if offset % regs::REGISTER_WIDTH != 0 || offset + regs::REGISTER_WIDTH > self.span {
            return Err(SsdError::register_access(format!(
                "Register offset {offset:#x} invalid for {:#x}-byte window",
                self.span
            )));
        }
        // SAFETY: delta + offset + 4 <= map_len (checked above), so the
        // pointer stays inside the mapping.
        #[allow(clippy::cast_ptr_alignment)]
        let ptr = unsafe { self.map_ptr.as_ptr().add(self.delta + offset).cast::<u32>() };
        Ok(ptr)
    }

    /// Volatile 32-bit read at `offset` from the base.
    ///
    /// # Errors
    ///
    /// Returns error if `offset` is unaligned or outside the window.
    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        let ptr = self.register_ptr(offset)?;
        // SAFETY: Volatile read from a mapped device register.
        // - ptr is in bounds and 4-byte aligned (register_ptr; page-aligned map)
        // - volatile: the device changes STATUS/RESULT_OUT behind our back
        let value = unsafe { ptr.read_volatile() };
        tracing::trace!("Read u32 @ {offset:#x} = {value:#x}");
        Ok(value)
    }

    /// Volatile 32-bit write at `offset` from the base.
    ///
    /// # Errors
    ///
    /// Returns error if `offset` is unaligned or outside the window.
    pub fn write_u32(&mut self, offset: usize, value: u32) -> Result<()> {
        let ptr = self.register_ptr(offset)?;
        tracing::trace!("Write u32 @ {offset:#x} = {value:#x}");
        // SAFETY: Volatile write to a mapped device register.
        // - ptr is in bounds and 4-byte aligned (register_ptr; page-aligned map)
        // - volatile: every pulse write must reach the device, in order
        unsafe { ptr.write_volatile(value) };
        Ok(())
    }

    /// Usable bytes from the base.
    pub const fn span(&self) -> usize {
        self.span
    }
}

impl Drop for MmioWindow {
    fn drop(&mut self) {
        tracing::debug!("Unmapping accelerator window at {:#x}", self.base);

        // SAFETY: map_ptr/map_len are exactly what mmap returned/was given
        // in open(); Drop runs once, so the mapping is still live.
        unsafe {
            if let Err(e) = munmap(self.map_ptr.as_ptr().cast(), self.map_len) {
                tracing::error!("munmap failed during drop: {e}");
            }
        }
    }
}

// SAFETY: MmioWindow owns its mapping exclusively; moving it to another
// thread does not invalidate the mapping. Not Sync: the handshake must not
// be driven from two threads.
unsafe impl Send for MmioWindow {}

/// Accelerator register block over an [`MmioWindow`].
#[derive(Debug)]
pub struct MmioBus {
    window: MmioWindow,
    offsets: [usize; 4],
}

impl MmioBus {
    /// Map the register block described by `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the window cannot be mapped or a port offset falls
    /// outside it.
    pub fn open(config: &AcceleratorConfig) -> Result<Self> {
        let window = MmioWindow::open(config.device_path(), config.base, config.span)?;
        let offsets = Register::ALL.map(|reg| config.offset(reg));
        for (reg, &offset) in Register::ALL.iter().zip(&offsets) {
            window.register_ptr(offset).map_err(|_| {
                SsdError::register_access(format!("{reg} at {offset:#x} is outside the window"))
            })?;
        }
        Ok(Self { window, offsets })
    }

    const fn offset(&self, reg: Register) -> usize {
        match reg {
            Register::Control => self.offsets[0],
            Register::DataIn => self.offsets[1],
            Register::Status => self.offsets[2],
            Register::ResultOut => self.offsets[3],
        }
    }

    /// Underlying window.
    pub const fn window(&self) -> &MmioWindow {
        &self.window
    }
}

impl RegisterBus for MmioBus {
    fn read32(&mut self, reg: Register) -> Result<u32> {
        self.window.read_u32(self.offset(reg))
    }

    fn write32(&mut self, reg: Register, value: u32) -> Result<()> {
        self.window.write_u32(self.offset(reg), value)
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Mmio
    }
}
