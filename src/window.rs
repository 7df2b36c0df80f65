//! Windowed mapping over a container file.
//!
//! A container may be far larger than the ~2 GiB a single mapping is allowed
//! to cover, so the container is addressed through one bounded window at a
//! time. The manager guarantees that a requested frame range is always wholly
//! inside the active window, remapping when it is not.
//!
//! When a remap is needed the new window starts at the requested frame and
//! extends forward as far as the cap and the container allow. Sequential
//! forward access — the access pattern these probes model — therefore walks a
//! tiling of the container and pays exactly one remap per window-sized span.
//! This is a placement rule, not a cache: reverse or random access simply
//! pays one remap per miss.

use std::fs::File;
use std::io;
use std::time::Instant;

use log::debug;
use memmap2::{Mmap, MmapMut, MmapOptions};

use crate::constants::MAX_WINDOW_BYTES;
use crate::error::{BenchError, Result};

/// The single live mapping, in whichever mode the run needs.
#[derive(Debug)]
enum ActiveMap {
    ReadOnly(Mmap),
    ReadWrite(MmapMut),
}

impl ActiveMap {
    fn len(&self) -> usize {
        match self {
            ActiveMap::ReadOnly(m) => m.len(),
            ActiveMap::ReadWrite(m) => m.len(),
        }
    }
}

/// Cumulative remap accounting, reset at the start of each timed phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemapStats {
    /// Number of windows created.
    pub remaps: u32,
    /// Total nanoseconds spent creating windows.
    pub remap_ns: u64,
}

/// Owns the at-most-one active mapping window over a container.
///
/// The previous window is always released before its replacement is created;
/// two live windows over the same file would double-count dirty pages.
#[derive(Debug)]
pub struct WindowedMapping<'f> {
    file: &'f File,
    container_bytes: u64,
    max_window: u64,
    writable: bool,
    window_start: u64,
    window: Option<ActiveMap>,
    stats: RemapStats,
}

impl<'f> WindowedMapping<'f> {
    /// Manager over `container_bytes` of `file` with the standard window cap.
    pub fn new(file: &'f File, container_bytes: u64, writable: bool) -> Self {
        Self::with_max_window(file, container_bytes, writable, MAX_WINDOW_BYTES)
    }

    /// Manager with an explicit window cap. Production code uses
    /// [`WindowedMapping::new`]; the override exists so remap behavior can be
    /// exercised with kilobyte-sized files.
    pub fn with_max_window(
        file: &'f File,
        container_bytes: u64,
        writable: bool,
        max_window: u64,
    ) -> Self {
        assert!(max_window > 0, "window cap must be > 0");
        Self {
            file,
            container_bytes,
            max_window,
            writable,
            window_start: 0,
            window: None,
            stats: RemapStats::default(),
        }
    }

    /// Ensure `[offset, offset + len)` is covered by the active window and
    /// return the position of `offset` within it.
    ///
    /// Remaps when no window is active, when `offset` precedes the window,
    /// or when the range runs past its end. `len` must fit a single window —
    /// a startup invariant of every valid configuration, so it is only
    /// debug-asserted here.
    pub fn ensure_window(&mut self, offset: u64, len: u64) -> Result<usize> {
        debug_assert!(len <= self.max_window);

        let end = match offset.checked_add(len) {
            Some(end) if end <= self.container_bytes => end,
            _ => {
                return Err(BenchError::OutOfRange {
                    offset,
                    len,
                    container_bytes: self.container_bytes,
                })
            }
        };

        let needs_remap = match &self.window {
            None => true,
            Some(w) => offset < self.window_start || end > self.window_start + w.len() as u64,
        };
        if needs_remap {
            self.remap(offset)?;
        }

        Ok((offset - self.window_start) as usize)
    }

    fn remap(&mut self, offset: u64) -> Result<()> {
        let new_start = offset;
        let new_len = self.max_window.min(self.container_bytes - new_start) as usize;

        // Release before replace: at most one live window per file.
        self.window = None;

        let t0 = Instant::now();
        let map = if self.writable {
            // SAFETY: the file outlives the mapping (borrowed for 'f) and the
            // harness is the only accessor of the container while it is open.
            let m = unsafe {
                MmapOptions::new()
                    .offset(new_start)
                    .len(new_len)
                    .map_mut(self.file)?
            };
            ActiveMap::ReadWrite(m)
        } else {
            // SAFETY: as above.
            let m = unsafe {
                MmapOptions::new()
                    .offset(new_start)
                    .len(new_len)
                    .map(self.file)?
            };
            ActiveMap::ReadOnly(m)
        };
        self.stats.remap_ns += t0.elapsed().as_nanos() as u64;
        self.stats.remaps += 1;

        self.window_start = new_start;
        self.window = Some(map);
        debug!(
            "window remapped to [{new_start}, {})",
            new_start + new_len as u64
        );
        Ok(())
    }

    /// Borrow `len` bytes of the active window starting at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if no window is active; call [`WindowedMapping::ensure_window`]
    /// first.
    pub fn slice(&self, pos: usize, len: usize) -> &[u8] {
        match &self.window {
            Some(ActiveMap::ReadOnly(m)) => &m[pos..pos + len],
            Some(ActiveMap::ReadWrite(m)) => &m[pos..pos + len],
            None => panic!("no active window; call ensure_window first"),
        }
    }

    /// Mutably borrow `len` bytes of the active window starting at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if no window is active or the manager was opened read-only.
    pub fn slice_mut(&mut self, pos: usize, len: usize) -> &mut [u8] {
        match &mut self.window {
            Some(ActiveMap::ReadWrite(m)) => &mut m[pos..pos + len],
            Some(ActiveMap::ReadOnly(_)) => panic!("write access through a read-only window"),
            None => panic!("no active window; call ensure_window first"),
        }
    }

    /// Synchronously flush the active window's dirty pages, if any.
    ///
    /// A no-op for read-only managers and when no window is mapped. Callers
    /// in the drain path log and swallow the error; nothing else calls this.
    pub fn flush_active(&self) -> io::Result<()> {
        match &self.window {
            Some(ActiveMap::ReadWrite(m)) => m.flush(),
            _ => Ok(()),
        }
    }

    /// Byte range of the active window, if one is mapped.
    pub fn window_range(&self) -> Option<(u64, u64)> {
        self.window
            .as_ref()
            .map(|w| (self.window_start, self.window_start + w.len() as u64))
    }

    /// Remap accounting since construction or the last reset.
    pub fn stats(&self) -> RemapStats {
        self.stats
    }

    /// Zero the remap counters at the start of a timed phase.
    pub fn reset_stats(&mut self) {
        self.stats = RemapStats::default();
    }

    /// Container size this manager addresses.
    pub fn container_bytes(&self) -> u64 {
        self.container_bytes
    }
}
