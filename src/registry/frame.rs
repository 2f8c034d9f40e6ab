//! Universe identifiers and DMX frame buffers
//!
//! This module defines the key type for identifying universes and the
//! fixed-capacity frame buffer each universe owns.

use bytes::Bytes;

/// Number of channels in a DMX512 universe
pub const DMX_UNIVERSE_SIZE: usize = 512;

/// Unique identifier for a universe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UniverseId(pub u32);

impl std::fmt::Display for UniverseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for UniverseId {
    fn from(id: u32) -> Self {
        UniverseId(id)
    }
}

/// A DMX512 frame: up to 512 channel values
///
/// Storage is always the full 512 bytes; `len` marks how many of them are
/// meaningful. Writes past `DMX_UNIVERSE_SIZE` are silently clamped.
#[derive(Clone, PartialEq, Eq)]
pub struct DmxFrame {
    data: [u8; DMX_UNIVERSE_SIZE],
    len: usize,
}

impl DmxFrame {
    /// Create an empty frame (length 0)
    pub fn new() -> Self {
        Self {
            data: [0; DMX_UNIVERSE_SIZE],
            len: 0,
        }
    }

    /// Create a full-length frame with every channel at zero
    pub fn blackout() -> Self {
        Self {
            data: [0; DMX_UNIVERSE_SIZE],
            len: DMX_UNIVERSE_SIZE,
        }
    }

    /// Create a frame from a slice, clamped to 512 channels
    pub fn from_slice(data: &[u8]) -> Self {
        let mut frame = Self::new();
        frame.set(data);
        frame
    }

    /// Number of meaningful channels
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the frame carries no channels
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The meaningful channels
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Replace the frame contents, returning the number of channels kept
    pub fn set(&mut self, data: &[u8]) -> usize {
        let len = data.len().min(DMX_UNIVERSE_SIZE);
        self.data[..len].copy_from_slice(&data[..len]);
        self.len = len;
        len
    }

    /// Copy the frame into `out`, returning the number of bytes written
    pub fn copy_to(&self, out: &mut [u8]) -> usize {
        let len = out.len().min(self.len);
        out[..len].copy_from_slice(&self.data[..len]);
        len
    }

    /// Refill the frame from a reader that writes into the raw buffer
    ///
    /// The reader returns how many bytes it produced; the value is clamped to
    /// the buffer size.
    pub fn fill_with<F>(&mut self, reader: F) -> usize
    where
        F: FnOnce(&mut [u8]) -> usize,
    {
        let len = reader(&mut self.data[..]).min(DMX_UNIVERSE_SIZE);
        self.len = len;
        len
    }

    /// Combine `other` into this frame using highest-takes-priority
    ///
    /// Overlapping channels keep the larger value. If `other` is longer, its
    /// tail is appended verbatim and the frame grows to its length.
    pub fn merge_highest(&mut self, other: &[u8]) {
        let other = &other[..other.len().min(DMX_UNIVERSE_SIZE)];
        let overlap = self.len.min(other.len());

        for (ours, theirs) in self.data[..overlap].iter_mut().zip(&other[..overlap]) {
            *ours = (*ours).max(*theirs);
        }

        if other.len() > self.len {
            self.data[self.len..other.len()].copy_from_slice(&other[self.len..]);
            self.len = other.len();
        }
    }

    /// Copy the meaningful channels into a reference-counted buffer
    ///
    /// The returned `Bytes` is cheap to clone, so one copy can be shared by
    /// every outbound message of a fan-out.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_slice())
    }
}

impl Default for DmxFrame {
    fn default() -> Self {
        Self::blackout()
    }
}

impl std::fmt::Debug for DmxFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DmxFrame")
            .field("len", &self.len)
            .field("data", &self.as_slice())
            .finish()
    }
}
