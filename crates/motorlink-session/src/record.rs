//! Fixed-size records exchanged in steady state.
//!
//! The layout of status and command registers belongs to the firmware; this
//! crate only needs to know how many bytes a record occupies and how to move
//! it in and out of a buffer.

/// A record with a fixed on-wire size.
pub trait WireRecord: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Write the record into `dst`, which is exactly [`Self::SIZE`] bytes.
    fn encode_into(&self, dst: &mut [u8]);

    /// Read a record from `src`, which is exactly [`Self::SIZE`] bytes.
    fn decode(src: &[u8]) -> Self;
}

/// An uninterpreted record of `N` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawRecord<const N: usize>(pub [u8; N]);

impl<const N: usize> RawRecord<N> {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> Default for RawRecord<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> From<[u8; N]> for RawRecord<N> {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes)
    }
}

impl<const N: usize> WireRecord for RawRecord<N> {
    const SIZE: usize = N;

    fn encode_into(&self, dst: &mut [u8]) {
        dst.copy_from_slice(&self.0);
    }

    fn decode(src: &[u8]) -> Self {
        let mut bytes = [0; N];
        bytes.copy_from_slice(src);
        Self(bytes)
    }
}
