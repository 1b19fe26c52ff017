//! MD5 content digests.

use md5::{Digest, Md5};

/// Length of a hex-encoded MD5 digest.
pub const MD5_HEX_LEN: usize = 32;

/// Incremental MD5 over a body that arrives in chunks.
#[derive(Default)]
pub(crate) struct ContentDigest {
    hasher: Md5,
    bytes: u64,
}

impl ContentDigest {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.bytes += chunk.len() as u64;
    }

    /// Number of bytes hashed so far.
    pub(crate) fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Lowercase hex digest.
    pub(crate) fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// Compute the MD5 of `data` and return it as lowercase hex.
pub fn md5_hex(data: &[u8]) -> String {
    let mut digest = ContentDigest::new();
    digest.update(data);
    digest.finish()
}
