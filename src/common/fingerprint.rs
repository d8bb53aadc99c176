//! Deterministic fingerprints used to correlate a request across log lines.

/// 64-bit FNV-1a hash state.
#[derive(Copy, Clone, Debug)]
pub struct Fingerprint(u64);

const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const PRIME: u64 = 0x0000_0100_0000_01b3;

impl Fingerprint {
    /// Start from the FNV-1a offset basis.
    pub fn new() -> Self {
        Self(OFFSET_BASIS)
    }

    /// Feed raw bytes.
    pub fn update(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = (self.0 ^ u64::from(*b)).wrapping_mul(PRIME);
        }
    }

    /// Feed a length-prefixed field so `("ab", "c")` and `("a", "bc")` differ.
    pub fn update_field(&mut self, bytes: &[u8]) {
        self.update(&(bytes.len() as u64).to_le_bytes());
        self.update(bytes);
    }

    /// Current 64-bit digest.
    pub fn finish(&self) -> u64 {
        self.0
    }

    /// 16-character lowercase hex rendering for log fields.
    pub fn finish_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::new()
    }
}
