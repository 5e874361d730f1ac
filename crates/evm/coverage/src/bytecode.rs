//! Maps program counters to operation indices over variable-length,
//! push-aware EVM bytecode, and strips the compiler's metadata tail.

use alloy_primitives::map::FxHashMap;
use revm::bytecode::opcode;
use tracing::trace;

use crate::error::{CoverageError, Result};

/// The fixed marker the Solidity compiler prefixes its metadata hash with.
/// See <https://docs.soliditylang.org/en/latest/metadata.html>.
const METADATA_MARKER: &str = "a165627a7a72305820";
/// Length in hex characters of the embedded metadata hash (32 bytes).
const METADATA_HASH_HEX_LEN: usize = 64;
/// The literal CBOR-length trailer that must follow the hash.
const METADATA_TRAILER: &str = "0029";

/// Sparse map from program counter (byte offset into runtime bytecode) to
/// operation index. Only addresses that are the first byte of an
/// instruction appear as keys.
pub type PcIndex = FxHashMap<u32, u32>;

/// Scans a contract's runtime bytecode: strips its metadata tail into a
/// stable fingerprint, and builds the [`PcIndex`] used to resolve a trace's
/// program counters into operation indices.
#[derive(Debug, Default, Clone, Copy)]
pub struct BytecodeScanner;

impl BytecodeScanner {
    /// Zeroes the compiler's metadata hash, if present, so the bytecode can
    /// be used as a stable fingerprint across builds that only differ in
    /// compilation-context metadata.
    ///
    /// Idempotent: `zero_metadata(zero_metadata(x)) == zero_metadata(x)`.
    pub fn zero_metadata(bytecode: &str) -> Result<String> {
        let hex = Self::strip_0x(bytecode)?;

        let Some(marker_start) = hex.find(METADATA_MARKER) else {
            return Ok(bytecode.to_string());
        };

        let hash_start = marker_start + METADATA_MARKER.len();
        let hash_end = hash_start + METADATA_HASH_HEX_LEN;
        let trailer_end = hash_end + METADATA_TRAILER.len();

        if hex.len() < trailer_end || &hex[hash_end..trailer_end] != METADATA_TRAILER {
            return Err(CoverageError::MalformedMetadata);
        }

        let mut zeroed = String::with_capacity(bytecode.len());
        zeroed.push_str("0x");
        zeroed.push_str(&hex[..hash_start]);
        zeroed.push_str(&"0".repeat(METADATA_HASH_HEX_LEN));
        zeroed.push_str(&hex[hash_end..]);
        Ok(zeroed)
    }

    /// Builds the pc-to-operation-index map for a contract's runtime
    /// bytecode, respecting PUSH immediates.
    pub fn pc_index(bytecode: &str) -> Result<PcIndex> {
        let hex = Self::strip_0x(bytecode)?;
        if hex.len() % 2 != 0 {
            return Err(CoverageError::MalformedBytecode);
        }

        let mut map = PcIndex::default();
        let mut op_index = 0u32;
        let mut push_remaining = 0u32;

        let bytes = hex.len() / 2;
        for i in 0..bytes {
            let byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| CoverageError::MalformedBytecode)?;

            if push_remaining > 0 {
                push_remaining -= 1;
                continue;
            }

            map.insert(i as u32, op_index);

            if (opcode::PUSH1..=opcode::PUSH32).contains(&byte) {
                push_remaining = u32::from(byte - (opcode::PUSH1 - 1));
            }

            op_index += 1;
        }

        trace!(ops = op_index, bytes, "built pc-to-operation-index map");
        Ok(map)
    }

    fn strip_0x(bytecode: &str) -> Result<&str> {
        bytecode.strip_prefix("0x").ok_or(CoverageError::BadBytecodePrefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_immediate_skipping() {
        // Two PUSH1s (one-byte immediates) followed by a POP.
        let pc_index = BytecodeScanner::pc_index("0x6001600250").unwrap();
        assert_eq!(pc_index.get(&0), Some(&0));
        assert_eq!(pc_index.get(&2), Some(&1));
        assert_eq!(pc_index.get(&4), Some(&2));
        assert_eq!(pc_index.len(), 3);
        // The immediate bytes themselves are not keys.
        assert!(!pc_index.contains_key(&1));
        assert!(!pc_index.contains_key(&3));
    }

    #[test]
    fn push32_skips_32_bytes() {
        let mut code = String::from("0x7f");
        code.push_str(&"ff".repeat(32));
        code.push_str("00"); // STOP
        let pc_index = BytecodeScanner::pc_index(&code).unwrap();
        assert_eq!(pc_index.get(&0), Some(&0));
        assert_eq!(pc_index.get(&33), Some(&1));
        assert_eq!(pc_index.len(), 2);
    }

    #[test]
    fn rejects_missing_0x_prefix() {
        assert!(matches!(
            BytecodeScanner::pc_index("600052"),
            Err(CoverageError::BadBytecodePrefix)
        ));
    }

    #[test]
    fn rejects_odd_length_hex() {
        assert!(matches!(
            BytecodeScanner::pc_index("0x600"),
            Err(CoverageError::MalformedBytecode)
        ));
    }

    #[test]
    fn metadata_stripping_zeroes_hash_in_place() {
        let hash = "11".repeat(32);
        let bytecode = format!("0x6000{}{}{}", "a165627a7a72305820", hash, "0029");
        let zeroed = BytecodeScanner::zero_metadata(&bytecode).unwrap();
        let expected =
            format!("0x6000{}{}{}", "a165627a7a72305820", "0".repeat(64), "0029");
        assert_eq!(zeroed, expected);
        assert_eq!(zeroed.len(), bytecode.len());
    }

    #[test]
    fn metadata_stripping_is_idempotent() {
        let hash = "ab".repeat(32);
        let bytecode = format!("0x6000{}{}{}", "a165627a7a72305820", hash, "0029");
        let once = BytecodeScanner::zero_metadata(&bytecode).unwrap();
        let twice = BytecodeScanner::zero_metadata(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn metadata_absent_is_unchanged() {
        let bytecode = "0x600052";
        assert_eq!(BytecodeScanner::zero_metadata(bytecode).unwrap(), bytecode);
    }

    #[test]
    fn malformed_trailer_is_an_error() {
        let hash = "11".repeat(32);
        let bytecode = format!("0x6000{}{}{}", "a165627a7a72305820", hash, "ffff");
        assert!(matches!(
            BytecodeScanner::zero_metadata(&bytecode),
            Err(CoverageError::MalformedMetadata)
        ));
    }
}
