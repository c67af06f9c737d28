//! Versioned bytecode hashing.
//!
//! Contracts on the network are referenced by a versioned hash of their bytecode rather than by
//! the plain keccak256 hash. The layout of the 32-byte hash is:
//!
//! ```text
//! [0]     version byte (always 1)
//! [1]     zero
//! [2..4]  bytecode length in 32-byte words, big endian
//! [4..32] the last 28 bytes of sha256(bytecode)
//! ```
//!
//! The hash is used for the dependency list of a transaction (`factoryDeps`) and for the proxy
//! code hash that enters the deterministic address formula.

use alloy_primitives::B256;
use sha2::{Digest, Sha256};

/// The size of a bytecode word.
pub const BYTECODE_WORD_SIZE: usize = 32;

/// The maximum number of words a bytecode may have; the length must fit in two bytes.
pub const MAX_BYTECODE_WORDS: usize = (1 << 16) - 1;

/// The version byte of the bytecode hash.
pub const BYTECODE_HASH_VERSION: u8 = 1;

/// Errors raised when a bytecode cannot be hashed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BytecodeError {
    /// The bytecode length is not a multiple of the word size.
    #[error("bytecode length {0} is not a multiple of {BYTECODE_WORD_SIZE}")]
    NotWordAligned(usize),
    /// The bytecode has an even number of words.
    #[error("bytecode has an even number of words ({0})")]
    EvenWordCount(usize),
    /// The bytecode is too long to be referenced.
    #[error("bytecode has {0} words, more than the maximum of {MAX_BYTECODE_WORDS}")]
    TooLong(usize),
}

/// Computes the versioned hash of a bytecode.
pub fn hash_bytecode(bytecode: &[u8]) -> Result<B256, BytecodeError> {
    if bytecode.len() % BYTECODE_WORD_SIZE != 0 {
        return Err(BytecodeError::NotWordAligned(bytecode.len()));
    }

    let words = bytecode.len() / BYTECODE_WORD_SIZE;
    if words > MAX_BYTECODE_WORDS {
        return Err(BytecodeError::TooLong(words));
    }
    if words % 2 == 0 {
        return Err(BytecodeError::EvenWordCount(words));
    }

    let mut hash: [u8; 32] = Sha256::digest(bytecode).into();
    hash[0] = BYTECODE_HASH_VERSION;
    hash[1] = 0;
    hash[2..4].copy_from_slice(&(words as u16).to_be_bytes());
    Ok(B256::from(hash))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::b256;

    use super::*;

    #[test]
    fn test_hash_layout() {
        let bytecode = [0x42u8; 3 * BYTECODE_WORD_SIZE];
        let hash = hash_bytecode(&bytecode).unwrap();

        assert_eq!(hash[0], BYTECODE_HASH_VERSION);
        assert_eq!(hash[1], 0);
        assert_eq!(&hash[2..4], &[0, 3]);

        let sha: [u8; 32] = Sha256::digest(bytecode).into();
        assert_eq!(&hash[4..], &sha[4..]);
    }

    #[test]
    fn test_known_answers() {
        assert_eq!(
            hash_bytecode(&[0x11; BYTECODE_WORD_SIZE]).unwrap(),
            b256!("010000011fbb267c8f352e9968a79e3e5fc95c1bbeaa502fd6454ebde5a4bedc")
        );
        assert_eq!(
            hash_bytecode(&[0x5a; 5 * BYTECODE_WORD_SIZE]).unwrap(),
            b256!("01000005111ac39e59dd681f6553206464de050b8bb236558dd1161f384c2b45")
        );
    }

    #[test]
    fn test_rejects_unaligned_bytecode() {
        assert_eq!(hash_bytecode(&[0u8; 33]), Err(BytecodeError::NotWordAligned(33)));
    }

    #[test]
    fn test_rejects_even_word_count() {
        assert_eq!(hash_bytecode(&[0u8; 64]), Err(BytecodeError::EvenWordCount(2)));
        assert_eq!(hash_bytecode(&[]), Err(BytecodeError::EvenWordCount(0)));
    }

    #[test]
    fn test_rejects_oversized_bytecode() {
        let bytecode = vec![0u8; (MAX_BYTECODE_WORDS + 2) * BYTECODE_WORD_SIZE];
        assert_eq!(hash_bytecode(&bytecode), Err(BytecodeError::TooLong(MAX_BYTECODE_WORDS + 2)));
    }
}
