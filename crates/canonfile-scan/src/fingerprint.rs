//! Whole-file and per-block content digests.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use sha2::{Digest, Sha256};

use canonfile_core::{ContentHash, DEFAULT_BLOCK_SIZE, HashAlgorithm, ScanError};

const STREAM_BUFFER: usize = 64 * 1024;

enum Hasher {
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finish(self) -> ContentHash {
        match self {
            Self::Sha256(h) => ContentHash::new(h.finalize().into()),
            Self::Blake3(h) => ContentHash::new(*h.finalize().as_bytes()),
        }
    }
}

/// Computes identity digests and block digest sequences.
#[derive(Debug, Clone, Copy)]
pub struct Fingerprinter {
    algorithm: HashAlgorithm,
    block_size: usize,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

impl Fingerprinter {
    /// Create a fingerprinter with the default 32 KiB block size.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Override the block size used by [`Fingerprinter::block_digests`].
    ///
    /// A block size of zero falls back to the default.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = if block_size == 0 {
            DEFAULT_BLOCK_SIZE
        } else {
            block_size
        };
        self
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Digest of an in-memory buffer.
    pub fn digest_bytes(&self, data: &[u8]) -> ContentHash {
        let mut hasher = Hasher::new(self.algorithm);
        hasher.update(data);
        hasher.finish()
    }

    /// Identity digest of the file at `path`.
    pub fn identity_digest(&self, path: &Path) -> Result<ContentHash, ScanError> {
        let mut file = File::open(path).map_err(|e| ScanError::io(path, e))?;
        self.identity_digest_of(&mut file)
            .map_err(|e| ScanError::io(path, e))
    }

    /// Identity digest of a whole stream.
    ///
    /// The reader is rewound first, so a handle that has already been
    /// partially read (for type sniffing, say) still digests every byte.
    pub fn identity_digest_of<R: Read + Seek>(&self, reader: &mut R) -> io::Result<ContentHash> {
        reader.seek(SeekFrom::Start(0))?;

        let mut hasher = Hasher::new(self.algorithm);
        let mut buffer = vec![0u8; STREAM_BUFFER];
        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..n]);
        }
        Ok(hasher.finish())
    }

    /// Block digest sequence of the file at `path`.
    pub fn block_digests(&self, path: &Path) -> Result<Vec<ContentHash>, ScanError> {
        let mut file = File::open(path).map_err(|e| ScanError::io(path, e))?;
        self.block_digests_of(&mut file)
            .map_err(|e| ScanError::io(path, e))
    }

    /// Block digest sequence of a stream.
    ///
    /// Every block is filled completely before it is hashed, so the result
    /// does not depend on how the reader splits its reads. The final block
    /// may be shorter; an empty stream yields an empty sequence.
    pub fn block_digests_of<R: Read>(&self, reader: &mut R) -> io::Result<Vec<ContentHash>> {
        let mut digests = Vec::new();
        let mut block = vec![0u8; self.block_size];
        loop {
            let filled = fill_block(reader, &mut block)?;
            if filled == 0 {
                break;
            }
            digests.push(self.digest_bytes(&block[..filled]));
            if filled < block.len() {
                break;
            }
        }
        Ok(digests)
    }
}

fn fill_block<R: Read>(reader: &mut R, block: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < block.len() {
        match reader.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
