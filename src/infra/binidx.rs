// ============================================================
// Layer 6 — binidx Dataset Metadata
// ============================================================
// Reads just enough of a binidx dataset to count its tokens.
//
// <prefix>.idx layout (little endian):
//
//   offset  size  field
//   0       9     magic  b"MMIDIDX\0\0"
//   9       8     version (u64, must be 1)
//   17      1     dtype code (u8)
//   18      8     sequence count (u64)
//   26      8     document count (u64)
//   34      4*N   sequence sizes (i32)
//   ...           pointers (i64), document index (i64)
//
// <prefix>.bin is the raw token stream. When it exists the
// trainer sizes the dataset as bin_len / element_size, so we
// do the same; otherwise the sum of sequence sizes is used.
//
// Reference: thiserror crate documentation

use std::{
    fs::File,
    io::{BufReader, Read},
    path::PathBuf,
};

use thiserror::Error;

const HDR_MAGIC: &[u8; 9] = b"MMIDIDX\x00\x00";

#[derive(Debug, Error)]
pub enum BinIdxError {
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{}' is not a binidx index (bad magic)", .0.display())]
    BadMagic(PathBuf),
    #[error("unsupported binidx version {0}")]
    UnsupportedVersion(u64),
    #[error("unknown binidx dtype code {0}")]
    UnknownDtype(u8),
    #[error("negative sequence size {size} at index {index}")]
    NegativeSize { index: u64, size: i32 },
}

/// Element type of the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenDtype {
    U8,
    I8,
    I16,
    I32,
    I64,
    F64,
    U16,
}

impl TokenDtype {
    /// Map the header's dtype byte; unknown codes are an error.
    pub fn from_code(code: u8) -> Result<Self, BinIdxError> {
        Ok(match code {
            1 => TokenDtype::U8,
            2 => TokenDtype::I8,
            3 => TokenDtype::I16,
            4 => TokenDtype::I32,
            5 => TokenDtype::I64,
            6 | 7 => TokenDtype::F64,
            8 => TokenDtype::U16,
            other => return Err(BinIdxError::UnknownDtype(other)),
        })
    }

    pub fn size(self) -> u64 {
        match self {
            TokenDtype::U8 | TokenDtype::I8 => 1,
            TokenDtype::I16 | TokenDtype::U16 => 2,
            TokenDtype::I32 => 4,
            TokenDtype::I64 | TokenDtype::F64 => 8,
        }
    }
}

/// What the `.idx` header (and `.bin`, if present) says about a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct BinIdxSummary {
    pub dtype:        TokenDtype,
    pub sequences:    u64,
    pub documents:    u64,
    /// Sum of all sequence sizes in the index
    pub index_tokens: u64,
    /// `.bin` length divided by element size, when the file exists
    pub bin_tokens:   Option<u64>,
}

impl BinIdxSummary {
    /// Token count the trainer will see.
    pub fn data_tokens(&self) -> u64 {
        self.bin_tokens.unwrap_or(self.index_tokens)
    }
}

pub fn idx_path(prefix: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}.idx"))
}

pub fn bin_path(prefix: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}.bin"))
}

/// Whether `<prefix>.idx` exists.
pub fn exists(prefix: &str) -> bool {
    idx_path(prefix).is_file()
}

/// Read `<prefix>.idx` and stat `<prefix>.bin`.
pub fn read_summary(prefix: &str) -> Result<BinIdxSummary, BinIdxError> {
    let idx = idx_path(prefix);
    let io_err = |source| BinIdxError::Io { path: idx.clone(), source };

    let file = File::open(&idx).map_err(io_err)?;
    let mut r = BufReader::new(file);

    let mut magic = [0u8; 9];
    r.read_exact(&mut magic).map_err(io_err)?;
    if &magic != HDR_MAGIC {
        return Err(BinIdxError::BadMagic(idx.clone()));
    }

    let version = read_u64(&mut r).map_err(io_err)?;
    if version != 1 {
        return Err(BinIdxError::UnsupportedVersion(version));
    }

    let mut code = [0u8; 1];
    r.read_exact(&mut code).map_err(io_err)?;
    let dtype = TokenDtype::from_code(code[0])?;

    let sequences = read_u64(&mut r).map_err(io_err)?;
    let documents = read_u64(&mut r).map_err(io_err)?;

    let mut index_tokens = 0u64;
    let mut buf = [0u8; 4];
    for index in 0..sequences {
        r.read_exact(&mut buf).map_err(io_err)?;
        let size = i32::from_le_bytes(buf);
        if size < 0 {
            return Err(BinIdxError::NegativeSize { index, size });
        }
        index_tokens += size as u64;
    }

    let bin = bin_path(prefix);
    let bin_tokens = match std::fs::metadata(&bin) {
        Ok(meta) => Some(meta.len() / dtype.size()),
        Err(_) => None,
    };

    tracing::debug!(
        "binidx '{}': {:?}, {} sequences, {} documents, {} indexed tokens",
        prefix,
        dtype,
        sequences,
        documents,
        index_tokens,
    );

    Ok(BinIdxSummary { dtype, sequences, documents, index_tokens, bin_tokens })
}

fn read_u64(r: &mut impl Read) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}
