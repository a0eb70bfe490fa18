//! Word-file loading and framing of back-to-back hit records.

use byteorder::{ByteOrder, LittleEndian};
use ddas_core::{DecodeError, DecodeWarning, HitRecord, HitUnpacker};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Errors from loading a word file.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file size {0} bytes is not a whole number of 32-bit words")]
    PartialWord(usize),
}

/// Converts little-endian bytes to 32-bit words.
pub fn words_from_bytes(bytes: &[u8]) -> Result<Vec<u32>, ReadError> {
    if bytes.len() % 4 != 0 {
        return Err(ReadError::PartialWord(bytes.len()));
    }
    let mut words = vec![0u32; bytes.len() / 4];
    LittleEndian::read_u32_into(bytes, &mut words);
    Ok(words)
}

/// Reads a whole file of little-endian 32-bit words.
pub fn read_words<P: AsRef<Path>>(path: P) -> Result<Vec<u32>, ReadError> {
    let bytes = fs::read(path.as_ref())?;
    words_from_bytes(&bytes)
}

/// One item from a [`HitStream`].
#[derive(Debug)]
pub enum StreamItem {
    Hit {
        offset: usize,
        hit: HitRecord,
        warning: Option<DecodeWarning>,
    },
    Skipped {
        offset: usize,
        error: DecodeError,
    },
}

/// Splits a word buffer into consecutive hit records.
///
/// Stops at the first bad record unless `skip_bad` is set, in which case it
/// moves forward one word and tries again.
pub struct HitStream<'a> {
    words: &'a [u32],
    offset: usize,
    skip_bad: bool,
    done: bool,
    unpacker: HitUnpacker,
}

impl<'a> HitStream<'a> {
    pub fn new(words: &'a [u32], skip_bad: bool) -> Self {
        Self {
            words,
            offset: 0,
            skip_bad,
            done: false,
            unpacker: HitUnpacker::new(),
        }
    }

    /// Word offset of the next record.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for HitStream<'_> {
    type Item = StreamItem;

    fn next(&mut self) -> Option<StreamItem> {
        if self.done || self.offset >= self.words.len() {
            return None;
        }

        let offset = self.offset;
        match self.unpacker.unpack(&self.words[offset..]) {
            Ok(unpacked) => {
                self.offset += unpacked.consumed;
                if let Some(warning) = &unpacked.warning {
                    warn!(offset, %warning, "decoded with fallback rules");
                }
                Some(StreamItem::Hit {
                    offset,
                    hit: unpacked.hit,
                    warning: unpacked.warning,
                })
            }
            Err(error) => {
                warn!(offset, %error, "bad hit record");
                if self.skip_bad {
                    self.offset += 1;
                } else {
                    self.done = true;
                }
                Some(StreamItem::Skipped { offset, error })
            }
        }
    }
}
