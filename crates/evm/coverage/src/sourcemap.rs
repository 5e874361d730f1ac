//! Decompresses the compiler's semicolon-delimited, colon-separated,
//! value-omitting source map format into one [`SourceRange`] per operation.

use std::sync::Arc;

use crate::{
    error::{CoverageError, Result},
    range::{Jump, SourceRange},
};

/// Decodes a `srcmap-runtime` string into one [`SourceRange`] per operation,
/// in order.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceMapCodec;

impl SourceMapCodec {
    /// Decodes `raw` against `source_list` (the compiler's `sourceList`,
    /// indexed by the source map's `file_index` field).
    ///
    /// Element 0 inherits from an all-zero, no-file, no-jump range; every
    /// subsequent element inherits any field it leaves empty from the
    /// previously decoded element. This is decode-only: round-tripping back
    /// to the compressed format is not supported.
    pub fn decode(raw: &str, source_list: &[Arc<str>]) -> Result<Vec<SourceRange>> {
        let mut out = Vec::new();
        let mut prev = SourceRange::zero();

        for element in raw.split(';') {
            let mut current = prev.clone();
            for (field_index, field) in element.split(':').enumerate() {
                if field.is_empty() {
                    continue;
                }
                match field_index {
                    0 => {
                        current.byte_offset = field.parse().map_err(|_| {
                            CoverageError::InvalidSourceMap(format!(
                                "non-integer byte offset: {field:?}"
                            ))
                        })?;
                    }
                    1 => {
                        current.byte_length = field.parse().map_err(|_| {
                            CoverageError::InvalidSourceMap(format!(
                                "non-integer byte length: {field:?}"
                            ))
                        })?;
                    }
                    2 => {
                        let file_index: i64 = field.parse().map_err(|_| {
                            CoverageError::InvalidSourceMap(format!(
                                "non-integer file index: {field:?}"
                            ))
                        })?;
                        current.source_file = if file_index == -1 {
                            None
                        } else {
                            let idx = usize::try_from(file_index).map_err(|_| {
                                CoverageError::InvalidSourceMap(format!(
                                    "file index out of range: {file_index}"
                                ))
                            })?;
                            let file = source_list.get(idx).ok_or_else(|| {
                                CoverageError::InvalidSourceMap(format!(
                                    "file index {idx} not in source list of length {}",
                                    source_list.len()
                                ))
                            })?;
                            Some(file.clone())
                        };
                    }
                    3 => {
                        let c = field.chars().next().ok_or_else(|| {
                            CoverageError::InvalidSourceMap("empty jump field".to_string())
                        })?;
                        current.jump = Some(Jump::from_char(c).ok_or_else(|| {
                            CoverageError::InvalidSourceMap(format!("invalid jump type: {c:?}"))
                        })?);
                    }
                    // Newer solc versions append a modifier-depth field; the
                    // core has no use for it and ignores anything past the
                    // quadruple it understands.
                    _ => {}
                }
            }
            out.push(current.clone());
            prev = current;
        }

        Ok(out)
    }
}
