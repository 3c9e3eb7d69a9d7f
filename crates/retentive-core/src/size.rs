//! Byte-size and encoding primitives

use crate::error::MemoryResult;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// UTF-8 byte length of a string
///
/// Named to make call sites explicit about bytes vs chars; every bound in
/// the subsystem is a byte bound.
pub fn byte_len(text: &str) -> usize {
    text.len()
}

/// Render a byte count for humans (1536 -> "1.5 KB")
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Gzip-compress a byte slice
pub fn gzip_compress(data: &[u8]) -> MemoryResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress a gzip byte slice
pub fn gzip_decompress(data: &[u8]) -> MemoryResult<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Rough token estimate for informational budgets
///
/// Symbol-dense text tokenizes shorter than prose, so the divisor shifts
/// with the fraction of structural characters.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let structural = text
        .bytes()
        .filter(|b| matches!(b, b'{' | b'}' | b'[' | b']' | b'(' | b')' | b';' | b'=' | b'<' | b'>'))
        .count();
    let density = (structural as f64 / text.len() as f64).min(0.25);
    // 4.0 chars/token for prose, sliding toward 2.5 for dense code
    let chars_per_token = 4.0 - density * 6.0;
    ((text.len() as f64 / chars_per_token) as usize).max(1)
}
