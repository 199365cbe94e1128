use std::char::REPLACEMENT_CHARACTER;

/// Incremental UTF-8 decoder for a chunked text body.
///
/// A multi-byte character may be split across chunk boundaries; the trailing
/// incomplete bytes are held back until the next call. Invalid sequences decode
/// to U+FFFD instead of failing the stream.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(error) => {
                    let valid_up_to = error.valid_up_to();
                    out.push_str(std::str::from_utf8(&rest[..valid_up_to]).unwrap_or_default());
                    match error.error_len() {
                        Some(invalid_len) => {
                            out.push(REPLACEMENT_CHARACTER);
                            rest = &rest[valid_up_to + invalid_len..];
                        }
                        None => {
                            // Incomplete sequence at the end of the chunk.
                            self.pending = rest[valid_up_to..].to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flushes held-back bytes at end of stream.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }

    #[cfg(test)]
    fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_chunks_pass_through() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"Hel"), "Hel");
        assert_eq!(decoder.decode(b"lo"), "lo");
        assert!(!decoder.has_pending());
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_split_three_byte_char_is_buffered() {
        let euro = "€".as_bytes();
        let mut decoder = Utf8StreamDecoder::new();

        assert_eq!(decoder.decode(&[b'1', b'0', euro[0]]), "10");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(&euro[1..2]), "");
        assert_eq!(decoder.decode(&euro[2..]), "€");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_four_byte_char_split_across_every_byte() {
        let crab = "🦀".as_bytes();
        let mut decoder = Utf8StreamDecoder::new();
        let mut out = String::new();
        for byte in crab {
            out.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        assert_eq!(out, "🦀");
    }

    #[test]
    fn test_invalid_byte_becomes_replacement_and_decoding_continues() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"a\xFFb"), "a\u{FFFD}b");
        assert_eq!(decoder.decode(b"c"), "c");
    }

    #[test]
    fn test_truncated_tail_flushes_as_replacement() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"ok\xE2\x82"), "ok");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_empty_chunk_yields_nothing() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b""), "");
    }
}
