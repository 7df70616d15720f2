//! Best-effort decoding of LaTeX sources with unknown encodings.
//!
//! Older submissions are often Latin-1 or another single-byte encoding. The
//! encoding is guessed statistically; bytes that do not decode are dropped
//! rather than replaced, so the output never contains U+FFFD for them.

use chardetng::EncodingDetector;
use encoding_rs::{DecoderResult, Encoding, UTF_8};
use std::path::Path;

/// Read `path` and decode it, see [`decode_bytes`]
pub fn decode_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let text = decode_bytes(&bytes);
    tracing::debug!("Decoded {} ({} bytes)", path.display(), bytes.len());
    Ok(text)
}

/// Decode with the detected encoding, or UTF-8 when detection is not confident
pub fn decode_bytes(bytes: &[u8]) -> String {
    match detect_encoding(bytes) {
        Some(encoding) => decode_with(bytes, encoding),
        None => decode_with(bytes, UTF_8),
    }
}

/// Guess the encoding of `bytes`; `None` when the guess is not confident
pub fn detect_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let (encoding, confident) = detector.guess_assess(None, true);
    tracing::trace!("Detected encoding {} (confident: {})", encoding.name(), confident);
    confident.then_some(encoding)
}

/// Decode `bytes` as `encoding`, silently dropping malformed sequences
pub fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> String {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let mut output = String::with_capacity(
        decoder
            .max_utf8_buffer_length_without_replacement(bytes.len())
            .unwrap_or(bytes.len()),
    );
    let mut input = bytes;

    loop {
        let (result, read) = decoder.decode_to_string_without_replacement(input, &mut output, true);
        input = &input[read..];
        match result {
            DecoderResult::InputEmpty => break,
            DecoderResult::OutputFull => {
                output.reserve(input.len().saturating_mul(3).max(16));
            }
            // The malformed bytes were consumed; keep going after them
            DecoderResult::Malformed(_, _) => {}
        }
    }

    output
}
