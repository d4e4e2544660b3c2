// Decode module - minimal 16-bit PCM waveform decoding
//
// Recordings arrive as a waveform container: a fixed-size header followed by
// signed 16-bit little-endian samples. The header is skipped rather than
// parsed, so channel count and sample rate are never inspected.

/// Divisor that maps an i16 sample into [-1.0, 1.0)
pub const PCM16_SCALE: f64 = 32768.0;

const BYTES_PER_SAMPLE: usize = 2;

/// Number of complete samples after the header
///
/// Returns 0 when the buffer cannot hold the header plus one sample.
pub fn sample_count(audio: &[u8], header_bytes: usize) -> usize {
    audio.len().saturating_sub(header_bytes) / BYTES_PER_SAMPLE
}

/// Decode samples following `header_bytes` of header
///
/// A trailing odd byte is ignored. A buffer shorter than
/// `header_bytes + 2` yields an empty vector.
pub fn decode_pcm16(audio: &[u8], header_bytes: usize) -> Vec<f64> {
    if sample_count(audio, header_bytes) == 0 {
        return Vec::new();
    }

    audio[header_bytes..]
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f64 / PCM16_SCALE)
        .collect()
}
