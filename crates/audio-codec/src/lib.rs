//! # audio-codec
//!
//! Uncompressed PCM WAV encoding and decoding for synthesized audio, plus the
//! fade envelopes engines use to avoid clicks at segment edges.

pub mod wav;

pub use wav::{
    DEFAULT_FADE_MS, WAV_CONTENT_TYPE, apply_fade_in, apply_fade_out, decode_wav, encode_wav,
    read_wav, rms, write_wav,
};
