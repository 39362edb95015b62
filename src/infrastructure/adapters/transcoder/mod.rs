//! 音频转码适配器

mod wav_transcoder;

pub use wav_transcoder::WavTranscoder;
