//! WAV Transcoder - 基于 symphonia 的试听转码器
//!
//! 支持：
//! - WAV 头解析（可在截断的前缀上工作，时长由 fmt/data chunk 推导）
//! - WAV pass-through
//! - WAV → Opus (OGG 容器) 编码，面向音乐优化

use async_trait::async_trait;
use ogg::writing::PacketWriter;
use opus::{Application, Channels, Encoder};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{
    AudioInfo, AudioTranscoderPort, PreviewFormat, TranscodeConfig, TranscodeError,
    TranscodeResult,
};

/// Opus 最大包大小
const OPUS_MAX_PACKET: usize = 4000;

/// 解析出的 WAV 格式信息
#[derive(Debug)]
struct WavInfo {
    num_channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    data_size: usize,
}

/// 解码后的交织 PCM
#[derive(Debug)]
struct PcmAudio {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u8,
}

impl PcmAudio {
    fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / (self.sample_rate as u64 * self.channels as u64)
    }
}

/// WAV 试听转码器
pub struct WavTranscoder;

impl WavTranscoder {
    pub fn new() -> Self {
        Self
    }

    /// 解析 WAV chunk 结构
    ///
    /// 只读 chunk 头，data chunk 的实际字节不需要在缓冲区内，
    /// 因此可用于文件前缀探测。
    fn parse_header(data: &[u8]) -> Result<WavInfo, TranscodeError> {
        if data.len() < 12 {
            return Err(TranscodeError::InvalidInput("WAV data too short".to_string()));
        }
        if &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
            return Err(TranscodeError::InvalidInput(
                "Invalid WAV: missing RIFF/WAVE header".to_string(),
            ));
        }

        let mut pos = 12;
        let mut fmt: Option<(u16, u32, u16)> = None; // (channels, rate, bits)
        let mut data_size = None;

        while pos + 8 <= data.len() {
            let chunk_id = &data[pos..pos + 4];
            let chunk_size =
                u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
                    as usize;

            match chunk_id {
                b"fmt " => {
                    if chunk_size < 16 || pos + 8 + 16 > data.len() {
                        return Err(TranscodeError::InvalidInput(
                            "Invalid fmt chunk".to_string(),
                        ));
                    }
                    let f = &data[pos + 8..pos + 24];
                    fmt = Some((
                        u16::from_le_bytes([f[2], f[3]]),
                        u32::from_le_bytes([f[4], f[5], f[6], f[7]]),
                        u16::from_le_bytes([f[14], f[15]]),
                    ));
                }
                b"data" => {
                    data_size = Some(chunk_size);
                    break;
                }
                _ => {}
            }

            pos += 8 + chunk_size;
            // chunk 对齐到偶数字节
            if chunk_size % 2 != 0 {
                pos += 1;
            }
        }

        let (num_channels, sample_rate, bits_per_sample) = fmt.ok_or_else(|| {
            TranscodeError::InvalidInput("Invalid WAV: missing fmt chunk".to_string())
        })?;
        let data_size = data_size.ok_or_else(|| {
            TranscodeError::InvalidInput("Invalid WAV: missing data chunk".to_string())
        })?;

        Ok(WavInfo {
            num_channels,
            sample_rate,
            bits_per_sample,
            data_size,
        })
    }

    /// symphonia 解码为交织 f32 PCM
    fn decode_pcm(&self, data: &[u8]) -> Result<PcmAudio, TranscodeError> {
        let cursor = Cursor::new(data.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        hint.with_extension("wav");

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| TranscodeError::DecodingError(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;
        let track = format
            .default_track()
            .ok_or_else(|| TranscodeError::DecodingError("No audio track found".to_string()))?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| TranscodeError::DecodingError("Unknown sample rate".to_string()))?;
        let channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u8)
            .ok_or_else(|| TranscodeError::DecodingError("Unknown channel count".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| TranscodeError::DecodingError(format!("Decoder creation failed: {}", e)))?;

        let track_id = track.id;
        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    return Err(TranscodeError::DecodingError(format!(
                        "Packet read error: {}",
                        e
                    )));
                }
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Decode error (skipping packet): {}", e);
                    continue;
                }
            };

            let spec = *decoded.spec();
            let num_frames = decoded.frames();
            let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            // SampleBuffer 容量可能大于实际帧数
            let actual = num_frames * spec.channels.count();
            samples.extend(&sample_buf.samples()[..actual]);
        }

        Ok(PcmAudio {
            samples,
            sample_rate,
            channels,
        })
    }

    /// 立体声下混为单声道（平均）
    fn downmix_mono(pcm: &PcmAudio) -> PcmAudio {
        if pcm.channels <= 1 {
            return PcmAudio {
                samples: pcm.samples.clone(),
                sample_rate: pcm.sample_rate,
                channels: pcm.channels,
            };
        }
        let ch = pcm.channels as usize;
        let mono: Vec<f32> = pcm
            .samples
            .chunks_exact(ch)
            .map(|frame| frame.iter().sum::<f32>() / ch as f32)
            .collect();
        PcmAudio {
            samples: mono,
            sample_rate: pcm.sample_rate,
            channels: 1,
        }
    }

    /// Opus 只接受 8/12/16/24/48 kHz
    fn opus_rate_for(sample_rate: u32) -> u32 {
        match sample_rate {
            8000 | 12000 | 16000 | 24000 | 48000 => sample_rate,
            r if r <= 8000 => 8000,
            r if r <= 12000 => 12000,
            r if r <= 16000 => 16000,
            r if r <= 24000 => 24000,
            _ => 48000,
        }
    }

    /// 线性插值重采样
    fn resample(samples: &[f32], from_rate: u32, to_rate: u32, channels: u8) -> Vec<f32> {
        if from_rate == to_rate || samples.is_empty() {
            return samples.to_vec();
        }

        let ratio = to_rate as f64 / from_rate as f64;
        let ch = channels as usize;
        let frames = samples.len() / ch;
        let new_frames = (frames as f64 * ratio) as usize;
        let mut out = Vec::with_capacity(new_frames * ch);

        for i in 0..new_frames {
            let src = i as f64 / ratio;
            let idx = src as usize;
            let frac = (src - idx as f64) as f32;

            for c in 0..ch {
                let s0 = samples.get(idx * ch + c).copied().unwrap_or(0.0);
                let s1 = samples
                    .get(((idx + 1).min(frames.saturating_sub(1))) * ch + c)
                    .copied()
                    .unwrap_or(s0);
                out.push(s0 + (s1 - s0) * frac);
            }
        }
        out
    }

    /// PCM → Opus（OGG 容器，RFC 7845 封装）
    fn encode_opus(&self, pcm: &PcmAudio, bitrate: u32) -> Result<Vec<u8>, TranscodeError> {
        let target_rate = Self::opus_rate_for(pcm.sample_rate);
        let samples = Self::resample(&pcm.samples, pcm.sample_rate, target_rate, pcm.channels);

        let (opus_channels, channel_count) = if pcm.channels == 1 {
            (Channels::Mono, 1usize)
        } else {
            (Channels::Stereo, 2usize)
        };

        // Application::Audio: 音乐场景的编码模式
        let mut encoder = Encoder::new(target_rate, opus_channels, Application::Audio)
            .map_err(|e| TranscodeError::EncodingError(format!("Failed to create Opus encoder: {}", e)))?;
        encoder
            .set_bitrate(opus::Bitrate::Bits(bitrate as i32))
            .map_err(|e| TranscodeError::EncodingError(format!("Failed to set bitrate: {}", e)))?;

        let pre_skip = encoder.get_lookahead().map(|l| l as u16).unwrap_or(312);

        let pcm_i16: Vec<i16> = samples
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
            .collect();

        // 20ms 帧
        let frame_size = (target_rate as usize * 20) / 1000;
        let samples_per_frame = frame_size * channel_count;

        let mut ogg_data = Vec::new();
        {
            let mut writer = PacketWriter::new(&mut ogg_data);

            writer
                .write_packet(
                    Self::opus_head(channel_count as u8, target_rate, pre_skip),
                    0,
                    ogg::PacketWriteEndInfo::EndPage,
                    0,
                )
                .map_err(|e| TranscodeError::EncodingError(format!("Failed to write Opus head: {}", e)))?;
            writer
                .write_packet(
                    Self::opus_tags(),
                    0,
                    ogg::PacketWriteEndInfo::EndPage,
                    0,
                )
                .map_err(|e| TranscodeError::EncodingError(format!("Failed to write Opus tags: {}", e)))?;

            let mut packet_buf = vec![0u8; OPUS_MAX_PACKET];

            // granule position 以 48kHz 样本数计 (RFC 7845)
            let granule_scale = 48000.0 / target_rate as f64;
            let frame_granule = (frame_size as f64 * granule_scale) as u64;
            let mut granule_pos = (pre_skip as f64 * granule_scale) as u64;

            // 编码器延迟的样本需要额外静音帧刷出
            let flush_frames = (pre_skip as usize).div_ceil(samples_per_frame).max(1);
            let chunks: Vec<_> = pcm_i16.chunks(samples_per_frame).collect();

            for chunk in chunks {
                let frame = if chunk.len() < samples_per_frame {
                    let mut padded = chunk.to_vec();
                    padded.resize(samples_per_frame, 0);
                    padded
                } else {
                    chunk.to_vec()
                };

                let n = encoder
                    .encode(&frame, &mut packet_buf)
                    .map_err(|e| TranscodeError::EncodingError(format!("Opus encode failed: {}", e)))?;
                granule_pos += frame_granule;
                writer
                    .write_packet(
                        packet_buf[..n].to_vec(),
                        0,
                        ogg::PacketWriteEndInfo::NormalPacket,
                        granule_pos,
                    )
                    .map_err(|e| TranscodeError::EncodingError(format!("Failed to write packet: {}", e)))?;
            }

            let silence = vec![0i16; samples_per_frame];
            for i in 0..flush_frames {
                let n = encoder
                    .encode(&silence, &mut packet_buf)
                    .map_err(|e| TranscodeError::EncodingError(format!("Opus flush failed: {}", e)))?;
                granule_pos += frame_granule;
                let end_info = if i == flush_frames - 1 {
                    ogg::PacketWriteEndInfo::EndStream
                } else {
                    ogg::PacketWriteEndInfo::NormalPacket
                };
                writer
                    .write_packet(packet_buf[..n].to_vec(), 0, end_info, granule_pos)
                    .map_err(|e| TranscodeError::EncodingError(format!("Failed to write packet: {}", e)))?;
            }
        }

        Ok(ogg_data)
    }

    /// OpusHead 包 (RFC 7845)
    fn opus_head(channels: u8, sample_rate: u32, pre_skip: u16) -> Vec<u8> {
        let mut head = Vec::with_capacity(19);
        head.extend_from_slice(b"OpusHead");
        head.push(1); // version
        head.push(channels);
        head.extend_from_slice(&pre_skip.to_le_bytes());
        head.extend_from_slice(&sample_rate.to_le_bytes());
        head.extend_from_slice(&0i16.to_le_bytes()); // output gain
        head.push(0); // channel mapping family
        head
    }

    /// OpusTags 包
    fn opus_tags() -> Vec<u8> {
        let vendor = "mula-studio";
        let mut tags = Vec::new();
        tags.extend_from_slice(b"OpusTags");
        tags.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
        tags.extend_from_slice(vendor.as_bytes());
        tags.extend_from_slice(&0u32.to_le_bytes()); // no user comments
        tags
    }
}

impl Default for WavTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioTranscoderPort for WavTranscoder {
    async fn transcode(
        &self,
        wav_data: &[u8],
        config: &TranscodeConfig,
    ) -> Result<TranscodeResult, TranscodeError> {
        let original_size = wav_data.len();

        if config.format == PreviewFormat::Wav {
            let info = self.get_audio_info(wav_data)?;
            return Ok(TranscodeResult {
                audio_data: wav_data.to_vec(),
                format: PreviewFormat::Wav,
                duration_ms: info.duration_ms,
                sample_rate: info.sample_rate,
                channels: info.channels,
                original_size,
                transcoded_size: original_size,
            });
        }

        let decoded = self.decode_pcm(wav_data)?;
        let pcm = if config.channels == Some(1) {
            Self::downmix_mono(&decoded)
        } else {
            decoded
        };

        let bitrate = config.bitrate.unwrap_or(96_000);
        let opus_data = self.encode_opus(&pcm, bitrate)?;

        tracing::debug!(
            original_size = original_size,
            opus_size = opus_data.len(),
            bitrate = bitrate,
            "Encoded to Opus"
        );

        Ok(TranscodeResult {
            duration_ms: pcm.duration_ms(),
            sample_rate: pcm.sample_rate,
            channels: pcm.channels,
            transcoded_size: opus_data.len(),
            audio_data: opus_data,
            format: PreviewFormat::Opus,
            original_size,
        })
    }

    fn get_audio_info(&self, wav_data: &[u8]) -> Result<AudioInfo, TranscodeError> {
        let info = Self::parse_header(wav_data)?;

        let samples_per_channel = if info.bits_per_sample > 0 && info.num_channels > 0 {
            info.data_size / (info.bits_per_sample as usize / 8) / info.num_channels as usize
        } else {
            0
        };
        let duration_ms = if info.sample_rate > 0 {
            (samples_per_channel as u64 * 1000) / info.sample_rate as u64
        } else {
            0
        };

        Ok(AudioInfo {
            duration_ms,
            sample_rate: info.sample_rate,
            channels: info.num_channels as u8,
            bits_per_sample: info.bits_per_sample,
            data_size: info.data_size,
        })
    }

    fn supports_format(&self, format: PreviewFormat) -> bool {
        matches!(format, PreviewFormat::Wav | PreviewFormat::Opus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1 秒 44.1kHz 立体声 16bit 正弦波
    fn stereo_test_wav() -> Vec<u8> {
        let sample_rate: u32 = 44_100;
        let num_channels: u16 = 2;
        let num_frames = sample_rate as usize;
        let data_size = num_frames * num_channels as usize * 2;

        let mut wav = Vec::with_capacity(44 + data_size);
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&((36 + data_size) as u32).to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&num_channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&(sample_rate * num_channels as u32 * 2).to_le_bytes());
        wav.extend_from_slice(&(num_channels * 2).to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&(data_size as u32).to_le_bytes());

        for i in 0..num_frames {
            let t = i as f32 / sample_rate as f32;
            let sample = ((t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 12000.0) as i16;
            wav.extend_from_slice(&sample.to_le_bytes());
            wav.extend_from_slice(&sample.to_le_bytes());
        }
        wav
    }

    #[test]
    fn test_audio_info_from_header() {
        let transcoder = WavTranscoder::new();
        let wav = stereo_test_wav();

        let info = transcoder.get_audio_info(&wav).unwrap();
        assert_eq!(info.sample_rate, 44_100);
        assert_eq!(info.channels, 2);
        assert_eq!(info.bits_per_sample, 16);
        assert!(info.duration_ms >= 990 && info.duration_ms <= 1010);
    }

    #[test]
    fn test_audio_info_works_on_truncated_prefix() {
        let transcoder = WavTranscoder::new();
        let wav = stereo_test_wav();

        // 只保留 chunk 头部分，模拟文件前缀探测
        let info = transcoder.get_audio_info(&wav[..64]).unwrap();
        assert_eq!(info.sample_rate, 44_100);
        assert!(info.duration_ms >= 990 && info.duration_ms <= 1010);
    }

    #[test]
    fn test_rejects_non_wav() {
        let transcoder = WavTranscoder::new();
        assert!(transcoder.get_audio_info(b"OggS-not-a-wav-file").is_err());
    }

    #[tokio::test]
    async fn test_wav_passthrough() {
        let transcoder = WavTranscoder::new();
        let wav = stereo_test_wav();

        let config = TranscodeConfig {
            format: PreviewFormat::Wav,
            ..Default::default()
        };
        let result = transcoder.transcode(&wav, &config).await.unwrap();
        assert_eq!(result.format, PreviewFormat::Wav);
        assert_eq!(result.audio_data.len(), wav.len());
    }

    #[tokio::test]
    async fn test_transcode_to_opus_shrinks_music() {
        let transcoder = WavTranscoder::new();
        let wav = stereo_test_wav();

        let config = TranscodeConfig {
            format: PreviewFormat::Opus,
            bitrate: Some(96_000),
            channels: None,
        };
        let result = transcoder.transcode(&wav, &config).await.unwrap();

        assert_eq!(result.format, PreviewFormat::Opus);
        assert!(result.transcoded_size < result.original_size);
        assert_eq!(&result.audio_data[0..4], b"OggS");
        assert_eq!(result.channels, 2);
    }

    #[tokio::test]
    async fn test_downmix_to_mono() {
        let transcoder = WavTranscoder::new();
        let wav = stereo_test_wav();

        let config = TranscodeConfig {
            format: PreviewFormat::Opus,
            bitrate: Some(48_000),
            channels: Some(1),
        };
        let result = transcoder.transcode(&wav, &config).await.unwrap();
        assert_eq!(result.channels, 1);
    }
}
