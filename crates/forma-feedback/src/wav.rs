//! WAV packaging for synthesized PCM

use bytes::{BufMut, Bytes, BytesMut};

use forma_core::{FormaError, FormaResult};

const RIFF_HEADER_LEN: usize = 44;
const PCM_FORMAT_TAG: u16 = 1;
const MAX_CHANNELS: u16 = 8;
const MAX_SAMPLE_RATE: u32 = 384_000;
/// RIFF sizes are u32 and the chunk size counts 36 header bytes
const MAX_PCM_LEN: usize = (u32::MAX - 36) as usize;

/// Raw PCM layout produced by the synthesizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        AudioFormat {
            sample_rate: 24_000,
            channels: 1,
            bits_per_sample: 16,
        }
    }
}

impl AudioFormat {
    /// Bytes per sample frame (all channels)
    pub fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    pub fn validate(&self) -> FormaResult<()> {
        if self.sample_rate == 0 || self.channels == 0 {
            return Err(FormaError::InvalidConfig(format!(
                "audio format {}Hz x{} is empty",
                self.sample_rate, self.channels
            )));
        }
        if self.sample_rate > MAX_SAMPLE_RATE || self.channels > MAX_CHANNELS {
            return Err(FormaError::InvalidConfig(format!(
                "audio format {}Hz x{} exceeds {}Hz x{}",
                self.sample_rate, self.channels, MAX_SAMPLE_RATE, MAX_CHANNELS
            )));
        }
        if !matches!(self.bits_per_sample, 8 | 16 | 24 | 32) {
            return Err(FormaError::InvalidConfig(format!(
                "unsupported bits per sample: {}",
                self.bits_per_sample
            )));
        }
        Ok(())
    }
}

/// Prefix raw little-endian PCM with a canonical 44-byte RIFF/WAVE header
///
/// Fails for an invalid format or a payload too large for RIFF sizes.
pub fn wrap_pcm(pcm: &[u8], format: AudioFormat) -> FormaResult<Bytes> {
    format.validate()?;
    let data_len = match u32::try_from(pcm.len()) {
        Ok(len) if pcm.len() <= MAX_PCM_LEN => len,
        _ => {
            return Err(FormaError::InvalidConfig(format!(
                "{} bytes of PCM exceed the RIFF size limit",
                pcm.len()
            )))
        }
    };
    let mut buf = BytesMut::with_capacity(RIFF_HEADER_LEN + pcm.len());

    buf.put_slice(b"RIFF");
    buf.put_u32_le(36 + data_len);
    buf.put_slice(b"WAVE");

    buf.put_slice(b"fmt ");
    buf.put_u32_le(16);
    buf.put_u16_le(PCM_FORMAT_TAG);
    buf.put_u16_le(format.channels);
    buf.put_u32_le(format.sample_rate);
    buf.put_u32_le(format.byte_rate());
    buf.put_u16_le(format.block_align());
    buf.put_u16_le(format.bits_per_sample);

    buf.put_slice(b"data");
    buf.put_u32_le(data_len);
    buf.put_slice(pcm);

    Ok(buf.freeze())
}
