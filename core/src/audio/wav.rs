//! WAV encode/decode on top of `hound`.

use super::buffer::AudioBuffer;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{Cursor, ErrorKind, Read};
use std::path::Path;

/// Convert a float sample to 16-bit PCM.
#[inline]
pub fn f32_to_pcm16(s: f32) -> i16 {
    (s * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Write mono 16-bit PCM.
pub fn write_pcm16(path: &Path, samples: &[f32], sample_rate: u32) -> hound::Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample(f32_to_pcm16(s))?;
    }
    writer.finalize()
}

/// Decode any PCM/float WAV into a mono buffer at the file's own rate.
///
/// Streams whose header declares more data than is present (placeholder
/// lengths from piped encoders) are read up to the end of the actual data.
pub fn decode_wav<R: Read>(reader: R) -> hound::Result<AudioBuffer> {
    let reader = WavReader::new(reader)?;
    let spec = reader.spec();
    let interleaved = match spec.sample_format {
        SampleFormat::Float => collect_samples(reader.into_samples::<f32>(), |s| s)?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1) as u32)) as f32;
            collect_samples(reader.into_samples::<i32>(), |s| s as f32 / scale)?
        }
    };
    Ok(AudioBuffer::from_interleaved(
        &interleaved,
        spec.channels,
        spec.sample_rate,
    ))
}

/// Decode an in-memory WAV, first repairing a data chunk length that
/// overruns the buffer (streamed responses often carry `0xFFFFFFFF`).
pub fn decode_wav_bytes(bytes: &[u8]) -> hound::Result<AudioBuffer> {
    let mut owned = bytes.to_vec();
    repair_data_length(&mut owned);
    decode_wav(Cursor::new(owned))
}

pub fn read_wav_file(path: &Path) -> hound::Result<AudioBuffer> {
    let file = std::fs::File::open(path)?;
    decode_wav(std::io::BufReader::new(file))
}

fn repair_data_length(bytes: &mut [u8]) {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return;
    }
    let mut block_align = 1usize;
    let mut idx = 12;
    while idx + 8 <= bytes.len() {
        let chunk_id = [bytes[idx], bytes[idx + 1], bytes[idx + 2], bytes[idx + 3]];
        let sz = u32::from_le_bytes([bytes[idx + 4], bytes[idx + 5], bytes[idx + 6], bytes[idx + 7]])
            as usize;
        if &chunk_id == b"fmt " && idx + 22 <= bytes.len() {
            block_align = u16::from_le_bytes([bytes[idx + 20], bytes[idx + 21]]).max(1) as usize;
        }
        if &chunk_id == b"data" {
            let available = bytes.len() - (idx + 8);
            if sz > available {
                let fixed = (available - available % block_align) as u32;
                bytes[idx + 4..idx + 8].copy_from_slice(&fixed.to_le_bytes());
            }
            return;
        }
        idx = idx.saturating_add(8 + sz + (sz & 1));
    }
}

fn collect_samples<T, I, F>(samples: I, convert: F) -> hound::Result<Vec<f32>>
where
    I: Iterator<Item = hound::Result<T>>,
    F: Fn(T) -> f32,
{
    let mut out = Vec::new();
    for s in samples {
        match s {
            Ok(v) => out.push(convert(v)),
            Err(hound::Error::IoError(e))
                if matches!(e.kind(), ErrorKind::UnexpectedEof | ErrorKind::Other) =>
            {
                break
            }
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_pcm16_bytes() -> Vec<u8> {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 24_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for (l, r) in [(16384i16, 0i16), (-16384, -16384), (0, 8192)] {
                writer.write_sample(l).unwrap();
                writer.write_sample(r).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_and_downmixes_stereo_pcm() {
        let buf = decode_wav(Cursor::new(stereo_pcm16_bytes())).unwrap();
        assert_eq!(buf.sample_rate, 24_000);
        assert_eq!(buf.samples.len(), 3);
        assert!((buf.samples[0] - 0.25).abs() < 1e-6);
        assert!((buf.samples[1] + 0.5).abs() < 1e-6);
        assert!((buf.samples[2] - 0.125).abs() < 1e-6);
    }

    #[test]
    fn repairs_streaming_placeholder_length() {
        let mut bytes = stereo_pcm16_bytes();
        let pos = bytes.windows(4).position(|w| w == b"data").unwrap();
        bytes[pos + 4..pos + 8].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(decode_wav(Cursor::new(bytes.clone())).is_err());
        let buf = decode_wav_bytes(&bytes).unwrap();
        assert_eq!(buf.samples.len(), 3);
        assert_eq!(buf.sample_rate, 24_000);
    }

    #[test]
    fn pcm16_conversion_saturates() {
        assert_eq!(f32_to_pcm16(1.0), i16::MAX);
        assert_eq!(f32_to_pcm16(-1.0), i16::MIN);
        assert_eq!(f32_to_pcm16(0.0), 0);
    }
}
