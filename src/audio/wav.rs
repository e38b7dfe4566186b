use crate::{AuraError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

/// Write mono/interleaved f32 samples as a WAV file.
pub fn write_wav(
    path: impl AsRef<Path>,
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
) -> Result<()> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec)
        .map_err(|e| AuraError::Io(format!("Failed to create WAV file: {e}")))?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| AuraError::Io(format!("Failed to write WAV sample: {e}")))?;
    }

    writer
        .finalize()
        .map_err(|e| AuraError::Io(format!("Failed to finalize WAV file: {e}")))?;

    Ok(())
}

/// Read a WAV file back as f32 samples with its sample rate and channels.
pub fn read_wav(path: impl AsRef<Path>) -> Result<(Vec<f32>, u32, u16)> {
    let mut reader = WavReader::open(path.as_ref())
        .map_err(|e| AuraError::Io(format!("Failed to open WAV file: {e}")))?;

    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| AuraError::Io(format!("Failed to read WAV samples: {e}")))?,
        SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| AuraError::Io(format!("Failed to read WAV samples: {e}")))?
        }
    };

    Ok((samples, spec.sample_rate, spec.channels))
}
