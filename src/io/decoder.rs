//! Audio decoding using Symphonia
//!
//! Any container/codec symphonia supports (WAV, FLAC, MP3, AAC, OGG, ...) is
//! decoded in full and folded to mono.

use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::waveform::Waveform;
use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::{mix_to_mono, ChannelMixMode};

/// Decode an audio file to a mono waveform
///
/// # Arguments
///
/// * `path` - Path to audio file
/// * `mix` - How channels are folded to mono
///
/// # Errors
///
/// Returns `AnalysisError::Decode` if the file cannot be opened, probed or
/// decoded, or contains no audio frames.
pub fn decode_file(path: &Path, mix: ChannelMixMode) -> Result<Waveform, AnalysisError> {
    log::debug!("Decoding audio file: {}", path.display());

    let file = std::fs::File::open(path)
        .map_err(|e| AnalysisError::Decode(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    decode_source(Box::new(file), hint, mix)
}

/// Decode an in-memory encoded buffer (e.g. an uploaded file body)
///
/// `extension` is an optional format hint such as `"mp3"` or `"wav"`.
pub fn decode_bytes(
    bytes: &[u8],
    extension: Option<&str>,
    mix: ChannelMixMode,
) -> Result<Waveform, AnalysisError> {
    log::debug!("Decoding {} bytes of encoded audio", bytes.len());

    let mut hint = Hint::new();
    if let Some(extension) = extension {
        hint.with_extension(extension);
    }

    decode_source(Box::new(Cursor::new(bytes.to_vec())), hint, mix)
}

fn decode_source(
    source: Box<dyn MediaSource>,
    hint: Hint,
    mix: ChannelMixMode,
) -> Result<Waveform, AnalysisError> {
    let mss = MediaSourceStream::new(source, Default::default());

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AnalysisError::Decode(format!("Unsupported or corrupt audio: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AnalysisError::Decode("No audio track found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AnalysisError::Decode("Sample rate unknown".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AnalysisError::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut channels: Vec<Vec<f32>> = Vec::new();
    let mut sample_buf: Option<(SampleBuffer<f32>, u64)> = None;
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AnalysisError::Decode(format!("Error reading packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt frame inside an otherwise valid stream
                skipped_packets += 1;
                log::debug!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(AnalysisError::Decode(format!("Decoder failure: {}", e))),
        };

        let spec = *decoded.spec();
        let channel_count = spec.channels.count();
        if channel_count == 0 {
            continue;
        }
        if channels.is_empty() {
            channels = vec![Vec::new(); channel_count];
        }

        let frames_needed = decoded.capacity() as u64;
        let needs_new = match &sample_buf {
            Some((_, frames)) => *frames < frames_needed,
            None => true,
        };
        if needs_new {
            sample_buf = Some((SampleBuffer::new(frames_needed, spec), frames_needed));
        }

        if let Some((buf, _)) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            for frame in buf.samples().chunks(channel_count) {
                for (ch, &s) in frame.iter().enumerate().take(channels.len()) {
                    channels[ch].push(s);
                }
            }
        }
    }

    if skipped_packets > 0 {
        log::warn!("Skipped {} corrupt packets while decoding", skipped_packets);
    }

    if channels.is_empty() || channels[0].is_empty() {
        return Err(AnalysisError::Decode("No audio frames decoded".to_string()));
    }

    let source_channels = channels.len();
    let views: Vec<&[f32]> = channels.iter().map(|c| c.as_slice()).collect();
    let mono = mix_to_mono(&views, mix).map_err(|e| AnalysisError::Decode(e.to_string()))?;

    log::debug!(
        "Decoded {} frames at {} Hz from {} channel(s)",
        mono.len(),
        sample_rate,
        source_channels
    );

    Waveform::with_source_channels(mono, sample_rate, source_channels)
}
