//! Integration tests for tag reading
//!
//! Builds minimal PCM WAV files in memory so no fixtures are needed.

use bridge_traits::playback::{AudioCodec, TagReader};
use bytes::Bytes;
use core_metadata::LoftyTagReader;

fn chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    if body.len() % 2 == 1 {
        out.push(0);
    }
    out
}

/// 0.1 s of 8 kHz mono 16-bit silence, optionally with a RIFF INFO list.
fn wav(info: &[(&[u8; 4], &str)]) -> Vec<u8> {
    let mut fmt = Vec::new();
    fmt.extend_from_slice(&1u16.to_le_bytes()); // PCM
    fmt.extend_from_slice(&1u16.to_le_bytes()); // channels
    fmt.extend_from_slice(&8000u32.to_le_bytes()); // sample rate
    fmt.extend_from_slice(&16000u32.to_le_bytes()); // byte rate
    fmt.extend_from_slice(&2u16.to_le_bytes()); // block align
    fmt.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    let mut body = b"WAVE".to_vec();
    body.extend(chunk(b"fmt ", &fmt));
    body.extend(chunk(b"data", &[0u8; 1600]));

    if !info.is_empty() {
        let mut list = b"INFO".to_vec();
        for (id, value) in info {
            let mut text = value.as_bytes().to_vec();
            text.push(0);
            list.extend(chunk(id, &text));
        }
        body.extend(chunk(b"LIST", &list));
    }

    chunk(b"RIFF", &body)
}

#[tokio::test]
async fn test_reads_riff_info_tags() {
    let data = wav(&[(b"INAM", "Test  Title"), (b"IART", "Test Artist"), (b"IPRD", "Test Album")]);

    let reader = LoftyTagReader::new();
    let metadata = reader.read_metadata(Bytes::from(data)).await.unwrap();

    assert_eq!(metadata.title.as_deref(), Some("Test Title"));
    assert_eq!(metadata.artist.as_deref(), Some("Test Artist"));
    assert_eq!(metadata.album.as_deref(), Some("Test Album"));
}

#[tokio::test]
async fn test_untagged_audio_has_no_title() {
    let reader = LoftyTagReader::new();
    let metadata = reader.read_metadata(Bytes::from(wav(&[]))).await.unwrap();
    assert!(metadata.title.is_none());
    assert!(metadata.artist.is_none());
}

#[test]
fn test_extract_reports_container_properties() {
    let tags = LoftyTagReader::new().extract(&wav(&[])).unwrap();

    assert_eq!(tags.codec, AudioCodec::Wav);
    assert_eq!(tags.sample_rate, Some(8000));
    assert_eq!(tags.channels, Some(1));
    assert_eq!(tags.duration_ms, 100);
}

#[tokio::test]
async fn test_non_audio_is_an_error() {
    let reader = LoftyTagReader::new();
    let result = reader
        .read_metadata(Bytes::from_static(b"This is not a valid audio file"))
        .await;
    assert!(result.is_err(), "Should fail for non-audio input");
}

#[test]
fn test_truncated_wav_is_reported() {
    let mut data = wav(&[]);
    data.truncate(20);
    assert!(LoftyTagReader::new().extract(&data).is_err());
}
