//! Image and audio recognition.
//!
//! Media files are recognized and stored; content extraction (description,
//! transcription) is delegated to provider-backed services downstream. This
//! parser only records file metadata: size, MIME type, pixel dimensions for
//! images, and duration/sample rate for WAV audio.

use async_trait::async_trait;
use ragkit_core::{DocumentParser, DocumentType, Metadata, ParseError, ParsedDocument};
use std::path::Path;
use tracing::warn;

/// Parser for stored media (images and audio).
pub struct MediaParser;

impl MediaParser {
    /// Create a new media parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for MediaParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentParser for MediaParser {
    fn supported_extensions(&self) -> &[&str] {
        &["png", "jpg", "jpeg", "gif", "webp", "mp3", "wav", "m4a"]
    }

    fn supported_types(&self) -> &[&str] {
        &[
            "image/png",
            "image/jpeg",
            "image/gif",
            "image/webp",
            "audio/mpeg",
            "audio/wav",
            "audio/x-wav",
            "audio/mp4",
        ]
    }

    async fn parse(&self, path: &Path) -> Result<ParsedDocument, ParseError> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.parse_bytes(&bytes, name).await
    }

    async fn parse_bytes(&self, data: &[u8], name: &str) -> Result<ParsedDocument, ParseError> {
        let mime = mime_guess::from_path(name)
            .first_raw()
            .unwrap_or("application/octet-stream");

        let document_type = if mime.starts_with("image/") {
            DocumentType::Image
        } else if mime.starts_with("audio/") {
            DocumentType::Audio
        } else {
            return Err(ParseError::UnsupportedFormat(mime.to_string()));
        };

        let mut file_metadata = Metadata::new();
        file_metadata.insert("size_bytes".to_string(), data.len().into());
        file_metadata.insert("mime_type".to_string(), mime.into());

        match document_type {
            DocumentType::Image => match image::load_from_memory(data) {
                Ok(img) => {
                    file_metadata.insert("width".to_string(), img.width().into());
                    file_metadata.insert("height".to_string(), img.height().into());
                }
                Err(e) => {
                    // Undecodable images are still stored; dimensions stay unset.
                    warn!(name, error = %e, "image dimensions unavailable");
                }
            },
            DocumentType::Audio => {
                if let Some(wav) = read_wav_header(data) {
                    file_metadata.insert("sample_rate".to_string(), wav.sample_rate.into());
                    file_metadata.insert("channels".to_string(), wav.channels.into());
                    if let Some(duration) = wav.duration_secs {
                        file_metadata.insert("duration_secs".to_string(), duration.into());
                    }
                }
            }
            _ => unreachable!(),
        }

        Ok(ParsedDocument {
            // Extraction is provider-backed; local content is empty.
            content: String::new(),
            document_type,
            file_metadata,
            title: None,
        })
    }
}

struct WavHeader {
    sample_rate: u32,
    channels: u16,
    duration_secs: Option<f64>,
}

/// Read sample rate, channel count, and duration from a RIFF/WAVE header.
fn read_wav_header(data: &[u8]) -> Option<WavHeader> {
    if data.len() < 44 || &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return None;
    }

    let channels = u16::from_le_bytes([data[22], data[23]]);
    let sample_rate = u32::from_le_bytes([data[24], data[25], data[26], data[27]]);
    let byte_rate = u32::from_le_bytes([data[28], data[29], data[30], data[31]]);

    // Locate the data chunk to compute duration.
    let mut duration_secs = None;
    let mut pos = 12;
    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size =
            u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]]);
        if chunk_id == b"data" && byte_rate > 0 {
            duration_secs = Some(f64::from(chunk_size) / f64::from(byte_rate));
            break;
        }
        pos += 8 + chunk_size as usize;
    }

    Some(WavHeader {
        sample_rate,
        channels,
        duration_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal valid WAV: 1 channel, 8000 Hz, 16-bit, one second of silence.
    fn make_wav(seconds: u32) -> Vec<u8> {
        let sample_rate: u32 = 8000;
        let channels: u16 = 1;
        let bits: u16 = 16;
        let byte_rate = sample_rate * u32::from(channels) * u32::from(bits) / 8;
        let data_size = byte_rate * seconds;

        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_size).to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&(channels * bits / 8).to_le_bytes());
        wav.extend_from_slice(&bits.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_size.to_le_bytes());
        wav.resize(wav.len() + data_size as usize, 0);
        wav
    }

    #[tokio::test]
    async fn test_wav_metadata() {
        let wav = make_wav(2);
        let parsed = MediaParser::new().parse_bytes(&wav, "clip.wav").await.unwrap();

        assert_eq!(parsed.document_type, DocumentType::Audio);
        assert!(parsed.content.is_empty());
        assert_eq!(parsed.file_metadata["sample_rate"], 8000);
        assert_eq!(parsed.file_metadata["channels"], 1);
        let duration = parsed.file_metadata["duration_secs"].as_f64().unwrap();
        assert!((duration - 2.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_png_dimensions() {
        // 1x1 transparent PNG
        let png: &[u8] = &[
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
            0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
            0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78,
            0x9C, 0x62, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
            0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
        ];
        let parsed = MediaParser::new().parse_bytes(png, "dot.png").await.unwrap();

        assert_eq!(parsed.document_type, DocumentType::Image);
        assert_eq!(parsed.file_metadata["width"], 1);
        assert_eq!(parsed.file_metadata["height"], 1);
    }

    #[tokio::test]
    async fn test_corrupt_image_still_recognized() {
        let parsed = MediaParser::new()
            .parse_bytes(b"not an image", "broken.jpg")
            .await
            .unwrap();
        assert_eq!(parsed.document_type, DocumentType::Image);
        assert!(parsed.file_metadata.get("width").is_none());
        assert_eq!(parsed.file_metadata["size_bytes"], 12);
    }

    #[tokio::test]
    async fn test_mp3_records_basics_only() {
        let parsed = MediaParser::new()
            .parse_bytes(&[0xFF, 0xFB, 0x90, 0x00], "song.mp3")
            .await
            .unwrap();
        assert_eq!(parsed.document_type, DocumentType::Audio);
        assert_eq!(parsed.file_metadata["mime_type"], "audio/mpeg");
        assert!(parsed.file_metadata.get("sample_rate").is_none());
    }

    #[test]
    fn test_read_wav_header_rejects_short_data() {
        assert!(read_wav_header(b"RIFF").is_none());
        assert!(read_wav_header(&[0u8; 64]).is_none());
    }
}
