//! Pixel dimensions of logo images.
//!
//! Only the header bytes are inspected; PNG, JPEG and GIF are supported,
//! which matches the picture formats Word embeds without conversion.

use std::fs;
use std::path::Path;

use crate::error::{RenderError, RenderResult};

/// Read `(width, height)` in pixels from an image file.
pub fn dimensions(path: &Path) -> RenderResult<(u32, u32)> {
    let bytes = fs::read(path).map_err(|e| RenderError::Image {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    parse_dimensions(&bytes).ok_or_else(|| RenderError::Image {
        path: path.to_path_buf(),
        message: "unsupported image format (expected PNG, JPEG or GIF)".to_string(),
    })
}

/// MIME type for a media file extension.
pub fn content_type(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "image/png",
    }
}

fn parse_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        let width = u32::from_be_bytes(bytes.get(16..20)?.try_into().ok()?);
        let height = u32::from_be_bytes(bytes.get(20..24)?.try_into().ok()?);
        return Some((width, height));
    }

    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        let width = u16::from_le_bytes(bytes.get(6..8)?.try_into().ok()?);
        let height = u16::from_le_bytes(bytes.get(8..10)?.try_into().ok()?);
        return Some((width.into(), height.into()));
    }

    if bytes.starts_with(&[0xFF, 0xD8]) {
        return jpeg_dimensions(bytes);
    }

    None
}

fn jpeg_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = bytes[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        // SOF0..SOF15, minus DHT, JPG and DAC which share the range
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            let segment = bytes.get(pos + 5..pos + 9)?;
            let height = u16::from_be_bytes([segment[0], segment[1]]);
            let width = u16::from_be_bytes([segment[2], segment[3]]);
            return Some((width.into(), height.into()));
        }
        pos += 2 + length;
    }
    None
}
