//! Pixel density from container headers.
//!
//! Only the two formats the handle writes are inspected: the JFIF `APP0`
//! segment of a JPEG and the `pHYs` chunk of a PNG. Anything else, or a file
//! that carries no density, reports [`Resolution::default`] (72 ppi).

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header bytes scanned for density information.
const HEADER_LIMIT: u64 = 64 * 1024;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Horizontal and vertical resolution in pixels per inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub x: u32,
    pub y: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self { x: 72, y: 72 }
    }
}

/// Read the resolution recorded in the file at `path`.
///
/// I/O errors are treated as "no density recorded"; the decoder reports
/// unreadable files on its own.
pub fn read_resolution(path: &Path) -> Resolution {
    let mut header = Vec::new();
    let read = File::open(path).and_then(|f| f.take(HEADER_LIMIT).read_to_end(&mut header));
    if read.is_err() {
        return Resolution::default();
    }
    parse_resolution(&header).unwrap_or_default()
}

/// Parse density from the leading bytes of a JPEG or PNG file.
pub fn parse_resolution(header: &[u8]) -> Option<Resolution> {
    if header.starts_with(&[0xFF, 0xD8]) {
        parse_jfif_density(&header[2..])
    } else if header.starts_with(PNG_SIGNATURE) {
        parse_png_phys(&header[PNG_SIGNATURE.len()..])
    } else {
        None
    }
}

/// Walk JPEG marker segments until the JFIF APP0 segment or start of scan.
fn parse_jfif_density(mut data: &[u8]) -> Option<Resolution> {
    while data.len() >= 4 {
        if data[0] != 0xFF {
            return None;
        }
        let marker = data[1];
        // Start of scan: no more header segments follow
        if marker == 0xDA {
            return None;
        }
        let len = u16::from_be_bytes([data[2], data[3]]) as usize;
        let segment_end = len.checked_add(2)?;
        if len < 2 || data.len() < segment_end {
            return None;
        }
        let body = &data[4..segment_end];

        // APP0: "JFIF\0", version (2), units (1), Xdensity (2), Ydensity (2)
        if marker == 0xE0 && body.len() >= 12 && body.starts_with(b"JFIF\0") {
            let units = body[7];
            let x = u16::from_be_bytes([body[8], body[9]]) as f64;
            let y = u16::from_be_bytes([body[10], body[11]]) as f64;
            return match units {
                1 => Some(to_resolution(x, y)),
                2 => Some(to_resolution(x * 2.54, y * 2.54)),
                // 0 is an aspect ratio only
                _ => None,
            };
        }
        data = &data[segment_end..];
    }
    None
}

/// Walk PNG chunks until `pHYs` or the first `IDAT`.
fn parse_png_phys(mut data: &[u8]) -> Option<Resolution> {
    while data.len() >= 12 {
        let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        let kind = &data[4..8];
        if kind == b"IDAT" {
            return None;
        }
        let chunk_end = len.checked_add(12)?;
        if data.len() < chunk_end {
            return None;
        }
        if kind == b"pHYs" && len == 9 {
            let body = &data[8..17];
            let x = u32::from_be_bytes([body[0], body[1], body[2], body[3]]) as f64;
            let y = u32::from_be_bytes([body[4], body[5], body[6], body[7]]) as f64;
            // unit 1: pixels per metre; 0 is an aspect ratio only
            return (body[8] == 1).then(|| to_resolution(x * 0.0254, y * 0.0254));
        }
        data = &data[chunk_end..];
    }
    None
}

fn to_resolution(x: f64, y: f64) -> Resolution {
    Resolution {
        x: x.round() as u32,
        y: y.round() as u32,
    }
}
