//! Acquisition collaborator interface.
//!
//! The live-capture variants of these probes pull each frame from a camera
//! stack instead of a prefilled buffer. The harness only consumes the
//! returned pixels and times its own conversion and copy steps; whatever the
//! device does behind `capture_frame` is timed as an opaque unit and reported
//! separately.

use std::io;

use crate::error::ConfigError;
use crate::types::FrameGeometry;

/// Raw pixel payload as delivered by an acquisition source.
///
/// Mirrors the payload types real camera stacks hand back: 8-bit mono,
/// 16-bit mono, or 32-bit (RGBA/packed) images.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PixelData {
    /// 8-bit pixels.
    U8(Vec<u8>),
    /// 16-bit pixels.
    U16(Vec<u16>),
    /// 32-bit pixels.
    I32(Vec<i32>),
}

impl PixelData {
    /// Serialized length in bytes.
    pub fn byte_len(&self) -> usize {
        match self {
            PixelData::U8(v) => v.len(),
            PixelData::U16(v) => v.len() * 2,
            PixelData::I32(v) => v.len() * 4,
        }
    }

    /// Serialize into little-endian bytes, reusing `out`.
    pub fn write_le_bytes(&self, out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.byte_len());
        match self {
            PixelData::U8(v) => out.extend_from_slice(v),
            PixelData::U16(v) => {
                for &px in v {
                    out.extend_from_slice(&px.to_le_bytes());
                }
            }
            PixelData::I32(v) => {
                for &px in v {
                    out.extend_from_slice(&px.to_le_bytes());
                }
            }
        }
    }
}

/// A device that can deliver one frame per call.
///
/// Implementations block until the frame is available; the harness times the
/// call as the acquisition cost of that frame.
pub trait FrameSource {
    /// Acquire the next frame.
    fn capture_frame(&mut self) -> io::Result<PixelData>;
}

/// Deterministic stand-in for a camera: ramp images at the configured pixel
/// depth, phase-shifted per frame so consecutive frames differ like a live
/// feed would.
#[derive(Debug)]
pub struct SyntheticCamera {
    geometry: FrameGeometry,
    frame: u64,
}

impl SyntheticCamera {
    /// Source for `geometry`-shaped frames.
    ///
    /// Fails for pixel depths no payload variant can represent.
    pub fn new(geometry: FrameGeometry) -> Result<Self, ConfigError> {
        match geometry.bytes_per_pixel {
            1 | 2 | 4 => Ok(Self { geometry, frame: 0 }),
            bpp => Err(ConfigError::UnsupportedPixelDepth {
                bytes_per_pixel: bpp,
            }),
        }
    }
}

impl FrameSource for SyntheticCamera {
    fn capture_frame(&mut self) -> io::Result<PixelData> {
        let n = self.geometry.pixel_count() as usize;
        let phase = self.frame;
        self.frame += 1;
        let data = match self.geometry.bytes_per_pixel {
            1 => PixelData::U8((0..n).map(|i| (i as u64 + phase) as u8).collect()),
            2 => PixelData::U16((0..n).map(|i| (i as u64 + phase) as u16).collect()),
            4 => PixelData::I32((0..n).map(|i| (i as u64 + phase) as i32).collect()),
            _ => unreachable!("depth checked at construction"),
        };
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u16_pixels_serialize_little_endian() {
        let px = PixelData::U16(vec![0x0102, 0x0304]);
        let mut out = Vec::new();
        px.write_le_bytes(&mut out);
        assert_eq!(out, [0x02, 0x01, 0x04, 0x03]);
        assert_eq!(px.byte_len(), 4);
    }

    #[test]
    fn i32_pixels_serialize_little_endian() {
        let px = PixelData::I32(vec![-1, 2]);
        let mut out = Vec::new();
        px.write_le_bytes(&mut out);
        assert_eq!(out, [0xFF, 0xFF, 0xFF, 0xFF, 2, 0, 0, 0]);
    }

    #[test]
    fn u8_pixels_pass_through() {
        let px = PixelData::U8(vec![1, 2, 3]);
        let mut out = vec![9u8; 8]; // stale content must be cleared
        px.write_le_bytes(&mut out);
        assert_eq!(out, [1, 2, 3]);
    }

    #[test]
    fn synthetic_frames_match_the_configured_byte_size() {
        let g = FrameGeometry {
            width: 4,
            height: 2,
            bytes_per_pixel: 2,
        };
        let mut cam = SyntheticCamera::new(g).unwrap();
        let frame = cam.capture_frame().unwrap();
        assert_eq!(frame.byte_len() as u64, g.frame_bytes().unwrap());
    }

    #[test]
    fn consecutive_synthetic_frames_differ() {
        let g = FrameGeometry {
            width: 4,
            height: 1,
            bytes_per_pixel: 1,
        };
        let mut cam = SyntheticCamera::new(g).unwrap();
        let a = cam.capture_frame().unwrap();
        let b = cam.capture_frame().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn unsupported_depth_is_rejected() {
        let g = FrameGeometry {
            width: 4,
            height: 1,
            bytes_per_pixel: 3,
        };
        assert_eq!(
            SyntheticCamera::new(g).unwrap_err(),
            ConfigError::UnsupportedPixelDepth { bytes_per_pixel: 3 }
        );
    }
}
