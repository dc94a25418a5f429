// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for raw V4L2 buffers
//!
//! The capture thread stores buffers exactly as the driver hands them over;
//! conversion to RGB happens only when somebody asks for a frame (preview
//! draw or capture), not for every buffer the camera produces.

use super::types::{BackendError, BackendResult, CameraFrame, PixelFormat};

/// Raw buffer layouts the V4L2 backend can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawFormat {
    /// Motion JPEG - each buffer is a complete JPEG image
    Mjpeg,
    /// YUYV - packed 4:2:2 (Y0 U Y1 V)
    Yuyv,
    /// UYVY - packed 4:2:2 (U Y0 V Y1)
    Uyvy,
    /// GREY - 8-bit luma only
    Grey,
    /// RGB3 - 24-bit RGB
    Rgb24,
}

impl RawFormat {
    /// Map a V4L2 FourCC code
    pub fn from_fourcc(code: &[u8; 4]) -> Option<Self> {
        match code {
            b"MJPG" | b"JPEG" => Some(Self::Mjpeg),
            b"YUYV" => Some(Self::Yuyv),
            b"UYVY" => Some(Self::Uyvy),
            b"GREY" => Some(Self::Grey),
            b"RGB3" => Some(Self::Rgb24),
            _ => None,
        }
    }

    /// Preference order when negotiating with a device
    pub const PREFERRED: [&'static [u8; 4]; 2] = [b"MJPG", b"YUYV"];
}

/// Decode a raw buffer into a camera frame
pub fn decode(
    format: RawFormat,
    data: &[u8],
    width: u32,
    height: u32,
    stride: u32,
) -> BackendResult<CameraFrame> {
    match format {
        RawFormat::Mjpeg => {
            let img = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
                .map_err(|e| BackendError::Other(format!("MJPEG decode failed: {}", e)))?
                .to_rgb8();
            let (w, h) = (img.width(), img.height());
            Ok(CameraFrame::new(w, h, PixelFormat::RGB24, img.into_raw()))
        }
        RawFormat::Yuyv => Ok(CameraFrame::new(
            width,
            height,
            PixelFormat::RGB24,
            packed_422_to_rgb(data, width, height, stride, Packed422::Yuyv),
        )),
        RawFormat::Uyvy => Ok(CameraFrame::new(
            width,
            height,
            PixelFormat::RGB24,
            packed_422_to_rgb(data, width, height, stride, Packed422::Uyvy),
        )),
        RawFormat::Grey | RawFormat::Rgb24 => {
            let pixel_format = if format == RawFormat::Grey {
                PixelFormat::Gray8
            } else {
                PixelFormat::RGB24
            };
            // Some drivers leave bytesperline at zero
            let stride = stride.max(width * pixel_format.bytes_per_pixel());
            let needed = (stride * height) as usize;
            if data.len() < needed {
                return Err(BackendError::Other(format!(
                    "Short buffer: {} < {} bytes",
                    data.len(),
                    needed
                )));
            }
            let mut frame = CameraFrame::new(width, height, pixel_format, data[..needed].to_vec());
            frame.stride = stride;
            Ok(frame)
        }
    }
}

#[derive(Clone, Copy)]
enum Packed422 {
    Yuyv,
    Uyvy,
}

/// Convert packed 4:2:2 to tightly packed RGB24
///
/// Each 4-byte group encodes 2 pixels sharing chroma. BT.601 coefficients.
fn packed_422_to_rgb(data: &[u8], width: u32, height: u32, stride: u32, layout: Packed422) -> Vec<u8> {
    let w = width as usize;
    let stride = stride.max(width * 2);
    let mut rgb = Vec::with_capacity(w * height as usize * 3);

    for row in 0..height as usize {
        let start = row * stride as usize;
        let Some(line) = data.get(start..start + w * 2) else {
            // Truncated buffer: pad the remaining rows with black
            rgb.resize(w * height as usize * 3, 0);
            break;
        };

        for chunk in line.chunks_exact(4) {
            let (y0, u, y1, v) = match layout {
                Packed422::Yuyv => (chunk[0], chunk[1], chunk[2], chunk[3]),
                Packed422::Uyvy => (chunk[1], chunk[0], chunk[3], chunk[2]),
            };
            for y in [y0, y1] {
                let (r, g, b) = yuv_to_rgb(y, u, v);
                rgb.extend_from_slice(&[r, g, b]);
            }
        }
    }

    rgb
}

/// Convert YUV (BT.601) to RGB
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_mapping() {
        assert_eq!(RawFormat::from_fourcc(b"MJPG"), Some(RawFormat::Mjpeg));
        assert_eq!(RawFormat::from_fourcc(b"YUYV"), Some(RawFormat::Yuyv));
        assert_eq!(RawFormat::from_fourcc(b"H264"), None);
    }

    #[test]
    fn test_yuyv_gray_pixels() {
        // Neutral chroma: RGB equals luma
        let data = [100, 128, 200, 128];
        let frame = decode(RawFormat::Yuyv, &data, 2, 1, 4).unwrap();
        assert_eq!(frame.pixel_rgb(0, 0), (100, 100, 100));
        assert_eq!(frame.pixel_rgb(1, 0), (200, 200, 200));
    }

    #[test]
    fn test_uyvy_matches_yuyv() {
        let yuyv = decode(RawFormat::Yuyv, &[90, 60, 120, 200], 2, 1, 4).unwrap();
        let uyvy = decode(RawFormat::Uyvy, &[60, 90, 200, 120], 2, 1, 4).unwrap();
        assert_eq!(yuyv.data, uyvy.data);
    }

    #[test]
    fn test_short_grey_buffer_rejected() {
        assert!(decode(RawFormat::Grey, &[0; 3], 2, 2, 2).is_err());
    }

    #[test]
    fn test_mjpeg_roundtrip_dimensions() {
        let img = image::RgbImage::from_pixel(8, 4, image::Rgb([200, 10, 10]));
        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 90)
            .encode(img.as_raw(), 8, 4, image::ExtendedColorType::Rgb8)
            .unwrap();
        let frame = decode(RawFormat::Mjpeg, &jpeg, 0, 0, 0).unwrap();
        assert_eq!((frame.width, frame.height), (8, 4));
    }
}
