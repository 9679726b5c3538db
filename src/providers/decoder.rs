//! QR payload extraction from camera frames.

use super::camera::Frame;

/// Turns raw frame pixels into a QR payload
pub trait QrDecoder: Send + Sync {
    /// Decoded payload, or `None` when the frame holds no readable code
    fn decode(&self, frame: &Frame) -> Option<String>;
}

/// Stand-in decoder for simulated frames: a frame whose pixel buffer is
/// exactly `width * height` bytes of UTF-8 text decodes to that text
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFrameDecoder;

impl QrDecoder for TextFrameDecoder {
    fn decode(&self, frame: &Frame) -> Option<String> {
        let expected = u64::from(frame.width) * u64::from(frame.height);
        if frame.pixels.is_empty() || frame.pixels.len() as u64 != expected {
            return None;
        }
        let text = std::str::from_utf8(&frame.pixels).ok()?.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_text_frames() {
        let frame = Frame::from_text("SAFRASPHERE_CHARGER_KARUR_001");
        assert_eq!(
            TextFrameDecoder.decode(&frame).as_deref(),
            Some("SAFRASPHERE_CHARGER_KARUR_001")
        );
    }

    #[test]
    fn ignores_frames_without_a_code() {
        let blank = Frame {
            width: 4,
            height: 2,
            pixels: vec![0xff; 8],
        };
        assert_eq!(TextFrameDecoder.decode(&blank), None);

        let truncated = Frame {
            width: 10,
            height: 10,
            pixels: b"abc".to_vec(),
        };
        assert_eq!(TextFrameDecoder.decode(&truncated), None);
        assert_eq!(TextFrameDecoder.decode(&Frame::from_text("   ")), None);
    }
}
