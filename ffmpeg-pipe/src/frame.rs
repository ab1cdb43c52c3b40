use ffmpeg_next::format::Pixel;
use image::{GrayImage, RgbImage};

/// Channel layout of a decoded or produced raster frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// One 8-bit luminance channel.
    Gray,
    /// Three 8-bit channels in R, G, B order.
    Color,
}

impl ChannelLayout {
    pub fn channels(self) -> usize {
        match self {
            ChannelLayout::Gray => 1,
            ChannelLayout::Color => 3,
        }
    }

    /// Packed FFmpeg pixel format carrying this layout.
    pub fn pixel(self) -> Pixel {
        match self {
            ChannelLayout::Gray => Pixel::GRAY8,
            ChannelLayout::Color => Pixel::RGB24,
        }
    }
}

/// A raster frame owned by the caller. Frames have no identity beyond their
/// position in the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Gray(GrayImage),
    Color(RgbImage),
}

impl Frame {
    pub fn width(&self) -> u32 {
        match self {
            Frame::Gray(image) => image.width(),
            Frame::Color(image) => image.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Frame::Gray(image) => image.height(),
            Frame::Color(image) => image.height(),
        }
    }

    pub fn layout(&self) -> ChannelLayout {
        match self {
            Frame::Gray(_) => ChannelLayout::Gray,
            Frame::Color(_) => ChannelLayout::Color,
        }
    }

    pub fn channels(&self) -> usize {
        self.layout().channels()
    }

    pub fn as_gray(&self) -> Option<&GrayImage> {
        match self {
            Frame::Gray(image) => Some(image),
            Frame::Color(_) => None,
        }
    }

    pub fn as_color(&self) -> Option<&RgbImage> {
        match self {
            Frame::Color(image) => Some(image),
            Frame::Gray(_) => None,
        }
    }

    fn samples(&self) -> &[u8] {
        match self {
            Frame::Gray(image) => image.as_raw(),
            Frame::Color(image) => image.as_raw(),
        }
    }

    /// Copies the frame into a freshly allocated FFmpeg frame in the layout's
    /// packed pixel format, honouring the destination line stride.
    pub fn to_raw(&self) -> RawVideoFrame {
        let (width, height) = (self.width(), self.height());
        let row_bytes = width as usize * self.channels();
        let mut video = ffmpeg_next::frame::Video::new(self.layout().pixel(), width, height);
        let stride = video.stride(0);
        let dst = video.data_mut(0);
        for (row, src) in self.samples().chunks_exact(row_bytes.max(1)).enumerate() {
            let start = row * stride;
            dst[start..start + row_bytes].copy_from_slice(src);
        }
        RawVideoFrame::from(video)
    }

    /// Builds a frame from a decoded FFmpeg frame in `GRAY8` or `RGB24`.
    pub fn from_raw(raw: &RawVideoFrame) -> anyhow::Result<Self> {
        let layout = match raw.format() {
            Pixel::GRAY8 => ChannelLayout::Gray,
            Pixel::RGB24 => ChannelLayout::Color,
            other => anyhow::bail!("unsupported pixel format for frame: {:?}", other),
        };
        let (width, height) = (raw.width(), raw.height());
        let samples = raw.packed_plane(width as usize * layout.channels());
        let frame = match layout {
            ChannelLayout::Gray => GrayImage::from_raw(width, height, samples).map(Frame::Gray),
            ChannelLayout::Color => RgbImage::from_raw(width, height, samples).map(Frame::Color),
        };
        frame.ok_or_else(|| anyhow::anyhow!("invalid video size {}x{}", width, height))
    }
}

pub struct RawVideoFrame {
    frame: ffmpeg_next::frame::Video,
}

impl From<ffmpeg_next::frame::Video> for RawVideoFrame {
    fn from(frame: ffmpeg_next::frame::Video) -> Self {
        Self { frame }
    }
}

impl RawVideoFrame {
    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    pub fn format(&self) -> Pixel {
        self.frame.format()
    }

    pub fn get_mut(&mut self) -> &mut ffmpeg_next::frame::Video {
        &mut self.frame
    }

    pub fn as_video(&self) -> &ffmpeg_next::frame::Video {
        &self.frame
    }

    /// First plane with line padding stripped.
    fn packed_plane(&self, row_bytes: usize) -> Vec<u8> {
        let stride = self.frame.stride(0);
        let data = self.frame.data(0);
        let height = self.frame.height() as usize;
        let mut out = Vec::with_capacity(row_bytes * height);
        for row in 0..height {
            let start = row * stride;
            out.extend_from_slice(&data[start..start + row_bytes]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_layout_channels() {
        assert_eq!(ChannelLayout::Gray.channels(), 1);
        assert_eq!(ChannelLayout::Color.channels(), 3);
        assert_eq!(ChannelLayout::Gray.pixel(), Pixel::GRAY8);
        assert_eq!(ChannelLayout::Color.pixel(), Pixel::RGB24);
    }

    #[test]
    fn test_odd_width_survives_stride_padding() -> anyhow::Result<()> {
        // 13 * 3 bytes per row is never a multiple of FFmpeg's line alignment.
        let image = RgbImage::from_fn(13, 7, |x, y| Rgb([x as u8, y as u8, (x * y) as u8]));
        let frame = Frame::Color(image);
        let raw = frame.to_raw();
        assert_eq!(raw.format(), Pixel::RGB24);
        assert!(raw.as_video().stride(0) >= 13 * 3);
        assert_eq!(Frame::from_raw(&raw)?, frame);

        let gray = Frame::Gray(GrayImage::from_fn(5, 3, |x, y| Luma([(x + 10 * y) as u8])));
        assert_eq!(Frame::from_raw(&gray.to_raw())?, gray);
        Ok(())
    }

    #[test]
    fn test_from_raw_rejects_planar_formats() {
        let raw = RawVideoFrame::from(ffmpeg_next::frame::Video::new(Pixel::YUV420P, 16, 16));
        assert!(Frame::from_raw(&raw).is_err());
    }
}
