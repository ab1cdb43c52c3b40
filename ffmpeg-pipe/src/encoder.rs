use ffmpeg_next::{Dictionary, Rational, format::Pixel};

use crate::{frame::ChannelLayout, frame::RawVideoFrame, packet::RawPacket, scaler::Scaler};

#[derive(Debug, Clone)]
pub struct Settings {
    pub width: u32,
    pub height: u32,
    pub frame_rate: Rational,
    pub codec: ffmpeg_next::codec::Id,
    /// Layout of the frames that will be fed to the encoder.
    pub layout: ChannelLayout,
}

const GRAY_FORMATS: &[Pixel] = &[Pixel::GRAY8];

// Packed formats with an alpha byte come before padded ones: swscale has
// exact byte-shuffle paths for them.
const COLOR_FORMATS: &[Pixel] = &[
    Pixel::RGB24,
    Pixel::BGR24,
    Pixel::BGRA,
    Pixel::RGBA,
    Pixel::ARGB,
    Pixel::ABGR,
    Pixel::GBRP,
    Pixel::BGRZ,
    Pixel::RGBZ,
    Pixel::YUV444P,
];

/// Picks the pixel format the encoder should run in: the layout's own packed
/// format when supported, then the closest lossless relative, then whatever
/// the encoder lists first.
pub fn pixel_format_for_encoder(codec: &ffmpeg_next::Codec, layout: ChannelLayout) -> Pixel {
    let supported: Vec<Pixel> = match codec.video() {
        Ok(video) => video.formats().map(|formats| formats.collect()).unwrap_or_default(),
        Err(_) => Vec::new(),
    };
    if supported.is_empty() {
        return layout.pixel();
    }

    let preferred = match layout {
        ChannelLayout::Gray => GRAY_FORMATS,
        ChannelLayout::Color => COLOR_FORMATS,
    };
    preferred
        .iter()
        .copied()
        .find(|format| supported.contains(format))
        .unwrap_or(supported[0])
}

pub struct Encoder {
    inner: ffmpeg_next::codec::encoder::Video,
    settings: Settings,
    format: Pixel,
    encoder_time_base: Rational,
    frame_index: i64,
    scaler: Option<Scaler>,
}

impl Encoder {
    pub fn new(
        settings: Settings,
        global_header: bool,
        options: Option<Dictionary>,
    ) -> anyhow::Result<Self> {
        let codec = ffmpeg_next::encoder::find(settings.codec)
            .ok_or(anyhow::anyhow!("encoder not found: {:?}", settings.codec))?;
        let format = pixel_format_for_encoder(&codec, settings.layout);

        let mut encoder = ffmpeg_next::codec::Context::new_with_codec(codec)
            .encoder()
            .video()?;
        encoder.set_width(settings.width);
        encoder.set_height(settings.height);
        encoder.set_format(format);
        encoder.set_frame_rate(Some(settings.frame_rate));
        encoder.set_time_base(settings.frame_rate.invert());
        if global_header {
            encoder.set_flags(ffmpeg_next::codec::flag::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder.open_with(options.unwrap_or_default())?;
        log::info!(
            "encoder opened: {} ({:?} -> {:?}, {}x{})",
            codec.name(),
            settings.layout,
            format,
            settings.width,
            settings.height
        );

        let encoder_time_base: Rational = unsafe { (*encoder.0.as_ptr()).time_base.into() };

        Ok(Self {
            inner: encoder,
            settings,
            format,
            encoder_time_base,
            frame_index: 0,
            scaler: None,
        })
    }

    pub fn time_base(&self) -> Rational {
        self.encoder_time_base
    }

    /// Codec parameters to copy onto the output stream.
    pub fn parameters(&self) -> ffmpeg_next::codec::Parameters {
        ffmpeg_next::codec::Parameters::from(&self.inner)
    }

    /// Sends one frame, converting it to the encoder pixel format first when
    /// needed. Timestamps are the frame's position in the sequence.
    pub fn send_frame(&mut self, mut frame: RawVideoFrame) -> anyhow::Result<()> {
        let f = frame.get_mut();
        if f.format() != self.format {
            if !self.scaler.as_ref().is_some_and(|scaler| scaler.accepts(f)) {
                self.scaler = Some(Scaler::new(
                    f.format(),
                    f.width(),
                    f.height(),
                    self.format,
                    self.settings.width,
                    self.settings.height,
                )?);
            }
            let mut converted = ffmpeg_next::frame::Video::empty();
            if let Some(scaler) = self.scaler.as_mut() {
                scaler.run(f, &mut converted)?;
            }
            converted.set_pts(Some(self.frame_index));
            self.inner.send_frame(&converted)?;
        } else {
            f.set_pts(Some(self.frame_index));
            self.inner.send_frame(f)?;
        }
        self.frame_index += 1;
        Ok(())
    }

    pub fn send_eof(&mut self) -> anyhow::Result<()> {
        self.inner.send_eof()?;
        Ok(())
    }

    /// Pulls one encoded packet. `Ok(None)` means the encoder needs more
    /// input or has been fully drained.
    pub fn receive_packet(&mut self) -> anyhow::Result<Option<RawPacket>> {
        let mut packet = ffmpeg_next::codec::packet::Packet::empty();
        match self.inner.receive_packet(&mut packet) {
            Ok(()) => {
                let mut packet = RawPacket::from((packet, self.encoder_time_base));
                if packet.duration() == 0 {
                    packet.set_duration(1);
                }
                Ok(Some(packet))
            }
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::util::error::EAGAIN => {
                Ok(None)
            }
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_prefers_gray8() -> anyhow::Result<()> {
        crate::init()?;
        let ffv1 = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::FFV1)
            .ok_or(anyhow::anyhow!("ffv1 encoder missing"))?;
        assert_eq!(pixel_format_for_encoder(&ffv1, ChannelLayout::Gray), Pixel::GRAY8);
        let color = pixel_format_for_encoder(&ffv1, ChannelLayout::Color);
        assert!(COLOR_FORMATS.contains(&color), "unexpected ffv1 format {:?}", color);
        Ok(())
    }

    #[test]
    fn test_falls_back_to_first_supported_format() -> anyhow::Result<()> {
        crate::init()?;
        // mpeg4 only takes yuv420p.
        let Some(mpeg4) = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4) else {
            eprintln!("skip: mpeg4 encoder not built");
            return Ok(());
        };
        assert_eq!(pixel_format_for_encoder(&mpeg4, ChannelLayout::Gray), Pixel::YUV420P);
        assert_eq!(pixel_format_for_encoder(&mpeg4, ChannelLayout::Color), Pixel::YUV420P);
        Ok(())
    }
}
