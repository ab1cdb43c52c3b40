use std::path::Path;

use anyhow::Context;
use ffmpeg_next::Rational;

use crate::{metadata::Fourcc, packet::RawPacket};

/// Muxer writing one or more encoded streams into a container file.
pub struct AvOutput {
    inner: ffmpeg_next::format::context::Output,
    have_written_header: bool,
    have_written_trailer: bool,
}

impl AvOutput {
    /// Container format is guessed from the file extension.
    pub fn new(path: &Path) -> anyhow::Result<Self> {
        let output = ffmpeg_next::format::output(path)
            .with_context(|| format!("open output {}", path.display()))?;
        Ok(Self {
            inner: output,
            have_written_header: false,
            have_written_trailer: false,
        })
    }

    /// Whether encoders feeding this container must emit global headers.
    pub fn needs_global_header(&self) -> bool {
        self.inner
            .format()
            .flags()
            .contains(ffmpeg_next::format::flag::Flags::GLOBAL_HEADER)
    }

    /// Whether the container can store `codec` under `fourcc`. Formats
    /// without a tag table take no tag at all.
    pub fn accepts_tag(&self, codec: ffmpeg_next::codec::Id, fourcc: Fourcc) -> bool {
        if fourcc.is_unset() {
            return false;
        }

        let id: ffmpeg_next::ffi::AVCodecID = codec.into();
        unsafe {
            let tags = (*self.inner.format().as_ptr()).codec_tag;
            !tags.is_null() && ffmpeg_next::ffi::av_codec_get_id(tags, fourcc.tag()) == id
        }
    }

    /// Adds a video stream and returns its index in the container. The
    /// stream keeps `fourcc` when the container accepts it for `codec`,
    /// otherwise the muxer picks its default tag.
    pub fn add_video_stream(
        &mut self,
        codec: ffmpeg_next::codec::Id,
        fourcc: Fourcc,
        mut parameters: ffmpeg_next::codec::Parameters,
        time_base: Rational,
        frame_rate: Rational,
    ) -> anyhow::Result<usize> {
        if self.have_written_header {
            anyhow::bail!("cannot add a stream after the header is written");
        }
        if self.accepts_tag(codec, fourcc) {
            unsafe {
                (*parameters.as_mut_ptr()).codec_tag = fourcc.tag();
            }
        } else if !fourcc.is_unset() {
            log::warn!(
                "{} cannot store {:?} as {}, using the default tag",
                self.inner.format().name(),
                codec,
                fourcc
            );
        }
        let mut writer_stream = self.inner.add_stream(ffmpeg_next::encoder::find(codec))?;
        writer_stream.set_parameters(parameters);
        writer_stream.set_time_base(time_base);
        writer_stream.set_avg_frame_rate(frame_rate);
        writer_stream.set_rate(frame_rate);
        Ok(writer_stream.index())
    }

    pub fn write_header(&mut self) -> anyhow::Result<()> {
        if !self.have_written_header {
            self.inner.write_header()?;
            self.have_written_header = true;
        }
        Ok(())
    }

    pub fn write_packet(&mut self, stream_index: usize, mut packet: RawPacket) -> anyhow::Result<()> {
        self.write_header()?;
        let time_base = packet.time_base();
        let out_time_base = self
            .inner
            .stream(stream_index)
            .map(|stream| stream.time_base())
            .ok_or(anyhow::anyhow!("stream not found: {}", stream_index))?;

        let p = packet.get_mut();
        p.set_stream(stream_index);
        p.set_position(-1);
        p.rescale_ts(time_base, out_time_base);
        p.write_interleaved(&mut self.inner)?;
        Ok(())
    }

    /// Writes the trailer. A header is written first if nothing was muxed,
    /// so an empty output is still a valid container.
    pub fn finish(&mut self) -> anyhow::Result<()> {
        self.write_header()?;
        if !self.have_written_trailer {
            self.have_written_trailer = true;
            self.inner.write_trailer()?;
        }
        Ok(())
    }
}
