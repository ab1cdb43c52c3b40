use std::path::{Path, PathBuf};

use crate::{
    encoder::{Encoder, Settings},
    frame::{ChannelLayout, Frame},
    metadata::VideoParameters,
    output::AvOutput,
};

/// Encodes frames of one fixed geometry and layout into a container file.
///
/// The container header is written on creation so that a sink closed without
/// any frame still leaves a valid, empty video behind. `finish` flushes the
/// encoder and writes the trailer; dropping an unfinished sink does the same
/// on a best-effort basis.
pub struct VideoSink {
    path: PathBuf,
    output: AvOutput,
    encoder: Encoder,
    stream_index: usize,
    width: u32,
    height: u32,
    layout: ChannelLayout,
    frames: u64,
    finished: bool,
}

impl VideoSink {
    pub fn create(
        path: &Path,
        parameters: &VideoParameters,
        layout: ChannelLayout,
    ) -> anyhow::Result<Self> {
        let mut output = AvOutput::new(path)?;
        let settings = Settings {
            width: parameters.width,
            height: parameters.height,
            frame_rate: parameters.frame_rate,
            codec: parameters.codec,
            layout,
        };
        let encoder = Encoder::new(settings, output.needs_global_header(), None)
            .map_err(|e| anyhow::anyhow!("open encoder for {}: {:#}", path.display(), e))?;
        let stream_index = output.add_video_stream(
            parameters.codec,
            parameters.fourcc,
            encoder.parameters(),
            encoder.time_base(),
            parameters.frame_rate,
        )?;
        output
            .write_header()
            .map_err(|e| anyhow::anyhow!("write header {}: {:#}", path.display(), e))?;

        log::debug!(
            "sink opened: {} ({}, {:?})",
            path.display(),
            parameters,
            layout
        );

        Ok(Self {
            path: path.to_path_buf(),
            output,
            encoder,
            stream_index,
            width: parameters.width,
            height: parameters.height,
            layout,
            frames: 0,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Encodes one frame. Frames whose size or layout differ from the ones
    /// declared at creation are rejected.
    pub fn write(&mut self, frame: &Frame) -> anyhow::Result<()> {
        if self.finished {
            anyhow::bail!("sink {} already finished", self.path.display());
        }
        if frame.width() != self.width
            || frame.height() != self.height
            || frame.layout() != self.layout
        {
            anyhow::bail!(
                "frame {}x{} {:?} does not match sink {}x{} {:?}",
                frame.width(),
                frame.height(),
                frame.layout(),
                self.width,
                self.height,
                self.layout
            );
        }
        self.encoder.send_frame(frame.to_raw())?;
        self.drain()?;
        self.frames += 1;
        Ok(())
    }

    pub fn finish(&mut self) -> anyhow::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        // The trailer is written even when flushing the encoder fails.
        let flushed = self.encoder.send_eof().and_then(|_| self.drain());
        let closed = self.output.finish();
        flushed?;
        closed?;
        log::debug!("sink closed: {} ({} frames)", self.path.display(), self.frames);
        Ok(())
    }

    fn drain(&mut self) -> anyhow::Result<()> {
        while let Some(packet) = self.encoder.receive_packet()? {
            self.output.write_packet(self.stream_index, packet)?;
        }
        Ok(())
    }
}

impl Drop for VideoSink {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        log::warn!(
            "sink {} dropped before finish, closing after {} frames",
            self.path.display(),
            self.frames
        );
        if let Err(e) = self.finish() {
            log::error!("close sink {}: {:#}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metadata::Fourcc, source::VideoSource};
    use ffmpeg_next::{Rational, codec::Id};
    use image::{GrayImage, Luma};

    fn gray_parameters() -> VideoParameters {
        VideoParameters {
            fourcc: Fourcc::from_chars(b"FFV1"),
            codec: Id::FFV1,
            frame_rate: Rational::new(5, 1),
            width: 16,
            height: 8,
        }
    }

    #[test]
    fn test_trailer_written_when_flush_fails() -> anyhow::Result<()> {
        crate::init()?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("flush.avi");

        let mut sink = VideoSink::create(&path, &gray_parameters(), ChannelLayout::Gray)?;
        let image = GrayImage::from_fn(16, 8, |x, y| Luma([(x * 10 + y) as u8]));
        sink.write(&Frame::Gray(image))?;
        // A second end-of-stream makes the encoder flush in `finish` fail.
        sink.encoder.send_eof()?;
        assert!(sink.finish().is_err());
        sink.finish()?;

        // AVI writes its index with the trailer.
        let bytes = std::fs::read(&path)?;
        assert!(bytes.windows(4).any(|w| w == b"idx1"));

        let mut source = VideoSource::open_with_layout(&path, ChannelLayout::Gray)?;
        assert_eq!(source.frames().count(), 1);
        Ok(())
    }
}
