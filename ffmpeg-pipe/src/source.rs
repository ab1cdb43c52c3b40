use std::fmt;
use std::path::{Path, PathBuf};

use crate::{
    decoder::Decoder,
    frame::{ChannelLayout, Frame, RawVideoFrame},
    input::AvInput,
    metadata::VideoParameters,
    scaler::Scaler,
};

/// Why a source stopped yielding frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    /// A packet could not be demuxed or decoded. Reading stops exactly as it
    /// does at end of stream; the message is kept for diagnostics only.
    ReadError(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndOfStream => write!(f, "end of stream"),
            StopReason::ReadError(msg) => write!(f, "read error: {}", msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Reading,
    Draining,
    Exhausted,
}

/// Forward-only sequence of decoded frames from the primary video stream of
/// a file, converted to one fixed channel layout at the stream's size.
pub struct VideoSource {
    path: PathBuf,
    input: AvInput,
    decoder: Decoder,
    scaler: Option<Scaler>,
    parameters: VideoParameters,
    layout: ChannelLayout,
    state: State,
    stop: Option<StopReason>,
    frames: u64,
}

impl VideoSource {
    /// Opens `path` yielding colour frames.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        Self::open_with_layout(path, ChannelLayout::Color)
    }

    pub fn open_with_layout(path: &Path, layout: ChannelLayout) -> anyhow::Result<Self> {
        let input = AvInput::new(path)?;
        let stream = input
            .video_stream()
            .ok_or_else(|| anyhow::anyhow!("no video stream in {}", path.display()))?
            .clone();
        let parameters = VideoParameters::from_stream(&stream)
            .map_err(|e| anyhow::anyhow!("probe {}: {:#}", path.display(), e))?;
        let decoder = Decoder::new(&stream)
            .map_err(|e| anyhow::anyhow!("open decoder for {}: {:#}", path.display(), e))?;

        log::debug!("source opened: {} ({})", path.display(), parameters);

        Ok(Self {
            path: path.to_path_buf(),
            input,
            decoder,
            scaler: None,
            parameters,
            layout,
            state: State::Reading,
            stop: None,
            frames: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parameters(&self) -> &VideoParameters {
        &self.parameters
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn frames_read(&self) -> u64 {
        self.frames
    }

    /// Set once `read_frame` has returned `None`.
    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop.as_ref()
    }

    /// Returns the next frame in presentation order, or `None` once the
    /// stream is exhausted. A demux or decode failure also ends the stream;
    /// see [`VideoSource::stop_reason`].
    pub fn read_frame(&mut self) -> Option<Frame> {
        loop {
            if self.state == State::Exhausted {
                return None;
            }

            match self.decoder.receive_frame() {
                Ok(Some(raw)) => {
                    return match self.convert(raw) {
                        Ok(frame) => {
                            self.frames += 1;
                            Some(frame)
                        }
                        Err(e) => self.stop(StopReason::ReadError(format!("{:#}", e))),
                    };
                }
                Ok(None) => {}
                Err(e) => return self.stop(StopReason::ReadError(format!("{:#}", e))),
            }

            match self.state {
                State::Draining => return self.stop(StopReason::EndOfStream),
                State::Reading => match self.input.read_packet() {
                    Ok(Some(packet)) => {
                        if packet.index() != self.decoder.stream_index() {
                            continue;
                        }
                        if let Err(e) = self.decoder.send_packet(packet) {
                            return self.stop(StopReason::ReadError(format!("{:#}", e)));
                        }
                    }
                    Ok(None) => {
                        if let Err(e) = self.decoder.send_eof() {
                            return self.stop(StopReason::ReadError(format!("{:#}", e)));
                        }
                        self.state = State::Draining;
                    }
                    Err(e) => return self.stop(StopReason::ReadError(format!("{:#}", e))),
                },
                State::Exhausted => return None,
            }
        }
    }

    /// Iterates the remaining frames.
    pub fn frames(&mut self) -> impl Iterator<Item = Frame> + '_ {
        std::iter::from_fn(move || self.read_frame())
    }

    fn stop(&mut self, reason: StopReason) -> Option<Frame> {
        match &reason {
            StopReason::EndOfStream => {
                log::debug!("{}: end of stream after {} frames", self.path.display(), self.frames)
            }
            StopReason::ReadError(msg) => log::warn!(
                "{}: stopped reading after {} frames: {}",
                self.path.display(),
                self.frames,
                msg
            ),
        }
        self.state = State::Exhausted;
        self.stop = Some(reason);
        None
    }

    fn convert(&mut self, mut raw: RawVideoFrame) -> anyhow::Result<Frame> {
        let target = self.layout.pixel();
        let (width, height) = (self.parameters.width, self.parameters.height);
        if raw.format() == target && raw.width() == width && raw.height() == height {
            return Frame::from_raw(&raw);
        }

        let frame = raw.get_mut();
        if !self.scaler.as_ref().is_some_and(|scaler| scaler.accepts(frame)) {
            self.scaler = Some(Scaler::new(
                frame.format(),
                frame.width(),
                frame.height(),
                target,
                width,
                height,
            )?);
        }
        let mut converted = ffmpeg_next::frame::Video::empty();
        if let Some(scaler) = self.scaler.as_mut() {
            scaler.run(frame, &mut converted)?;
        }
        Frame::from_raw(&RawVideoFrame::from(converted))
    }
}
