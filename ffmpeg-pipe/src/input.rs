use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use crate::{packet::RawPacket, stream::AvStream};

/// Demuxer over a media file. Packets are read in container order.
pub struct AvInput {
    inner: ffmpeg_next::format::context::Input,
    streams: HashMap<usize, AvStream>,
    best_video: Option<usize>,
}

impl AvInput {
    pub fn new(path: &Path) -> anyhow::Result<Self> {
        let input = ffmpeg_next::format::input(path)
            .with_context(|| format!("open input {}", path.display()))?;

        let mut streams = HashMap::new();
        for stream in input.streams() {
            streams.insert(stream.index(), AvStream::from(stream));
        }
        let best_video = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .map(|stream| stream.index());

        Ok(Self {
            inner: input,
            streams,
            best_video,
        })
    }

    /// The stream FFmpeg ranks as the primary video stream, if any.
    pub fn video_stream(&self) -> Option<&AvStream> {
        self.best_video.and_then(|index| self.streams.get(&index))
    }

    /// Reads the next packet. `Ok(None)` is end of file; any other demuxer
    /// failure is returned as an error.
    pub fn read_packet(&mut self) -> anyhow::Result<Option<RawPacket>> {
        let mut packet = ffmpeg_next::codec::packet::Packet::empty();
        match packet.read(&mut self.inner) {
            Ok(()) => {
                let time_base = self
                    .streams
                    .get(&packet.stream())
                    .map(|stream| stream.time_base())
                    .ok_or_else(|| anyhow::anyhow!("packet for unknown stream {}", packet.stream()))?;
                Ok(Some((packet, time_base).into()))
            }
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
