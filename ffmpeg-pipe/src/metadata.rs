//! Media file metadata (similar to ffprobe) and the video parameters a
//! pipeline needs to open a matching sink.

use std::fmt;
use std::path::Path;

use anyhow::Context;
use ffmpeg_next::Rational;

use crate::{source::VideoSource, stream::AvStream};

/// Four-character code identifying a compression format inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fourcc(u32);

impl Fourcc {
    pub fn from_tag(tag: u32) -> Self {
        Self(tag)
    }

    pub fn from_chars(chars: &[u8; 4]) -> Self {
        Self(u32::from_le_bytes(*chars))
    }

    pub fn tag(&self) -> u32 {
        self.0
    }

    /// Containers without per-stream tags (e.g. Matroska) report 0.
    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Fourcc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_le_bytes();
        if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            for b in bytes {
                write!(f, "{}", b as char)?;
            }
            Ok(())
        } else {
            write!(f, "0x{:08x}", self.0)
        }
    }
}

/// Stream properties fixed for the lifetime of an input and reused for
/// every output derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoParameters {
    pub fourcc: Fourcc,
    pub codec: ffmpeg_next::codec::Id,
    pub frame_rate: Rational,
    pub width: u32,
    pub height: u32,
}

impl VideoParameters {
    /// Fails instead of returning zeroed geometry or rate.
    pub fn from_stream(stream: &AvStream) -> anyhow::Result<Self> {
        if !stream.is_video() {
            anyhow::bail!("stream {} is not a video stream", stream.index());
        }
        let (width, height) = (stream.width(), stream.height());
        if width == 0 || height == 0 {
            anyhow::bail!("invalid video size {}x{}", width, height);
        }
        let frame_rate = stream.rate();
        if frame_rate.numerator() <= 0 || frame_rate.denominator() <= 0 {
            anyhow::bail!("stream {} has no usable frame rate", stream.index());
        }
        Ok(Self {
            fourcc: Fourcc::from_tag(stream.codec_tag()),
            codec: stream.codec_id(),
            frame_rate,
            width,
            height,
        })
    }

    pub fn fps(&self) -> f64 {
        self.frame_rate.numerator() as f64 / self.frame_rate.denominator() as f64
    }
}

impl fmt::Display for VideoParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "codec={:?} fourcc={} fps={}/{} size={}x{}",
            self.codec,
            self.fourcc,
            self.frame_rate.numerator(),
            self.frame_rate.denominator(),
            self.width,
            self.height
        )
    }
}

/// Opens `path` as a pipeline source and returns its parameters.
pub fn probe_parameters(path: &Path) -> anyhow::Result<VideoParameters> {
    let source = VideoSource::open(path)?;
    Ok(*source.parameters())
}

/// Format-level info (corresponds to ffprobe format).
#[derive(Debug, Clone)]
pub struct FormatInfo {
    /// Format name, e.g. "avi"
    pub format_name: String,
    /// Duration in seconds; None if unknown.
    pub duration_sec: Option<f64>,
    /// Total bitrate in bps; 0 if unknown.
    pub bit_rate: i64,
    pub nb_streams: u32,
}

/// Per-stream info (corresponds to ffprobe stream).
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub index: usize,
    /// "video" | "audio" | "subtitle" etc.
    pub codec_type: String,
    pub codec_name: String,
    pub fourcc: Fourcc,
    /// e.g. "1/10"
    pub time_base: String,
    /// e.g. "10/1"
    pub rate: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Frame count declared by the container, if any.
    pub frames: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub format: FormatInfo,
    pub streams: Vec<StreamInfo>,
}

impl MediaInfo {
    pub fn video_stream(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.codec_type == "video")
    }
}

impl fmt::Display for MediaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[FORMAT]")?;
        writeln!(f, "format_name={}", self.format.format_name)?;
        if let Some(d) = self.format.duration_sec {
            writeln!(f, "duration_sec={:.3}", d)?;
        } else {
            writeln!(f, "duration_sec=N/A")?;
        }
        writeln!(f, "bit_rate={}", self.format.bit_rate)?;
        writeln!(f, "nb_streams={}", self.format.nb_streams)?;
        writeln!(f, "[/FORMAT]")?;
        for s in &self.streams {
            writeln!(f, "[STREAM]")?;
            writeln!(f, "index={}", s.index)?;
            writeln!(f, "codec_type={}", s.codec_type)?;
            writeln!(f, "codec_name={}", s.codec_name)?;
            writeln!(f, "codec_tag={}", s.fourcc)?;
            writeln!(f, "time_base={}", s.time_base)?;
            writeln!(f, "rate={}", s.rate)?;
            if let Some(w) = s.width {
                writeln!(f, "width={}", w)?;
            }
            if let Some(h) = s.height {
                writeln!(f, "height={}", h)?;
            }
            if let Some(n) = s.frames {
                writeln!(f, "nb_frames={}", n)?;
            }
            writeln!(f, "[/STREAM]")?;
        }
        Ok(())
    }
}

/// Opens a file and returns media metadata (similar to ffprobe).
pub fn probe(path: &Path) -> anyhow::Result<MediaInfo> {
    let input = ffmpeg_next::format::input(path)
        .with_context(|| format!("probe {}", path.display()))?;

    let format_name = input.format().name().to_string();
    let nb_streams = input.nb_streams();
    let bit_rate = input.bit_rate();
    // AV_TIME_BASE = 1_000_000; duration is in 1/AV_TIME_BASE seconds
    let duration_sec = {
        let d = input.duration();
        if d == ffmpeg_next::ffi::AV_NOPTS_VALUE as i64 || d <= 0 {
            None
        } else {
            Some(d as f64 / 1_000_000.0)
        }
    };

    let mut streams = Vec::with_capacity(nb_streams as usize);
    for stream in input.streams() {
        let av_stream = AvStream::from(stream);
        let params = av_stream.parameters();
        let time_base = av_stream.time_base();
        let rate = av_stream.rate();
        let (width, height) = if av_stream.is_video() {
            (Some(av_stream.width()), Some(av_stream.height()))
        } else {
            (None, None)
        };

        streams.push(StreamInfo {
            index: av_stream.index(),
            codec_type: format!("{:?}", params.medium()).to_lowercase(),
            codec_name: format!("{:?}", params.id()).to_lowercase(),
            fourcc: Fourcc::from_tag(av_stream.codec_tag()),
            time_base: format!("{}/{}", time_base.numerator(), time_base.denominator()),
            rate: format!("{}/{}", rate.numerator(), rate.denominator()),
            width,
            height,
            frames: (av_stream.frames() > 0).then_some(av_stream.frames()),
        });
    }

    Ok(MediaInfo {
        format: FormatInfo {
            format_name,
            duration_sec,
            bit_rate,
            nb_streams,
        },
        streams,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_display() {
        assert_eq!(Fourcc::from_chars(b"XVID").to_string(), "XVID");
        assert_eq!(Fourcc::from_chars(b"XVID").tag(), 0x4449_5658);
        assert_eq!(Fourcc::from_tag(0).to_string(), "0x00000000");
        assert!(Fourcc::default().is_unset());
    }

    #[test]
    fn test_parameters_display() {
        let params = VideoParameters {
            fourcc: Fourcc::from_chars(b"FFV1"),
            codec: ffmpeg_next::codec::Id::FFV1,
            frame_rate: Rational::new(25, 1),
            width: 64,
            height: 48,
        };
        assert_eq!(params.fps(), 25.0);
        assert_eq!(
            params.to_string(),
            "codec=FFV1 fourcc=FFV1 fps=25/1 size=64x48"
        );
    }
}
