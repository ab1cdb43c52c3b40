use ffmpeg_pipe::{
    PipelineReport, run_pipeline,
    transform::{BLACK_AND_WHITE, FrameTransform, GRAYSCALE, SOBEL},
};

use crate::config::ConvertConfig;

/// The derived videos written for every input, in conversion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Grayscale,
    BlackAndWhite,
    Sobel,
}

impl OutputKind {
    pub const ALL: [OutputKind; 3] = [
        OutputKind::Grayscale,
        OutputKind::BlackAndWhite,
        OutputKind::Sobel,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            OutputKind::Grayscale => "grayscale",
            OutputKind::BlackAndWhite => "black_and_white",
            OutputKind::Sobel => "sobel",
        }
    }

    pub fn transform(self) -> FrameTransform {
        match self {
            OutputKind::Grayscale => GRAYSCALE,
            OutputKind::BlackAndWhite => BLACK_AND_WHITE,
            OutputKind::Sobel => SOBEL,
        }
    }
}

/// Runs the three conversions one after another. The first failing
/// conversion aborts the rest.
pub fn convert_all(config: &ConvertConfig) -> anyhow::Result<Vec<PipelineReport>> {
    let mut reports = Vec::with_capacity(OutputKind::ALL.len());
    for kind in OutputKind::ALL {
        let output = config.output_path(kind);
        let report = run_pipeline(config.input(), &output, &kind.transform())?;
        reports.push(report);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_next::{Rational, codec::Id};
    use ffmpeg_pipe::{
        ChannelLayout, Fourcc, Frame, StopReason, VideoParameters, VideoSink, probe_parameters,
    };
    use image::{Rgb, RgbImage};

    fn write_input(path: &std::path::Path, frames: u32) -> anyhow::Result<()> {
        let parameters = VideoParameters {
            fourcc: Fourcc::from_chars(b"FFV1"),
            codec: Id::FFV1,
            frame_rate: Rational::new(15, 1),
            width: 32,
            height: 24,
        };
        let mut sink = VideoSink::create(path, &parameters, ChannelLayout::Color)?;
        for i in 0..frames {
            let image = RgbImage::from_fn(32, 24, |x, y| {
                Rgb([(x * 8 + i) as u8, (y * 10) as u8, ((x ^ y) * 4) as u8])
            });
            sink.write(&Frame::Color(image))?;
        }
        sink.finish()
    }

    #[test]
    fn test_kind_transforms() {
        assert_eq!(OutputKind::Grayscale.transform().layout(), ChannelLayout::Gray);
        assert_eq!(OutputKind::BlackAndWhite.transform().layout(), ChannelLayout::Color);
        assert_eq!(OutputKind::Sobel.transform().name(), "sobel");
        for kind in OutputKind::ALL {
            assert_eq!(kind.suffix(), kind.transform().name());
        }
    }

    #[test]
    fn test_convert_all_writes_three_outputs() -> anyhow::Result<()> {
        ffmpeg_pipe::init()?;
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("hall.avi");
        write_input(&input, 4)?;

        let config = ConvertConfig::new(&input, dir.path(), "11", "22");
        let reports = convert_all(&config)?;
        assert_eq!(reports.len(), 3);
        for (kind, report) in OutputKind::ALL.into_iter().zip(&reports) {
            assert_eq!(report.transform, kind.suffix());
            assert_eq!(report.output, dir.path().join(format!("11_22_hall_{}.avi", kind.suffix())));
            assert_eq!(report.frames, 4);
            assert_eq!(report.stop, StopReason::EndOfStream);

            let params = probe_parameters(&report.output)?;
            assert_eq!((params.width, params.height), (32, 24));
            assert_eq!(params.frame_rate, Rational::new(15, 1));
        }
        Ok(())
    }

    #[test]
    fn test_convert_all_missing_input() -> anyhow::Result<()> {
        ffmpeg_pipe::init()?;
        let dir = tempfile::tempdir()?;
        let config = ConvertConfig::new(dir.path().join("nope.avi"), dir.path(), "1", "2");
        assert!(convert_all(&config).is_err());
        assert!(!config.output_path(OutputKind::Grayscale).exists());
        Ok(())
    }
}
