use std::path::{Path, PathBuf};

use crate::{sink::VideoSink, source::StopReason, source::VideoSource, transform::FrameTransform};

/// Outcome of one decode -> transform -> encode run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub transform: &'static str,
    pub output: PathBuf,
    pub frames: u64,
    pub stop: StopReason,
}

/// Decodes every frame of `input`, applies `transform` and encodes the result
/// into `output` with the input's codec, frame rate and size.
///
/// Both files are closed on every exit path. A frame that fails to demux or
/// decode ends the run like end of stream does; it is reported in
/// [`PipelineReport::stop`] rather than as an error.
pub fn run_pipeline(
    input: &Path,
    output: &Path,
    transform: &FrameTransform,
) -> anyhow::Result<PipelineReport> {
    let mut source = VideoSource::open(input)?;
    let parameters = *source.parameters();
    let mut sink = VideoSink::create(output, &parameters, transform.layout())?;

    log::info!(
        "{}: {} -> {} ({})",
        transform.name(),
        input.display(),
        output.display(),
        parameters
    );

    while let Some(frame) = source.read_frame() {
        let converted = transform.apply(&frame);
        sink.write(&converted)?;
        log::trace!("{}: frame {}", transform.name(), sink.frames_written());
    }
    sink.finish()?;

    let stop = source
        .stop_reason()
        .cloned()
        .unwrap_or(StopReason::EndOfStream);
    let frames = sink.frames_written();
    log::info!(
        "{}: wrote {} frames to {} ({})",
        transform.name(),
        frames,
        output.display(),
        stop
    );

    Ok(PipelineReport {
        transform: transform.name(),
        output: output.to_path_buf(),
        frames,
        stop,
    })
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
