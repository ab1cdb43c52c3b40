/// Registers FFmpeg components and quiets FFmpeg's own stderr logging.
/// Call once at startup before opening any input or output.
pub fn init() -> anyhow::Result<()> {
    ffmpeg_next::init().map_err(|e| anyhow::anyhow!("ffmpeg_next init: {}", e))?;
    ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);
    Ok(())
}

pub mod decoder;
pub mod encoder;
pub mod filter;
pub mod frame;
pub mod input;
pub mod metadata;
pub mod output;
pub mod packet;
pub mod pipeline;
pub mod scaler;
pub mod sink;
pub mod source;
pub mod stream;
pub mod transform;

pub use frame::{ChannelLayout, Frame};
pub use metadata::{Fourcc, VideoParameters, probe, probe_parameters};
pub use pipeline::{PipelineReport, run_pipeline};
pub use sink::VideoSink;
pub use source::{StopReason, VideoSource};
pub use transform::FrameTransform;
