use crate::{
    filter,
    frame::{ChannelLayout, Frame},
};

/// A stateless per-frame pixel transform together with the channel layout
/// of the frames it produces.
#[derive(Debug, Clone, Copy)]
pub struct FrameTransform {
    name: &'static str,
    layout: ChannelLayout,
    apply: fn(&Frame) -> Frame,
}

impl FrameTransform {
    pub const fn new(name: &'static str, layout: ChannelLayout, apply: fn(&Frame) -> Frame) -> Self {
        Self {
            name,
            layout,
            apply,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Layout every output frame has, and the layout the sink is opened in.
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn apply(&self, frame: &Frame) -> Frame {
        (self.apply)(frame)
    }
}

/// Single-channel luminance.
pub const GRAYSCALE: FrameTransform =
    FrameTransform::new("grayscale", ChannelLayout::Gray, grayscale);

/// Otsu-binarized luminance, replicated to three channels.
pub const BLACK_AND_WHITE: FrameTransform =
    FrameTransform::new("black_and_white", ChannelLayout::Color, black_and_white);

/// Saturated 5x5 d2/dxdy response of the luminance, replicated to three
/// channels.
pub const SOBEL: FrameTransform = FrameTransform::new("sobel", ChannelLayout::Color, sobel);

fn grayscale(frame: &Frame) -> Frame {
    Frame::Gray(filter::luminance(frame))
}

fn black_and_white(frame: &Frame) -> Frame {
    let (threshold, mask) = filter::otsu_binarize(&filter::luminance(frame));
    log::trace!("otsu threshold: {}", threshold);
    Frame::Color(filter::gray_to_rgb(&mask))
}

fn sobel(frame: &Frame) -> Frame {
    let edges = filter::sobel_xy(&filter::luminance(frame));
    Frame::Color(filter::gray_to_rgb(&edges))
}
