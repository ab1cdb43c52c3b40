use ffmpeg_next::{Rational, codec::Parameters, format::stream};

pub struct AvStream {
    index: usize,
    parameters: Parameters,
    time_base: Rational,
    avg_rate: Rational,
    real_rate: Rational,
    frames: i64,
}

impl AvStream {
    pub fn index(&self) -> usize {
        self.index
    }
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
    pub fn time_base(&self) -> Rational {
        self.time_base
    }
    pub fn codec_id(&self) -> ffmpeg_next::codec::Id {
        self.parameters.id()
    }

    /// Frame count declared by the container; 0 when unknown.
    pub fn frames(&self) -> i64 {
        self.frames
    }

    /// Average frame rate, falling back to the base rate when the container
    /// does not declare one. `0/1` when neither is known.
    pub fn rate(&self) -> Rational {
        if is_defined(self.avg_rate) {
            self.avg_rate
        } else if is_defined(self.real_rate) {
            self.real_rate
        } else {
            Rational::new(0, 1)
        }
    }

    pub fn is_video(&self) -> bool {
        self.parameters.medium() == ffmpeg_next::media::Type::Video
    }

    pub fn width(&self) -> u32 {
        unsafe {
            let ptr = self.parameters.as_ptr() as *const ffmpeg_next::ffi::AVCodecParameters;
            (*ptr).width.max(0) as u32
        }
    }

    pub fn height(&self) -> u32 {
        unsafe {
            let ptr = self.parameters.as_ptr() as *const ffmpeg_next::ffi::AVCodecParameters;
            (*ptr).height.max(0) as u32
        }
    }

    /// Container fourcc (AVCodecParameters.codec_tag), not exposed by ffmpeg-next.
    pub fn codec_tag(&self) -> u32 {
        unsafe {
            let ptr = self.parameters.as_ptr() as *const ffmpeg_next::ffi::AVCodecParameters;
            (*ptr).codec_tag
        }
    }
}

fn is_defined(rate: Rational) -> bool {
    rate.numerator() > 0 && rate.denominator() > 0
}

impl From<stream::Stream<'_>> for AvStream {
    fn from(stream: stream::Stream<'_>) -> Self {
        Self {
            index: stream.index(),
            parameters: stream.parameters(),
            time_base: stream.time_base(),
            avg_rate: stream.avg_frame_rate(),
            real_rate: stream.rate(),
            frames: stream.frames(),
        }
    }
}

impl Clone for AvStream {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            parameters: self.parameters.clone(),
            time_base: self.time_base,
            avg_rate: self.avg_rate,
            real_rate: self.real_rate,
            frames: self.frames,
        }
    }
}
