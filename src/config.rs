use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::convert::OutputKind;

/// Input location and the identifiers every output file name carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    input: PathBuf,
    output_dir: PathBuf,
    first_id: String,
    second_id: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self::new("atrium.avi", ".", "203135058", "203764170")
    }
}

impl ConvertConfig {
    pub fn new(
        input: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        first_id: &str,
        second_id: &str,
    ) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            first_id: first_id.to_string(),
            second_id: second_id.to_string(),
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<output_dir>/<id1>_<id2>_<input stem>_<suffix>.<input extension>`
    pub fn output_path(&self, kind: OutputKind) -> PathBuf {
        let stem = self
            .input
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        let mut name = format!(
            "{}_{}_{}_{}",
            self.first_id,
            self.second_id,
            stem,
            kind.suffix()
        );
        if let Some(ext) = self.input.extension() {
            name.push('.');
            name.push_str(&ext.to_string_lossy());
        }
        self.output_dir.join(name)
    }
}

pub fn config() -> &'static ConvertConfig {
    static CONFIG: LazyLock<ConvertConfig> = LazyLock::new(ConvertConfig::default);
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_names() {
        let config = config();
        assert_eq!(config.input(), Path::new("atrium.avi"));
        assert_eq!(
            config.output_path(OutputKind::Grayscale),
            Path::new("./203135058_203764170_atrium_grayscale.avi")
        );
        assert_eq!(
            config.output_path(OutputKind::BlackAndWhite),
            Path::new("./203135058_203764170_atrium_black_and_white.avi")
        );
        assert_eq!(
            config.output_path(OutputKind::Sobel),
            Path::new("./203135058_203764170_atrium_sobel.avi")
        );
    }

    #[test]
    fn test_output_name_keeps_input_extension() {
        let config = ConvertConfig::new("/videos/hall.mkv", "/tmp/out", "1", "2");
        assert_eq!(
            config.output_path(OutputKind::Sobel),
            Path::new("/tmp/out/1_2_hall_sobel.mkv")
        );

        let config = ConvertConfig::new("clip", "out", "a", "b");
        assert_eq!(
            config.output_path(OutputKind::Grayscale),
            Path::new("out/a_b_clip_grayscale")
        );
    }
}
