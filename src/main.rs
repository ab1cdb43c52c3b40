mod config;
mod convert;

/// Info by default; the FFmpeg plumbing also reports sources and sinks
/// opening and closing. `RUST_LOG` overrides both.
fn log_filters(builder: &mut env_logger::Builder) -> &mut env_logger::Builder {
    builder
        .filter_level(log::LevelFilter::Info)
        .filter_module("ffmpeg_pipe", log::LevelFilter::Debug)
}

fn init_logging() {
    log_filters(&mut env_logger::Builder::from_default_env())
        .parse_default_env()
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    ffmpeg_pipe::init()?;

    let config = config::config();
    match ffmpeg_pipe::probe(config.input()) {
        Ok(info) => log::debug!("{}:\n{}", config.input().display(), info),
        Err(e) => log::debug!("probe {}: {:#}", config.input().display(), e),
    }

    for report in convert::convert_all(config)? {
        log::info!(
            "{} -> {} ({} frames, {})",
            report.transform,
            report.output.display(),
            report.frames,
            report.stop
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Metadata};

    fn enabled(logger: &env_logger::Logger, target: &str, level: Level) -> bool {
        logger.enabled(&Metadata::builder().target(target).level(level).build())
    }

    #[test]
    fn test_log_filters() {
        let logger = log_filters(&mut env_logger::Builder::new()).build();
        assert!(enabled(&logger, "ffmpeg_pipe::sink", Level::Debug));
        assert!(!enabled(&logger, "ffmpeg_pipe::pipeline", Level::Trace));
        assert!(enabled(&logger, "video_filters", Level::Info));
        assert!(!enabled(&logger, "video_filters", Level::Debug));
    }
}
