use crate::av::{CodecType, Demuxer};
use crate::config::Config;
use crate::io::ByteReader;
use crate::{Result, VdkError};

/// Raw elementary stream demuxing
pub mod es;
/// MP4 / QuickTime, plain and fragmented
pub mod mp4;

/// Confidence that a probed buffer belongs to a format, 0 to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProbeScore(pub u8);

impl ProbeScore {
    pub const NONE: ProbeScore = ProbeScore(0);
    /// One plausible frame or header, nothing to back it up.
    pub const WEAK: ProbeScore = ProbeScore(25);
    pub const LIKELY: ProbeScore = ProbeScore(50);
    pub const CERTAIN: ProbeScore = ProbeScore(100);
}

/// Identifies and opens one container or elementary stream format.
///
/// Closing a demuxer is dropping it.
pub trait DemuxerFactory: Send + Sync {
    fn name(&self) -> &'static str;

    /// Scores the first bytes of an input.
    fn probe(&self, data: &[u8]) -> ProbeScore;

    fn open(&self, reader: ByteReader, config: &Config) -> Result<Box<dyn Demuxer>>;
}

/// The set of formats available to [`Registry::open`].
///
/// Built once and passed to whoever opens inputs:
///
/// ```rust
/// use vdkdemux::config::Config;
/// use vdkdemux::format::Registry;
/// use vdkdemux::io::ByteReader;
///
/// # fn main() -> vdkdemux::Result<()> {
/// let registry = Registry::with_defaults(Config::default());
/// let frame = [0xFF, 0xF1, 0x50, 0x80, 0x01, 0x1F, 0xFC, 0x00];
/// let mut demuxer = registry.open(ByteReader::from_bytes(frame.to_vec()))?;
/// assert_eq!(demuxer.streams()[0].format.sample_rate, 44100);
/// assert!(demuxer.read_packet()?.is_some());
/// # Ok(())
/// # }
/// ```
pub struct Registry {
    config: Config,
    factories: Vec<Box<dyn DemuxerFactory>>,
}

impl Registry {
    /// An empty registry.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            factories: Vec::new(),
        }
    }

    /// MP4, ADTS, MPEG audio and MPEG video.
    pub fn with_defaults(config: Config) -> Self {
        let mut registry = Self::new(config);
        registry.register(Box::new(mp4::Mp4Factory));
        registry.register(Box::new(es::AdtsFactory));
        registry.register(Box::new(es::MpaFactory));
        registry.register(Box::new(es::MpegVideoFactory));
        registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Adds a format. On equal probe scores the earlier one wins.
    pub fn register(&mut self, factory: Box<dyn DemuxerFactory>) {
        if self.factories.len() == self.factories.capacity() {
            self.factories.reserve(4);
        }
        self.factories.push(factory);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.factories.iter().map(|f| f.name()).collect()
    }

    /// Codec for an MP4 sample entry fourcc.
    pub fn codec_for_fourcc(&self, fourcc: [u8; 4]) -> CodecType {
        CodecType::from_fourcc(fourcc)
    }

    /// Best-scoring format for `data`, if any scores above zero.
    pub fn probe(&self, data: &[u8]) -> Option<(&dyn DemuxerFactory, ProbeScore)> {
        let mut best: Option<(&dyn DemuxerFactory, ProbeScore)> = None;
        for factory in &self.factories {
            let score = factory.probe(data);
            log::trace!("probe {}: {:?}", factory.name(), score);
            if score > ProbeScore::NONE && best.map_or(true, |(_, s)| score > s) {
                best = Some((factory.as_ref(), score));
            }
        }
        best
    }

    /// Probes the first `probe_size` bytes of `reader` and opens the best
    /// match.
    pub fn open(&self, mut reader: ByteReader) -> Result<Box<dyn Demuxer>> {
        let head = reader.peek(self.config.probe_size)?;
        let (factory, score) = self
            .probe(head)
            .ok_or_else(|| VdkError::UnsupportedFormat("no demuxer recognises the input".into()))?;
        log::debug!("opening input as {} (score {})", factory.name(), score.0);
        factory.open(reader, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Fixed(&'static str, u8);

    impl DemuxerFactory for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn probe(&self, _data: &[u8]) -> ProbeScore {
            ProbeScore(self.1)
        }

        fn open(&self, _reader: ByteReader, _config: &Config) -> Result<Box<dyn Demuxer>> {
            Err(VdkError::UnsupportedFormat(self.0.into()))
        }
    }

    #[test]
    fn test_default_formats() {
        let registry = Registry::with_defaults(Config::default());
        assert_eq!(registry.names(), vec!["mp4", "adts", "mpa", "mpegvideo"]);
        assert_eq!(registry.codec_for_fourcc(*b"vp09"), CodecType::VP9);
    }

    #[test]
    fn test_best_score_wins() {
        let mut registry = Registry::new(Config::default());
        registry.register(Box::new(Fixed("low", 25)));
        registry.register(Box::new(Fixed("high", 50)));
        registry.register(Box::new(Fixed("tie", 50)));
        let (factory, score) = registry.probe(&[]).unwrap();
        assert_eq!((factory.name(), score), ("high", ProbeScore::LIKELY));
    }

    #[test]
    fn test_unrecognised_input() {
        let registry = Registry::with_defaults(Config::default());
        assert!(registry.probe(&[0u8; 64]).is_none());
        let result = registry.open(ByteReader::from_bytes(vec![0u8; 64]));
        assert!(matches!(result, Err(VdkError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_mp4_probe() {
        let registry = Registry::with_defaults(Config::default());
        let (factory, score) = registry.probe(b"\0\0\0\x14ftypisom\0\0\0\0isom").unwrap();
        assert_eq!((factory.name(), score), ("mp4", ProbeScore::CERTAIN));
        let (factory, _) = registry.probe(b"\0\0\0\x08free\0\0\0\x08mdat").unwrap();
        assert_eq!(factory.name(), "mp4");
    }
}
