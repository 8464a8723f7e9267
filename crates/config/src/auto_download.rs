// Auto-download preferences
// Persisted as a nested blob inside the session settings blob

use parley_protocol::{StreamReader, StreamWriter};

use crate::error::AutoDownloadError;

/// Current layout version, written as the first byte of the blob.
const VERSION: i8 = 1;

const SOURCES: usize = 3;
const KINDS: usize = 7;

const KIB: i32 = 1024;
const MIB: i32 = 1024 * KIB;

/// Where a piece of media was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaSource {
    User,
    Group,
    Channel,
}

impl MediaSource {
    pub const ALL: [MediaSource; SOURCES] = [MediaSource::User, MediaSource::Group, MediaSource::Channel];

    fn index(self) -> usize {
        match self {
            MediaSource::User => 0,
            MediaSource::Group => 1,
            MediaSource::Channel => 2,
        }
    }
}

/// Kind of media an auto-download limit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Photo,
    AutoPlayVideo,
    VoiceMessage,
    AutoPlayVideoMessage,
    Music,
    AutoPlayGif,
    File,
}

impl MediaKind {
    pub const ALL: [MediaKind; KINDS] = [
        MediaKind::Photo,
        MediaKind::AutoPlayVideo,
        MediaKind::VoiceMessage,
        MediaKind::AutoPlayVideoMessage,
        MediaKind::Music,
        MediaKind::AutoPlayGif,
        MediaKind::File,
    ];

    fn index(self) -> usize {
        match self {
            MediaKind::Photo => 0,
            MediaKind::AutoPlayVideo => 1,
            MediaKind::VoiceMessage => 2,
            MediaKind::AutoPlayVideoMessage => 3,
            MediaKind::Music => 4,
            MediaKind::AutoPlayGif => 5,
            MediaKind::File => 6,
        }
    }

    fn default_limit(self, source: MediaSource) -> i32 {
        match (self, source) {
            (MediaKind::Photo, _) => 10 * MIB,
            (MediaKind::VoiceMessage | MediaKind::AutoPlayVideoMessage, _) => MIB,
            (MediaKind::AutoPlayVideo | MediaKind::AutoPlayGif, MediaSource::Channel) => 0,
            (MediaKind::AutoPlayVideo | MediaKind::AutoPlayGif, _) => 10 * MIB,
            (MediaKind::Music | MediaKind::File, _) => 0,
        }
    }
}

type Limits = [[i32; KINDS]; SOURCES];

/// Byte size limits, per source and media kind, under which media is
/// downloaded without asking. A limit of 0 disables auto-download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoDownloadSettings {
    limits: Limits,
}

impl Default for AutoDownloadSettings {
    fn default() -> Self {
        let mut limits = [[0; KINDS]; SOURCES];
        for source in MediaSource::ALL {
            for kind in MediaKind::ALL {
                limits[source.index()][kind.index()] = kind.default_limit(source);
            }
        }
        Self { limits }
    }
}

impl AutoDownloadSettings {
    pub fn bytes_limit(&self, source: MediaSource, kind: MediaKind) -> i32 {
        self.limits[source.index()][kind.index()]
    }

    /// Set a limit; negative values are stored as 0.
    pub fn set_bytes_limit(&mut self, source: MediaSource, kind: MediaKind, bytes: i32) {
        self.limits[source.index()][kind.index()] = bytes.max(0);
    }

    pub fn should_download(&self, source: MediaSource, kind: MediaKind, size: i64) -> bool {
        let limit = self.bytes_limit(source, kind);
        limit > 0 && size <= i64::from(limit)
    }

    /// Version byte, then every limit source-major.
    pub fn serialize(&self) -> Vec<u8> {
        let mut writer = StreamWriter::with_capacity(1 + SOURCES * KINDS * 4);
        writer.write_i8(VERSION);
        for row in &self.limits {
            for &limit in row {
                writer.write_i32(limit);
            }
        }
        writer.into_bytes()
    }

    /// Replace every limit from a serialized blob.
    ///
    /// Nothing is changed unless the whole blob parses.
    pub fn set_from_serialized(&mut self, serialized: &[u8]) -> Result<(), AutoDownloadError> {
        if serialized.is_empty() {
            return Err(AutoDownloadError::Empty);
        }
        let mut reader = StreamReader::new(serialized);
        let version = reader.read_i8()?;
        if version != VERSION {
            return Err(AutoDownloadError::Version {
                found: version,
                expected: VERSION,
            });
        }

        let mut limits: Limits = [[0; KINDS]; SOURCES];
        for row in &mut limits {
            for limit in row.iter_mut() {
                let value = reader.read_i32()?;
                if value < 0 {
                    return Err(AutoDownloadError::NegativeLimit(value));
                }
                *limit = value;
            }
        }
        if !reader.at_end() {
            log::debug!("Ignoring {} trailing bytes in auto-download settings", reader.remaining());
        }
        self.limits = limits;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AutoDownloadSettings::default();
        assert_eq!(settings.bytes_limit(MediaSource::Channel, MediaKind::Photo), 10 * MIB);
        assert_eq!(settings.bytes_limit(MediaSource::Channel, MediaKind::AutoPlayGif), 0);
        assert_eq!(settings.bytes_limit(MediaSource::User, MediaKind::File), 0);
        assert_eq!(settings.bytes_limit(MediaSource::Group, MediaKind::VoiceMessage), MIB);
    }

    #[test]
    fn test_should_download() {
        let mut settings = AutoDownloadSettings::default();
        assert!(settings.should_download(MediaSource::User, MediaKind::Photo, 1024));
        assert!(!settings.should_download(MediaSource::User, MediaKind::Photo, 11 * i64::from(MIB)));
        // Disabled kinds never download, not even empty files
        assert!(!settings.should_download(MediaSource::User, MediaKind::File, 0));

        settings.set_bytes_limit(MediaSource::User, MediaKind::File, 512);
        assert!(settings.should_download(MediaSource::User, MediaKind::File, 512));
        assert!(!settings.should_download(MediaSource::User, MediaKind::File, 513));
    }

    #[test]
    fn test_serialize_layout() {
        let bytes = AutoDownloadSettings::default().serialize();
        assert_eq!(bytes.len(), 1 + 3 * 7 * 4);
        assert_eq!(bytes[0], 1);
        // First limit is user photos
        assert_eq!(&bytes[1..5], &(10 * MIB).to_le_bytes());
    }

    #[test]
    fn test_set_from_serialized_restores_limits() {
        let mut source = AutoDownloadSettings::default();
        source.set_bytes_limit(MediaSource::Channel, MediaKind::Music, 3 * MIB);
        source.set_bytes_limit(MediaSource::Group, MediaKind::Photo, 0);

        let mut target = AutoDownloadSettings::default();
        target.set_from_serialized(&source.serialize()).unwrap();
        assert_eq!(target, source);
    }

    #[test]
    fn test_rejects_empty() {
        let mut settings = AutoDownloadSettings::default();
        assert_eq!(settings.set_from_serialized(&[]), Err(AutoDownloadError::Empty));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut bytes = AutoDownloadSettings::default().serialize();
        bytes[0] = 2;
        let mut settings = AutoDownloadSettings::default();
        assert_eq!(
            settings.set_from_serialized(&bytes),
            Err(AutoDownloadError::Version { found: 2, expected: 1 })
        );
    }

    #[test]
    fn test_truncated_blob_leaves_settings_untouched() {
        let mut changed = AutoDownloadSettings::default();
        changed.set_bytes_limit(MediaSource::User, MediaKind::Photo, 1);
        let bytes = changed.serialize();

        let mut settings = AutoDownloadSettings::default();
        let result = settings.set_from_serialized(&bytes[..bytes.len() - 2]);
        assert!(matches!(result, Err(AutoDownloadError::Stream(_))));
        assert_eq!(settings, AutoDownloadSettings::default());
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let mut changed = AutoDownloadSettings::default();
        changed.set_bytes_limit(MediaSource::Group, MediaKind::Music, 2 * MIB);
        let mut bytes = changed.serialize();
        bytes.extend_from_slice(&[9, 9, 9]);

        let mut settings = AutoDownloadSettings::default();
        settings.set_from_serialized(&bytes).unwrap();
        assert_eq!(settings, changed);
    }

    #[test]
    fn test_negative_limit_rejected() {
        let mut bytes = AutoDownloadSettings::default().serialize();
        bytes[1..5].copy_from_slice(&(-5i32).to_le_bytes());
        let mut settings = AutoDownloadSettings::default();
        assert_eq!(
            settings.set_from_serialized(&bytes),
            Err(AutoDownloadError::NegativeLimit(-5))
        );
    }
}
