// Session configuration: persisted settings, their codec, and the
// session-side scheduling around them

pub mod auto_download;
pub mod auto_lock;
pub mod codec;
pub mod error;
pub mod session;
pub mod session_config;
pub mod settings;
pub mod store;

pub use auto_download::{AutoDownloadSettings, MediaKind, MediaSource};
pub use auto_lock::{AutoLock, LockDecision, LockState};
pub use codec::{decode, encode, DecodeNotes, Decoded};
pub use error::{AutoDownloadError, DecodeError, Error, Result};
pub use session::{Migration, RestoreOutcome, SaveDebounce, Session};
pub use session_config::SessionConfig;
pub use settings::{
    FloatPlayerColumn, FloatPlayerCorner, InputSubmitWay, SelectorTab, SendFilesWay,
    SettingsRecord, SupportSwitch,
};
pub use store::{FileStore, MemoryStore, SettingsStore};
