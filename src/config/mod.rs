//! Configuration and settings management.
//!
//! Settings are stored in the user's config directory as JSON, or at a
//! path given on the command line.

mod settings;

pub use settings::{
    CorpusSettings, CorpusSource, RelationSettings, SearchSettings, Settings, SettingsError,
    SettingsResult,
};
