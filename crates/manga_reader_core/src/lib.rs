pub mod domain;
pub mod library;
pub mod navigation;
pub mod ports;
pub mod progression;

pub use domain::{
    AuthSession, CatalogEntry, Chapter, ChapterNumber, LanguageFilter, LibraryEntry, NewChapter,
    ReadStatus, User, UserCredentials, Work,
};
pub use library::{LibraryError, LibraryUpdate};
pub use navigation::{
    ChapterLinks, ChapterList, Direction, LayoutMode, Navigation, ReaderPosition, Step,
};
pub use ports::{CatalogService, DatabaseService, PortError, PortResult};
pub use progression::{Award, AwardKind, AwardOutcome, UserProgression};
