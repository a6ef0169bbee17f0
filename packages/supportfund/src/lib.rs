pub mod core;
pub mod error;
pub mod store;

pub use core::{Announcement, Category, NewAnnouncement, NoticeRow, NoticeSource};
pub use error::Error;
pub use error::PluginError;
pub use error::PluginErrorKind;
pub use store::{Store, StoreSession};
