use thiserror::Error;

use crate::core::NoticeSource;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Plugin(Box<PluginError>),
}

impl From<PluginError> for Error {
    fn from(err: PluginError) -> Self {
        Error::Plugin(Box::new(err))
    }
}

#[derive(Debug, Error)]
#[error("Error from plugin {plugin}: {kind:?} - {message}")]
pub struct PluginError {
    kind: PluginErrorKind,
    plugin: String,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginErrorKind {
    Request,
    Parse,
    Custom(String),
}

impl PluginError {
    pub fn request<T: NoticeSource>(message: String) -> Self {
        Self {
            kind: PluginErrorKind::Request,
            plugin: T::IDENTIFIER.to_string(),
            message,
        }
    }

    pub fn parse<T: NoticeSource>(message: String) -> Self {
        Self {
            kind: PluginErrorKind::Parse,
            plugin: T::IDENTIFIER.to_string(),
            message,
        }
    }

    pub fn custom<T: NoticeSource>(name: String, message: String) -> Self {
        Self {
            kind: PluginErrorKind::Custom(name),
            plugin: T::IDENTIFIER.to_string(),
            message,
        }
    }

    pub fn kind(&self) -> &PluginErrorKind {
        &self.kind
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }
}
