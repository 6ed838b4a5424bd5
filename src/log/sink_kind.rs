use std::fmt;

/// Identifies a kind of sink in the registry and in the dispatcher.
///
/// A dispatcher holds at most one live sink per kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Console,
    File,
    /// User-registered kinds (test doubles, custom destinations).
    Custom(String),
}

impl SinkKind {
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Parses the names used in configuration files.
    ///
    /// `console` and `file` map to the built-in kinds; anything else is a
    /// custom kind, which may or may not be registered.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            n if n.eq_ignore_ascii_case("console") => Self::Console,
            n if n.eq_ignore_ascii_case("file") => Self::File,
            n => Self::Custom(n.to_owned()),
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console => f.write_str("console"),
            Self::File => f.write_str("file"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}
