/// Where an owner keeps the items of a folder upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum StorageLocation {
    Gallery,
    #[value(alias = "collection")]
    Collections,
}

impl StorageLocation {
    /// Path segment used by the upstream API and the value stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gallery => "gallery",
            Self::Collections => "collections",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gallery" => Some(Self::Gallery),
            "collections" | "collection" => Some(Self::Collections),
            _ => None,
        }
    }
}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}
