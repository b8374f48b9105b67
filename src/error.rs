use std::{fmt, path::PathBuf};

/// Which shader stage produced a compile diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Why a reload attempt failed.
///
/// Every variant is recoverable: the controller keeps whatever program last
/// compiled successfully and surfaces the message for display.
#[derive(Debug)]
pub enum ReloadError {
    /// A shader stage failed to compile; `log` is the driver's info log.
    Compile { stage: ShaderStage, log: String },
    /// The two stages compiled but the program failed to link.
    Link { log: String },
    /// A source file was missing or unreadable.
    Io { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for ReloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadError::Compile { stage, log } => {
                write!(f, "{stage} shader compile error:\n{log}")
            }
            ReloadError::Link { log } => {
                write!(f, "shader link error:\n{log}")
            }
            ReloadError::Io { path, source } => {
                write!(f, "unable to load shader {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ReloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReloadError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
