//! Root-relative remote paths

use std::fmt;
use std::str::FromStr;

use crate::error::{DriveError, Result};

/// A `/`-separated path below the Drive root.
///
/// Empty and `.` segments are dropped when parsing, so `"/a//b/"` and
/// `"a/./b"` both name `a/b`. A `..` segment is rejected: the remote graph
/// has no parent links a path could follow without a lookup.
///
/// # Examples
///
/// ```
/// use provider_google_drive::RemotePath;
///
/// let path = RemotePath::parse("/backups/2024/").unwrap();
/// assert_eq!(path.segments(), ["backups", "2024"]);
/// assert_eq!(path.to_string(), "backups/2024");
/// assert!(RemotePath::parse("a/../b").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RemotePath {
    segments: Vec<String>,
}

impl RemotePath {
    pub fn parse(path: &str) -> Result<Self> {
        let mut segments = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(DriveError::InvalidPath(format!(
                        "'{}' contains a '..' segment",
                        path
                    )))
                }
                name => segments.push(name.to_string()),
            }
        }
        Ok(Self { segments })
    }

    /// The Drive root (no segments)
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append `child`, which may itself contain several segments.
    pub fn join(&self, child: &str) -> Result<Self> {
        let child = Self::parse(child)?;
        let mut segments = self.segments.clone();
        segments.extend(child.segments);
        Ok(Self { segments })
    }

    /// Everything but the last segment; `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        self.segments.split_last().map(|(_, parent)| Self {
            segments: parent.to_vec(),
        })
    }

    /// Last segment; `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Split into the containing folder and the final name.
    pub fn split_file_name(&self) -> Result<(Self, &str)> {
        match (self.parent(), self.file_name()) {
            (Some(parent), Some(name)) => Ok((parent, name)),
            _ => Err(DriveError::InvalidPath(
                "the root has no file name".to_string(),
            )),
        }
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl FromStr for RemotePath {
    type Err = DriveError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
