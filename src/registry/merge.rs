//! Merge engine
//!
//! When several ports feed the same universe, the merge mode decides what the
//! universe's frame becomes:
//!
//! - **LTP** (latest takes priority): the port that signalled last replaces
//!   the whole frame. There is nothing to combine.
//! - **HTP** (highest takes priority): every readable port contributes and
//!   each channel takes the highest value seen. A port shorter than the
//!   others contributes 0 beyond its length, and the result is as long as
//!   the longest contributor.
//!
//! HTP is commutative and associative, so the result does not depend on the
//! order ports are visited in.

use std::str::FromStr;

use super::frame::DmxFrame;

/// Merge policy for a universe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// Latest takes priority
    #[default]
    Ltp,
    /// Highest takes priority
    Htp,
}

impl MergeMode {
    /// Short lowercase name, as used in stored settings
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeMode::Ltp => "ltp",
            MergeMode::Htp => "htp",
        }
    }
}

impl std::fmt::Display for MergeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown merge mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMergeModeError(pub String);

impl std::fmt::Display for ParseMergeModeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown merge mode: {}", self.0)
    }
}

impl std::error::Error for ParseMergeModeError {}

impl FromStr for MergeMode {
    type Err = ParseMergeModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ltp" | "latest" => Ok(MergeMode::Ltp),
            "htp" | "highest" => Ok(MergeMode::Htp),
            other => Err(ParseMergeModeError(other.to_string())),
        }
    }
}

/// HTP-merge a sequence of port reads
///
/// The first source seeds the frame and every later one is folded in with
/// [`DmxFrame::merge_highest`]. Returns `None` if there were no sources.
pub fn merge_highest<'a, I>(sources: I) -> Option<DmxFrame>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut sources = sources.into_iter();
    let mut frame = DmxFrame::from_slice(sources.next()?);

    for source in sources {
        frame.merge_highest(source);
    }

    Some(frame)
}
