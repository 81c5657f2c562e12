//! Expansion requests and the fragments returned for them.

use super::chunk::RowGroup;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// What a user asked to reveal when clicking an expand or collapse control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSpec {
    /// Reveal the whole hidden region.
    FullChunk,
    /// Reveal N lines at the top of the hidden region.
    Above(u32),
    /// Reveal N lines at the bottom of the hidden region.
    Below(u32),
    /// Reveal lines at the bottom up to a function/class header.
    BelowToHeader { lines: u32, header: String },
    /// Re-collapse an expanded region.
    Collapse,
}

impl ContextSpec {
    /// Wire form sent to the fragment fetcher.
    pub fn lines_of_context(&self) -> LinesOfContext {
        match self {
            ContextSpec::FullChunk => LinesOfContext::Full,
            ContextSpec::Above(lines) => LinesOfContext::Range {
                above: *lines,
                below: 0,
            },
            ContextSpec::Below(lines) | ContextSpec::BelowToHeader { lines, .. } => {
                LinesOfContext::Range {
                    above: 0,
                    below: *lines,
                }
            }
            ContextSpec::Collapse => LinesOfContext::Zero,
        }
    }

    /// Check if this collapses rather than expands.
    pub fn is_collapse(&self) -> bool {
        matches!(self, ContextSpec::Collapse)
    }
}

/// Errors parsing the string form of [`LinesOfContext`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinesOfContextError {
    #[error("Invalid lines of context: {0:?}")]
    Invalid(String),
}

/// Amount of context requested from the fragment fetcher.
///
/// Serialized as `null` (whole chunk), `0` (re-collapse) or `"above,below"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinesOfContext {
    /// No context limit: fetch the whole hidden region.
    Full,
    /// Collapse back to a placeholder.
    Zero,
    /// Lines to reveal at the top and bottom of the hidden region.
    Range { above: u32, below: u32 },
}

impl fmt::Display for LinesOfContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinesOfContext::Full => Ok(()),
            LinesOfContext::Zero => write!(f, "0"),
            LinesOfContext::Range { above, below } => write!(f, "{},{}", above, below),
        }
    }
}

impl FromStr for LinesOfContext {
    type Err = LinesOfContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(LinesOfContext::Full);
        }

        let invalid = || LinesOfContextError::Invalid(s.to_string());
        match s.split_once(',') {
            None => match s.parse::<u32>() {
                Ok(0) => Ok(LinesOfContext::Zero),
                _ => Err(invalid()),
            },
            Some((above, below)) => {
                let above = above.trim().parse().map_err(|_| invalid())?;
                let below = below.trim().parse().map_err(|_| invalid())?;
                Ok(LinesOfContext::Range { above, below })
            }
        }
    }
}

impl Serialize for LinesOfContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LinesOfContext::Full => serializer.serialize_none(),
            LinesOfContext::Zero => serializer.serialize_u32(0),
            LinesOfContext::Range { .. } => serializer.collect_str(self),
        }
    }
}

/// A request for a rendered fragment of the diff table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentRequest {
    /// Correlates the response with the request.
    pub request_id: u64,
    /// Server-side chunk index to render.
    pub chunk_index: usize,
    /// Requested context.
    pub lines_of_context: LinesOfContext,
}

impl FragmentRequest {
    /// Check if the request re-collapses an expanded chunk.
    pub fn is_collapse(&self) -> bool {
        self.lines_of_context == LinesOfContext::Zero
    }
}

/// Row groups returned by the fragment fetcher, replacing one group in place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Fragment {
    pub groups: Vec<RowGroup>,
}

impl Fragment {
    pub fn new(groups: Vec<RowGroup>) -> Self {
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_spec_wire_form() {
        assert_eq!(ContextSpec::FullChunk.lines_of_context(), LinesOfContext::Full);
        assert_eq!(
            ContextSpec::Above(20).lines_of_context().to_string(),
            "20,0"
        );
        assert_eq!(
            ContextSpec::Below(20).lines_of_context().to_string(),
            "0,20"
        );
        let header = ContextSpec::BelowToHeader {
            lines: 7,
            header: "Some Function".to_string(),
        };
        assert_eq!(header.lines_of_context().to_string(), "0,7");
        assert_eq!(ContextSpec::Collapse.lines_of_context(), LinesOfContext::Zero);
    }

    #[test]
    fn test_parse_lines_of_context() {
        assert_eq!("".parse::<LinesOfContext>(), Ok(LinesOfContext::Full));
        assert_eq!("0".parse::<LinesOfContext>(), Ok(LinesOfContext::Zero));
        assert_eq!(
            "20,0".parse::<LinesOfContext>(),
            Ok(LinesOfContext::Range { above: 20, below: 0 })
        );
        assert!("5".parse::<LinesOfContext>().is_err());
        assert!("a,b".parse::<LinesOfContext>().is_err());
    }

    #[test]
    fn test_request_serialization() {
        let request = FragmentRequest {
            request_id: 1,
            chunk_index: 1,
            lines_of_context: LinesOfContext::Range { above: 20, below: 0 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chunkIndex"], 1);
        assert_eq!(json["linesOfContext"], "20,0");

        let full = FragmentRequest {
            lines_of_context: LinesOfContext::Full,
            ..request.clone()
        };
        assert!(serde_json::to_value(&full).unwrap()["linesOfContext"].is_null());

        let collapse = FragmentRequest {
            lines_of_context: LinesOfContext::Zero,
            ..request
        };
        assert!(collapse.is_collapse());
        assert_eq!(serde_json::to_value(&collapse).unwrap()["linesOfContext"], 0);
    }

    #[test]
    fn test_context_spec_json() {
        let spec: ContextSpec = serde_json::from_str(r#"{"above": 20}"#).unwrap();
        assert_eq!(spec, ContextSpec::Above(20));
        let spec: ContextSpec = serde_json::from_str(r#""full_chunk""#).unwrap();
        assert_eq!(spec, ContextSpec::FullChunk);
    }
}
