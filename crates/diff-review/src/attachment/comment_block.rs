//! Comment blocks on file attachments and the reviewable that owns them.

use super::audio::AudioRegion;
use super::text::TextRegion;
use super::xml::XmlRegion;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// The media type of a reviewed file attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Audio,
    Text,
    Xml,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Audio => "audio",
            AttachmentKind::Text => "text",
            AttachmentKind::Xml => "xml",
        }
    }

    /// Keys stored with each comment to anchor it to its region.
    pub fn serialized_fields(&self) -> &'static [&'static str] {
        match self {
            AttachmentKind::Audio => &["start", "end", "attachedToEarlierRevision"],
            AttachmentKind::Text => &["beginLineNum", "endLineNum", "viewMode"],
            AttachmentKind::Xml => &[
                "renderTextContentOnSameLine",
                "beginLineNum",
                "endLineNum",
                "viewMode",
            ],
        }
    }

    /// Region fields of a fresh comment block of this kind.
    pub fn default_fields(&self) -> RegionFields {
        match self {
            AttachmentKind::Audio => RegionFields::Audio(AudioRegion::default()),
            AttachmentKind::Text => RegionFields::Text(TextRegion::default()),
            AttachmentKind::Xml => RegionFields::Xml(XmlRegion::default()),
        }
    }

    /// Parse region fields from a serialized comment.
    ///
    /// Keys other than [`Self::serialized_fields`] are ignored; missing keys
    /// take their defaults.
    pub fn parse_fields(&self, raw: &Map<String, Value>) -> Result<RegionFields, FieldError> {
        let value = Value::Object(raw.clone());
        let invalid = |source| FieldError::Invalid {
            kind: *self,
            source,
        };

        Ok(match self {
            AttachmentKind::Audio => {
                RegionFields::Audio(serde_json::from_value(value).map_err(invalid)?)
            }
            AttachmentKind::Text => {
                RegionFields::Text(serde_json::from_value(value).map_err(invalid)?)
            }
            AttachmentKind::Xml => RegionFields::Xml(serde_json::from_value(value).map_err(invalid)?),
        })
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reading or applying comment region fields.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("Invalid {kind} comment fields: {source}")]
    Invalid {
        kind: AttachmentKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("Expected {expected} comment fields, got {actual}")]
    KindMismatch {
        expected: AttachmentKind,
        actual: AttachmentKind,
    },
}

/// Where on an attachment a comment block is anchored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RegionFields {
    Audio(AudioRegion),
    Text(TextRegion),
    Xml(XmlRegion),
}

impl RegionFields {
    pub fn kind(&self) -> AttachmentKind {
        match self {
            RegionFields::Audio(_) => AttachmentKind::Audio,
            RegionFields::Text(_) => AttachmentKind::Text,
            RegionFields::Xml(_) => AttachmentKind::Xml,
        }
    }

    /// The fields in their serialized (camelCase) form, for storing with a comment.
    pub fn to_serialized(&self) -> Map<String, Value> {
        let value = match self {
            RegionFields::Audio(region) => serde_json::to_value(region),
            RegionFields::Text(region) => serde_json::to_value(region),
            RegionFields::Xml(region) => serde_json::to_value(region),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Fields every attachment reviewable carries regardless of media type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInfo {
    #[serde(default)]
    pub caption: String,
    pub file_attachment_id: u64,
}

/// A comment as serialized by the server, with its region fields inline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SerializedComment {
    pub comment_id: u64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub localdraft: bool,
    #[serde(default)]
    pub issue_opened: bool,
    /// Everything else, including the region fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A region on an attachment and the comments made on it.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentBlock {
    pub id: Uuid,
    pub file_attachment_id: u64,
    pub fields: RegionFields,
    pub serialized_comments: Vec<SerializedComment>,
    pub created_at: DateTime<Utc>,
}

impl CommentBlock {
    pub fn new(file_attachment_id: u64, fields: RegionFields) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_attachment_id,
            fields,
            serialized_comments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Check if any comment on this block is an unpublished draft.
    pub fn has_draft(&self) -> bool {
        self.serialized_comments.iter().any(|c| c.localdraft)
    }
}

/// A file attachment under review and its comment blocks.
#[derive(Debug, Clone)]
pub struct FileAttachmentReviewable {
    pub kind: AttachmentKind,
    pub info: AttachmentInfo,
    blocks: Vec<CommentBlock>,
}

impl FileAttachmentReviewable {
    pub fn new(kind: AttachmentKind, info: AttachmentInfo) -> Self {
        Self {
            kind,
            info,
            blocks: Vec::new(),
        }
    }

    pub fn comment_blocks(&self) -> &[CommentBlock] {
        &self.blocks
    }

    pub fn comment_block(&self, id: Uuid) -> Option<&CommentBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Build one block from comments sharing a region.
    ///
    /// The region is read from the first comment. Returns `None` for an
    /// empty batch.
    pub fn add_comment_blocks(
        &mut self,
        comments: Vec<SerializedComment>,
    ) -> Result<Option<Uuid>, FieldError> {
        let Some(first) = comments.first() else {
            return Ok(None);
        };

        let fields = self.kind.parse_fields(&first.fields)?;
        let mut block = CommentBlock::new(self.info.file_attachment_id, fields);
        block.serialized_comments = comments;

        debug!(
            "Loaded {} block {} with {} comment(s)",
            self.kind,
            block.id,
            block.serialized_comments.len()
        );
        let id = block.id;
        self.blocks.push(block);
        Ok(Some(id))
    }

    /// Load every batch of serialized comments, one block per batch.
    pub fn load_serialized_comments<I>(&mut self, batches: I) -> Result<usize, FieldError>
    where
        I: IntoIterator<Item = Vec<SerializedComment>>,
    {
        let mut loaded = 0;
        for batch in batches {
            if self.add_comment_blocks(batch)?.is_some() {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Start a new, still empty, comment block on `fields`.
    pub fn create_comment_block(&mut self, fields: RegionFields) -> Result<Uuid, FieldError> {
        if fields.kind() != self.kind {
            return Err(FieldError::KindMismatch {
                expected: self.kind,
                actual: fields.kind(),
            });
        }

        let block = CommentBlock::new(self.info.file_attachment_id, fields);
        let id = block.id;
        self.blocks.push(block);
        Ok(id)
    }

    pub fn remove_comment_block(&mut self, id: Uuid) -> Option<CommentBlock> {
        let position = self.blocks.iter().position(|b| b.id == id)?;
        Some(self.blocks.remove(position))
    }
}

// === Lenient field decoding ===
//
// Stored fields arrive as strings ("1.5") or native JSON values depending on
// where the comment came from.

pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

pub(crate) fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

pub(crate) fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_u64().is_some_and(|v| v != 0),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::ViewMode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn comment(id: u64, fields: Value) -> SerializedComment {
        let mut raw = json!({ "comment_id": id, "text": format!("comment {}", id) });
        if let (Some(raw), Value::Object(fields)) = (raw.as_object_mut(), fields) {
            raw.extend(fields);
        }
        serde_json::from_value(raw).unwrap()
    }

    fn audio_reviewable() -> FileAttachmentReviewable {
        FileAttachmentReviewable::new(
            AttachmentKind::Audio,
            AttachmentInfo {
                caption: "interview.ogg".to_string(),
                file_attachment_id: 456,
            },
        )
    }

    #[test]
    fn test_serialized_comment_keeps_extra_fields() {
        let c = comment(7, json!({ "start": "1.5", "end": "3" }));
        assert_eq!(c.comment_id, 7);
        assert_eq!(c.fields["start"], "1.5");
        assert!(!c.fields.contains_key("text"));
    }

    #[test]
    fn test_add_comment_blocks_uses_first_comment_fields() {
        let mut reviewable = audio_reviewable();
        let id = reviewable
            .add_comment_blocks(vec![
                comment(1, json!({ "start": "1.5", "end": "3.25", "attachedToEarlierRevision": false })),
                comment(2, json!({ "start": "9", "end": "10" })),
            ])
            .unwrap()
            .unwrap();

        let block = reviewable.comment_block(id).unwrap();
        assert_eq!(block.file_attachment_id, 456);
        assert_eq!(block.serialized_comments.len(), 2);
        assert_eq!(
            block.fields,
            RegionFields::Audio(AudioRegion {
                start: Some(1.5),
                end: Some(3.25),
                attached_to_earlier_revision: false,
            })
        );
    }

    #[test]
    fn test_add_empty_batch() {
        let mut reviewable = audio_reviewable();
        assert!(reviewable.add_comment_blocks(Vec::new()).unwrap().is_none());
        assert!(reviewable.comment_blocks().is_empty());
    }

    #[test]
    fn test_load_serialized_comments() {
        let mut reviewable = audio_reviewable();
        let loaded = reviewable
            .load_serialized_comments(vec![
                vec![comment(1, json!({ "start": 1, "end": 2 }))],
                Vec::new(),
                vec![comment(2, json!({ "start": 4, "end": 5 }))],
            ])
            .unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(reviewable.comment_blocks().len(), 2);
    }

    #[test]
    fn test_text_fields_parse() {
        let fields = AttachmentKind::Text
            .parse_fields(
                json!({ "beginLineNum": "3", "endLineNum": 8, "viewMode": "source" })
                    .as_object()
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(
            fields,
            RegionFields::Text(TextRegion {
                begin_line_num: Some(3),
                end_line_num: Some(8),
                view_mode: ViewMode::Source,
            })
        );
    }

    #[test]
    fn test_invalid_view_mode_is_an_error() {
        let result = AttachmentKind::Text
            .parse_fields(json!({ "viewMode": "hexdump" }).as_object().unwrap());
        assert!(matches!(
            result,
            Err(FieldError::Invalid {
                kind: AttachmentKind::Text,
                ..
            })
        ));
    }

    #[test]
    fn test_xml_fields_round_trip_keys() {
        let fields = AttachmentKind::Xml
            .parse_fields(
                json!({
                    "beginLineNum": 1,
                    "endLineNum": 2,
                    "viewMode": "rendered",
                    "renderTextContentOnSameLine": "true"
                })
                .as_object()
                .unwrap(),
            )
            .unwrap();

        let serialized = fields.to_serialized();
        let mut keys: Vec<_> = serialized.keys().map(String::as_str).collect();
        keys.sort_unstable();
        let mut expected = AttachmentKind::Xml.serialized_fields().to_vec();
        expected.sort_unstable();
        assert_eq!(keys, expected);
        assert_eq!(serialized["renderTextContentOnSameLine"], true);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            AttachmentKind::Audio.default_fields(),
            RegionFields::Audio(AudioRegion {
                start: None,
                end: None,
                attached_to_earlier_revision: true,
            })
        );
        assert_eq!(AttachmentKind::Xml.default_fields().kind(), AttachmentKind::Xml);
    }

    #[test]
    fn test_create_and_remove_comment_block() {
        let mut reviewable = audio_reviewable();
        let id = reviewable
            .create_comment_block(AttachmentKind::Audio.default_fields())
            .unwrap();
        assert!(reviewable.comment_block(id).unwrap().serialized_comments.is_empty());

        let mismatch = reviewable.create_comment_block(AttachmentKind::Text.default_fields());
        assert!(matches!(mismatch, Err(FieldError::KindMismatch { .. })));

        assert!(reviewable.remove_comment_block(id).is_some());
        assert!(reviewable.remove_comment_block(id).is_none());
    }

    #[test]
    fn test_has_draft() {
        let mut block = CommentBlock::new(1, AttachmentKind::Text.default_fields());
        block.serialized_comments.push(comment(1, json!({})));
        assert!(!block.has_draft());
        block.serialized_comments[0].localdraft = true;
        assert!(block.has_draft());
    }
}
