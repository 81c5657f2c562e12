//! Build chunk tables from unified diff text.

use crate::model::{ChunkKind, ContextSpec, DiffTable, Row, RowGroup};
use log::debug;
use thiserror::Error;
use unidiff::{Hunk as UnidiffHunk, Line as UnidiffLine, PatchSet, PatchedFile};

/// Errors that can occur during diff parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to parse diff: {0}")]
    ParseFailed(String),
}

/// The chunk table of one file in a diff.
#[derive(Debug, Clone)]
pub struct FileTable {
    /// Path in the new revision.
    pub path: String,
    /// Path in the old revision, when the file was renamed.
    pub old_path: Option<String>,
    pub table: DiffTable,
}

/// Parse a unified diff into one chunk table per file.
///
/// Unchanged lines between hunks become collapsed placeholders that offer
/// to reveal `context_lines` at a time from either end, or everything.
///
/// # Example
/// ```ignore
/// let files = parse_unified_diff(diff_text, 20)?;
/// for file in &files {
///     println!("{}: {} rows", file.path, file.table.row_count());
/// }
/// ```
pub fn parse_unified_diff(
    diff_text: &str,
    context_lines: u32,
) -> Result<Vec<FileTable>, ParseError> {
    let mut patch_set = PatchSet::new();
    patch_set
        .parse(diff_text)
        .map_err(|e| ParseError::ParseFailed(e.to_string()))?;

    patch_set
        .files()
        .iter()
        .map(|file| build_file_table(file, context_lines))
        .collect()
}

fn build_file_table(file: &PatchedFile, context_lines: u32) -> Result<FileTable, ParseError> {
    let path = clean_path(&file.target_file);
    let source = clean_path(&file.source_file);
    let old_path = (source != path && !source.is_empty() && source != "/dev/null")
        .then_some(source);

    let mut builder = TableBuilder::new(context_lines);
    for hunk in file.hunks() {
        builder
            .push_hunk(hunk)
            .map_err(|ParseError::ParseFailed(reason)| {
                ParseError::ParseFailed(format!("{}: {}", path, reason))
            })?;
    }

    let table = DiffTable::new(builder.groups);
    debug!(
        "Built table for {}: {} group(s), {} row(s)",
        path,
        table.group_count(),
        table.row_count()
    );
    Ok(FileTable {
        path,
        old_path,
        table,
    })
}

struct TableBuilder {
    groups: Vec<RowGroup>,
    context_lines: u32,
    next_chunk: usize,
    /// Virtual line number of the next row, counting hidden lines.
    next_line: u32,
    /// Old-file line following the previous hunk.
    next_old_line: u32,
}

impl TableBuilder {
    fn new(context_lines: u32) -> Self {
        Self {
            groups: Vec::new(),
            context_lines,
            next_chunk: 0,
            next_line: 1,
            next_old_line: 1,
        }
    }

    fn push_hunk(&mut self, hunk: &UnidiffHunk) -> Result<(), ParseError> {
        let source_start = to_line(hunk.source_start)?.max(1);
        let hidden = source_start.saturating_sub(self.next_old_line);
        if hidden > 0 {
            self.push_placeholder(hidden, &hunk.section_header)?;
        }
        self.next_old_line = source_start
            .checked_add(to_line(hunk.source_length)?)
            .ok_or_else(|| line_overflow(hunk))?;

        let lines: Vec<&UnidiffLine> = hunk
            .lines()
            .iter()
            .filter(|line| line.line_type != "\\")
            .collect();

        let mut i = 0;
        while i < lines.len() {
            let run_end = |from: usize, line_type: &str| {
                from + lines[from..]
                    .iter()
                    .take_while(|l| l.line_type == line_type)
                    .count()
            };

            match lines[i].line_type.as_str() {
                "-" => {
                    let deletions_end = run_end(i, "-");
                    let additions_end = run_end(deletions_end, "+");
                    let deleted = &lines[i..deletions_end];
                    let added = &lines[deletions_end..additions_end];
                    if added.is_empty() {
                        self.push_changed(ChunkKind::Delete, deleted, &[])?;
                    } else {
                        self.push_changed(ChunkKind::Replace, deleted, added)?;
                    }
                    i = additions_end;
                }
                "+" => {
                    let end = run_end(i, "+");
                    self.push_changed(ChunkKind::Insert, &[], &lines[i..end])?;
                    i = end;
                }
                _ => {
                    let end = run_end(i, lines[i].line_type.as_str());
                    self.push_equal(&lines[i..end])?;
                    i = end;
                }
            }
        }
        Ok(())
    }

    /// Claim `count` virtual lines and return the first.
    fn advance(&mut self, count: u32) -> Result<u32, ParseError> {
        let line = self.next_line;
        self.next_line = line.checked_add(count).ok_or_else(|| {
            ParseError::ParseFailed(format!("line numbers past {} overflow", line))
        })?;
        Ok(line)
    }

    fn next_row(&mut self) -> Result<Row, ParseError> {
        Ok(Row::new(self.advance(1)?))
    }

    fn push_group(&mut self, kind: ChunkKind, rows: Vec<Row>) {
        self.groups.push(RowGroup::new(self.next_chunk, kind, rows));
        self.next_chunk += 1;
    }

    fn push_equal(&mut self, lines: &[&UnidiffLine]) -> Result<(), ParseError> {
        let rows = lines
            .iter()
            .map(|line| -> Result<Row, ParseError> {
                let text = line_text(line);
                Ok(Row {
                    old_line: line.source_line_no.map(to_line).transpose()?,
                    new_line: line.target_line_no.map(to_line).transpose()?,
                    old_text: Some(text.clone()),
                    new_text: Some(text),
                    ..self.next_row()?
                })
            })
            .collect::<Result<_, ParseError>>()?;
        self.push_group(ChunkKind::Equal, rows);
        Ok(())
    }

    /// Pair deleted and added lines side by side.
    fn push_changed(
        &mut self,
        kind: ChunkKind,
        deleted: &[&UnidiffLine],
        added: &[&UnidiffLine],
    ) -> Result<(), ParseError> {
        let rows = (0..deleted.len().max(added.len()))
            .map(|i| -> Result<Row, ParseError> {
                let old = deleted.get(i);
                let new = added.get(i);
                Ok(Row {
                    old_line: old.and_then(|l| l.source_line_no).map(to_line).transpose()?,
                    new_line: new.and_then(|l| l.target_line_no).map(to_line).transpose()?,
                    old_text: old.map(|l| line_text(l)),
                    new_text: new.map(|l| line_text(l)),
                    ..self.next_row()?
                })
            })
            .collect::<Result<_, ParseError>>()?;
        self.push_group(kind, rows);
        Ok(())
    }

    /// Gaps wider than the configured context offer partial reveals from
    /// either end, plus a reveal up to the enclosing header when the next
    /// hunk names one.
    fn push_placeholder(&mut self, hidden: u32, header: &str) -> Result<(), ParseError> {
        let header = header.trim();
        let mut affordances = vec![ContextSpec::FullChunk];
        if hidden > self.context_lines {
            if self.context_lines > 0 {
                affordances = vec![
                    ContextSpec::Above(self.context_lines),
                    ContextSpec::FullChunk,
                    ContextSpec::Below(self.context_lines),
                ];
            }
            if !header.is_empty() {
                affordances.push(ContextSpec::BelowToHeader {
                    lines: hidden,
                    header: header.to_string(),
                });
            }
        }

        let mut group = RowGroup::collapsed(self.next_chunk, hidden, affordances);
        if !header.is_empty() {
            group = group.with_header(header);
        }
        self.advance(hidden)?;
        self.groups.push(group);
        self.next_chunk += 1;
        Ok(())
    }
}

fn to_line(number: usize) -> Result<u32, ParseError> {
    u32::try_from(number)
        .map_err(|_| ParseError::ParseFailed(format!("line number {} is out of range", number)))
}

fn line_overflow(hunk: &UnidiffHunk) -> ParseError {
    ParseError::ParseFailed(format!(
        "hunk @@ -{},{} @@ runs past the last representable line",
        hunk.source_start, hunk.source_length
    ))
}

fn line_text(line: &UnidiffLine) -> String {
    line.value.trim_end_matches(['\r', '\n']).to_string()
}

/// Clean the path by removing a/b prefixes from git diff output.
fn clean_path(path: &str) -> String {
    let path = path.trim();
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE_DIFF: &str = r#"diff --git a/src/lib.rs b/src/lib.rs
index 111222..333444 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,4 +1,4 @@
 use std::fmt;
-use std::io;
+use std::io::{self, Read};
 use std::path::Path;
 pub struct Foo;
@@ -30,4 +30,5 @@ impl Foo {
 impl Foo {
     fn bar(&self) {
+        self.baz();
         self.do_thing();
     }
"#;

    const RENAME_DIFF: &str = r#"diff --git a/old.txt b/new.txt
--- a/old.txt
+++ b/new.txt
@@ -1,3 +1,2 @@
-one
-two
+uno
 three
"#;

    fn kinds(table: &DiffTable) -> Vec<ChunkKind> {
        table.groups().iter().map(|g| g.kind).collect()
    }

    #[test]
    fn test_parse_into_chunks() {
        let files = parse_unified_diff(SAMPLE_DIFF, 20).unwrap();
        assert_eq!(files.len(), 1);

        let file = &files[0];
        assert_eq!(file.path, "src/lib.rs");
        assert_eq!(file.old_path, None);
        assert_eq!(
            kinds(&file.table),
            vec![
                ChunkKind::Equal,
                ChunkKind::Replace,
                ChunkKind::Equal,
                ChunkKind::Collapsed,
                ChunkKind::Equal,
                ChunkKind::Insert,
                ChunkKind::Equal,
            ]
        );

        let chunk_indices: Vec<_> = file.table.groups().iter().map(|g| g.chunk_index).collect();
        assert_eq!(chunk_indices, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(file.table.row_count(), 9);
    }

    #[test]
    fn test_virtual_lines_count_hidden_lines() {
        let files = parse_unified_diff(SAMPLE_DIFF, 20).unwrap();
        let table = &files[0].table;

        let lines: Vec<_> = (0..table.row_count())
            .filter_map(|i| table.line_of(i))
            .collect();
        assert_eq!(lines, vec![1, 2, 3, 4, 30, 31, 32, 33, 34]);

        let replace = table.row(1).unwrap();
        assert_eq!(replace.old_line, Some(2));
        assert_eq!(replace.new_line, Some(2));
        assert_eq!(replace.old_text.as_deref(), Some("use std::io;"));
        assert_eq!(replace.new_text.as_deref(), Some("use std::io::{self, Read};"));
    }

    #[test]
    fn test_placeholder_between_hunks() {
        let files = parse_unified_diff(SAMPLE_DIFF, 20).unwrap();
        let table = &files[0].table;

        let position = table.find_placeholder(3).unwrap();
        let placeholder = table.group(position).unwrap();
        assert_eq!(placeholder.hidden_lines, 25);
        assert_eq!(placeholder.header.as_deref(), Some("impl Foo {"));
        let contexts: Vec<_> = placeholder
            .expand_affordances
            .iter()
            .map(|a| a.context.clone())
            .collect();
        assert_eq!(
            contexts,
            vec![
                ContextSpec::Above(20),
                ContextSpec::FullChunk,
                ContextSpec::Below(20),
                ContextSpec::BelowToHeader {
                    lines: 25,
                    header: "impl Foo {".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_gap_without_header_has_no_header_reveal() {
        let diff = SAMPLE_DIFF.replace("@@ -30,4 +30,5 @@ impl Foo {", "@@ -30,4 +30,5 @@");
        let files = parse_unified_diff(&diff, 20).unwrap();
        let table = &files[0].table;
        let placeholder = table.group(table.find_placeholder(3).unwrap()).unwrap();
        assert_eq!(placeholder.header, None);
        assert!(placeholder
            .expand_affordances
            .iter()
            .all(|a| !matches!(a.context, ContextSpec::BelowToHeader { .. })));
        assert_eq!(placeholder.expand_affordances.len(), 3);
    }

    #[test]
    fn test_zero_context_offers_full_chunk_and_header() {
        let files = parse_unified_diff(SAMPLE_DIFF, 0).unwrap();
        let table = &files[0].table;
        let placeholder = table.group(table.find_placeholder(3).unwrap()).unwrap();
        let contexts: Vec<_> = placeholder
            .expand_affordances
            .iter()
            .map(|a| a.context.clone())
            .collect();
        assert_eq!(
            contexts,
            vec![
                ContextSpec::FullChunk,
                ContextSpec::BelowToHeader {
                    lines: 25,
                    header: "impl Foo {".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_line_numbers_past_u32_are_rejected() {
        let diff = format!(
            "--- a/big.txt\n+++ b/big.txt\n@@ -4294967290,10 +4294967290,10 @@\n{}",
            " line\n".repeat(10)
        );
        let result = parse_unified_diff(&diff, 20);
        assert!(matches!(result, Err(ParseError::ParseFailed(_))));
    }

    #[test]
    fn test_small_gap_offers_full_chunk_only() {
        let files = parse_unified_diff(SAMPLE_DIFF, 30).unwrap();
        let table = &files[0].table;
        let placeholder = table.group(table.find_placeholder(3).unwrap()).unwrap();
        assert_eq!(placeholder.expand_affordances.len(), 1);
        assert_eq!(placeholder.expand_affordances[0].context, ContextSpec::FullChunk);
    }

    #[test]
    fn test_uneven_replace_and_rename() {
        let files = parse_unified_diff(RENAME_DIFF, 20).unwrap();
        let file = &files[0];
        assert_eq!(file.path, "new.txt");
        assert_eq!(file.old_path.as_deref(), Some("old.txt"));
        assert_eq!(kinds(&file.table), vec![ChunkKind::Replace, ChunkKind::Equal]);

        let second = file.table.row(1).unwrap();
        assert_eq!(second.old_text.as_deref(), Some("two"));
        assert_eq!(second.new_text, None);
        assert_eq!(second.new_line, None);
    }

    #[test]
    fn test_empty_diff() {
        let files = parse_unified_diff("", 20).unwrap();
        assert!(files.is_empty());
    }
}
