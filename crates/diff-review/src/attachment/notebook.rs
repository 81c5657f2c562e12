//! Rendering of Jupyter notebooks (`.ipynb`) for the rendered view.
//!
//! Every cell becomes a centered `Cell N (type)` heading, its lines, its
//! outputs and a closing `<hr />`. Markdown goes through pulldown-cmark with
//! raw HTML shown as text.

use log::debug;
use pulldown_cmark::{html, Event, Options, Parser};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::xml_format::escape_markup;

#[derive(Debug, Error)]
pub enum NotebookError {
    #[error("Failed to parse notebook: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Notebook text fields are either one string or a list of lines.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MultilineText {
    Lines(Vec<String>),
    Single(String),
}

impl Default for MultilineText {
    fn default() -> Self {
        Self::Lines(Vec::new())
    }
}

impl MultilineText {
    /// Lines with their trailing newlines.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Self::Lines(lines) => lines.iter().map(String::as_str).collect(),
            Self::Single(text) => text.split_inclusive('\n').collect(),
        }
    }

    pub fn joined(&self) -> String {
        match self {
            Self::Lines(lines) => lines.concat(),
            Self::Single(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Notebook {
    #[serde(default)]
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Markdown {
        #[serde(default)]
        source: MultilineText,
    },
    Code {
        #[serde(default)]
        source: MultilineText,
        #[serde(default)]
        execution_count: Option<u64>,
        #[serde(default)]
        outputs: Vec<Output>,
    },
    Raw {
        #[serde(default)]
        source: MultilineText,
    },
}

impl Cell {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Markdown { .. } => "markdown",
            Self::Code { .. } => "code",
            Self::Raw { .. } => "raw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    ExecuteResult {
        #[serde(default)]
        data: Map<String, Value>,
        #[serde(default)]
        execution_count: Option<u64>,
    },
    DisplayData {
        #[serde(default)]
        data: Map<String, Value>,
    },
    Stream {
        #[serde(default)]
        text: MultilineText,
    },
    Error {
        #[serde(default)]
        evalue: String,
    },
}

/// Parse notebook JSON and render it.
pub fn render_notebook_json(json: &str) -> Result<Vec<String>, NotebookError> {
    let notebook: Notebook = serde_json::from_str(json)?;
    Ok(render_notebook(&notebook))
}

/// Render a notebook into display lines.
pub fn render_notebook(notebook: &Notebook) -> Vec<String> {
    let mut lines = Vec::new();

    for (index, cell) in notebook.cells.iter().enumerate() {
        lines.push(format!(
            "<div style=\"text-align: center\">Cell {} ({})</div>",
            index + 1,
            cell.kind()
        ));

        match cell {
            Cell::Markdown { source } => {
                lines.extend(
                    source
                        .lines()
                        .into_iter()
                        .map(|line| format!("<div>{}</div>", render_markdown(line))),
                );
            }
            Cell::Code {
                source,
                execution_count,
                outputs,
            } => {
                lines.push(execution_label("In", *execution_count));
                lines.extend(source.lines().into_iter().map(|line| {
                    format!(
                        "<div class=\"input-area\">{}</div>",
                        whitespace_div(&escape_markup(line))
                    )
                }));
                for output in outputs {
                    lines.extend(render_output(output));
                }
            }
            Cell::Raw { source } => {
                lines.extend(
                    source
                        .lines()
                        .into_iter()
                        .map(|line| format!("<div>{}</div>", escape_markup(line))),
                );
            }
        }

        lines.push("<hr />".to_string());
    }

    debug!(
        "Rendered {} notebook cells into {} lines",
        notebook.cells.len(),
        lines.len()
    );
    lines
}

fn execution_label(prefix: &str, count: Option<u64>) -> String {
    match count {
        Some(count) if count > 0 => format!("{} [{}]:", prefix, count),
        _ => format!("{} [ ]:", prefix),
    }
}

fn whitespace_div(content: &str) -> String {
    format!("<div class=\"cell-with-whitespace\">{}</div>", content)
}

fn render_markdown(text: &str) -> String {
    let parser = Parser::new_ext(text, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });

    let mut rendered = String::new();
    html::push_html(&mut rendered, parser);
    rendered.trim_end_matches('\n').to_string()
}

fn render_output(output: &Output) -> Vec<String> {
    let count = match output {
        Output::ExecuteResult {
            execution_count, ..
        } => *execution_count,
        _ => None,
    };
    let body = match output {
        Output::ExecuteResult { data, .. } | Output::DisplayData { data } => render_data(data),
        Output::Stream { text } => whitespace_div(&escape_markup(&text.joined())),
        Output::Error { evalue } => format!("<div>{}</div>", escape_markup(evalue)),
    };

    vec![format!("<div>{}</div>", execution_label("Out", count)), body]
}

/// Show the richest representation: the first MIME type that is not plain
/// text, falling back to plain text.
fn render_data(data: &Map<String, Value>) -> String {
    let chosen = data
        .iter()
        .find(|(mime, _)| mime.as_str() != "text/plain")
        .or_else(|| data.iter().next());
    let Some((mime, value)) = chosen else {
        return "<div></div>".to_string();
    };

    let content = match value {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts.iter().filter_map(Value::as_str).collect(),
        other => other.to_string(),
    };

    if mime.starts_with("image/") {
        format!(
            "<img src=\"data:{};base64, {}\" alt=\"cell output\" />",
            mime,
            content.trim()
        )
    } else {
        format!("<div>{}</div>", escape_markup(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn notebook(value: Value) -> Notebook {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_markdown_cell() {
        let nb = notebook(json!({
            "cells": [{
                "cell_type": "markdown",
                "metadata": {},
                "source": [
                    "# Jupyter markdown test\n",
                    "* \\<array\\>.tolist()"
                ]
            }]
        }));

        assert_eq!(
            render_notebook(&nb),
            vec![
                "<div style=\"text-align: center\">Cell 1 (markdown)</div>",
                "<div><h1>Jupyter markdown test</h1></div>",
                "<div><ul>\n<li>&lt;array&gt;.tolist()</li>\n</ul></div>",
                "<hr />",
            ]
        );
    }

    #[test]
    fn test_markdown_raw_html_is_shown_as_text() {
        let nb = notebook(json!({
            "cells": [{"cell_type": "markdown", "source": "<script>x</script>"}]
        }));
        let lines = render_notebook(&nb);
        assert_eq!(lines[1], "<div>&lt;script&gt;x&lt;/script&gt;</div>");
    }

    #[test]
    fn test_code_cell_with_outputs() {
        let nb = notebook(json!({
            "cells": [{
                "cell_type": "code",
                "execution_count": 1,
                "metadata": {},
                "source": ["myint = 7\n", "print(myint)"],
                "outputs": [
                    {"output_type": "stream", "name": "stdout", "text": "test"},
                    {"output_type": "display_data", "metadata": {}, "data": {
                        "text/plain": ["first output line\n", "second output line"]
                    }},
                    {"output_type": "execute_result", "execution_count": 1, "metadata": {}, "data": {
                        "text/plain": "<Figure>",
                        "image/png": "iVBORw0KGgo=\n"
                    }},
                    {"output_type": "error", "ename": "ValueError", "evalue": "bad value", "traceback": []}
                ]
            }]
        }));

        assert_eq!(
            render_notebook(&nb),
            vec![
                "<div style=\"text-align: center\">Cell 1 (code)</div>",
                "In [1]:",
                "<div class=\"input-area\"><div class=\"cell-with-whitespace\">myint = 7\n</div></div>",
                "<div class=\"input-area\"><div class=\"cell-with-whitespace\">print(myint)</div></div>",
                "<div>Out [ ]:</div>",
                "<div class=\"cell-with-whitespace\">test</div>",
                "<div>Out [ ]:</div>",
                "<div>first output line\nsecond output line</div>",
                "<div>Out [1]:</div>",
                "<img src=\"data:image/png;base64, iVBORw0KGgo=\" alt=\"cell output\" />",
                "<div>Out [ ]:</div>",
                "<div>bad value</div>",
                "<hr />",
            ]
        );
    }

    #[test]
    fn test_unexecuted_code_cell() {
        let nb = notebook(json!({
            "cells": [{"cell_type": "code", "execution_count": null, "source": "x = 1", "outputs": []}]
        }));
        assert_eq!(render_notebook(&nb)[1], "In [ ]:");
    }

    #[test]
    fn test_raw_cell_and_numbering() {
        let nb = notebook(json!({
            "cells": [
                {"cell_type": "raw", "source": ["a < b\n", "done"]},
                {"cell_type": "markdown", "source": []}
            ]
        }));

        assert_eq!(
            render_notebook(&nb),
            vec![
                "<div style=\"text-align: center\">Cell 1 (raw)</div>",
                "<div>a &lt; b\n</div>",
                "<div>done</div>",
                "<hr />",
                "<div style=\"text-align: center\">Cell 2 (markdown)</div>",
                "<hr />",
            ]
        );
    }

    #[test]
    fn test_render_from_json_text() {
        let lines = render_notebook_json(r#"{"cells": [], "nbformat": 4}"#).unwrap();
        assert!(lines.is_empty());

        assert!(matches!(
            render_notebook_json("not a notebook"),
            Err(NotebookError::Parse(_))
        ));
    }
}
