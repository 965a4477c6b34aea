use luasense_api::models::{CompletionRequest, DocumentId, Notification, ResolutionResult};
use luasense_core::ServiceConfig;
use luasense_lua::{Resolver, VariableTableBuilder};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    End,
    Offset(usize),
    /// 1-based line, 1-based byte column.
    LineCol(usize, usize),
}

impl Position {
    pub fn parse_line_col(arg: &str) -> Result<Self, String> {
        let (line, col) = arg
            .split_once(':')
            .ok_or_else(|| format!("expected LINE:COL, got '{}'", arg))?;
        let line: usize = line
            .trim()
            .parse()
            .map_err(|_| format!("invalid line in '{}'", arg))?;
        let col: usize = col
            .trim()
            .parse()
            .map_err(|_| format!("invalid column in '{}'", arg))?;
        if line == 0 || col == 0 {
            return Err(format!("line and column are 1-based, got '{}'", arg));
        }
        Ok(Position::LineCol(line, col))
    }

    /// Byte offset into `text`.
    pub fn to_offset(self, text: &str) -> Result<usize, String> {
        match self {
            Position::End => Ok(text.len()),
            Position::Offset(offset) if offset <= text.len() => Ok(offset),
            Position::Offset(offset) => Err(format!(
                "offset {} is past the end of the file ({} bytes)",
                offset,
                text.len()
            )),
            Position::LineCol(line, col) => {
                let mut start = 0;
                for (index, segment) in text.split_inclusive('\n').enumerate() {
                    if index + 1 == line {
                        let content = segment.trim_end_matches(['\n', '\r']);
                        if col - 1 > content.len() {
                            return Err(format!("line {} has only {} columns", line, content.len() + 1));
                        }
                        return Ok(start + col - 1);
                    }
                    start += segment.len();
                }
                // A trailing newline opens one more, empty line.
                if (text.is_empty() || text.ends_with('\n'))
                    && line == text.split_inclusive('\n').count() + 1
                    && col == 1
                {
                    return Ok(text.len());
                }
                Err(format!("line {} is past the end of the file", line))
            }
        }
    }
}

pub struct Flags {
    pub constant: bool,
    pub params: bool,
}

#[derive(Serialize)]
struct Report {
    cursor: usize,
    resolution: Option<ResolutionResult>,
    error: Option<String>,
    events: Vec<Notification>,
}

pub async fn run(
    config: ServiceConfig,
    file: PathBuf,
    position: Position,
    flags: Flags,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(&file)?;
    let cursor = position.to_offset(&text)?;

    let (service, mut rx) = luasense_runtime::build_default_service(&config)?;
    let catalog = service.catalog();

    let table = VariableTableBuilder::new(catalog.as_ref()).build(&text);
    let resolution = Resolver::new(catalog.as_ref())
        .with_min_rest_typed_len(config.completion.min_rest_typed_len)
        .resolve(&text, cursor, &table);

    let document = DocumentId::new(file.display().to_string());
    let request = CompletionRequest::new(text.as_str(), cursor)
        .with_constant(flags.constant)
        .with_function_parameters(flags.params);
    let generation = service.request(&document, request);
    info!("Resolving {} at byte {} (generation {})", document, cursor, generation);

    let mut events = Vec::new();
    let first = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .map_err(|_| "timed out waiting for the worker")?;
    if let Some(first) = first {
        events.push(first);
        // A run sends all of its events in one go.
        while let Ok(next) = rx.try_recv() {
            events.push(next);
        }
    }

    let (resolution, error) = match resolution {
        Ok(res) => (Some(res), None),
        Err(e) => (None, Some(e.to_string())),
    };
    let report = Report {
        cursor,
        resolution,
        error,
        events,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_col() {
        assert_eq!(Position::parse_line_col("3:7"), Ok(Position::LineCol(3, 7)));
        assert!(Position::parse_line_col("3").is_err());
        assert!(Position::parse_line_col("0:1").is_err());
        assert!(Position::parse_line_col("a:1").is_err());
    }

    #[test]
    fn test_line_col_to_offset() {
        let text = "local a = 1\r\nlocal b = a\n";
        assert_eq!(Position::LineCol(1, 1).to_offset(text), Ok(0));
        assert_eq!(Position::LineCol(1, 12).to_offset(text), Ok(11));
        assert_eq!(Position::LineCol(2, 7).to_offset(text), Ok(19));
        assert_eq!(Position::LineCol(3, 1).to_offset(text), Ok(text.len()));
        assert!(Position::LineCol(2, 40).to_offset(text).is_err());
        assert!(Position::LineCol(9, 1).to_offset(text).is_err());
    }

    #[test]
    fn test_offset_bounds() {
        assert_eq!(Position::End.to_offset("abc"), Ok(3));
        assert_eq!(Position::Offset(2).to_offset("abc"), Ok(2));
        assert!(Position::Offset(4).to_offset("abc").is_err());
    }
}
