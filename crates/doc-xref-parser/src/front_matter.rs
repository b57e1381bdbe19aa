use std::ops::Range;

use crate::ParseError;

/// Locate a leading front-matter block (`---` YAML or `+++` TOML).
///
/// Returns the byte range covered by the block, including both delimiter lines,
/// or `None` when the document does not open with a delimiter. A block that is
/// opened but never closed is an error.
pub fn front_matter_span(source: &str) -> Result<Option<Range<usize>>, ParseError> {
    let start = if source.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };

    let mut lines = source[start..].split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(None);
    };

    let delimiter = match trim_line(first) {
        "---" => "---",
        "+++" => "+++",
        _ => return Ok(None),
    };

    let mut offset = start + first.len();
    for line in lines {
        offset += line.len();
        let trimmed = trim_line(line);
        if trimmed == delimiter || (delimiter == "---" && trimmed == "...") {
            return Ok(Some(start..offset));
        }
    }

    Err(ParseError::UnterminatedFrontMatter {
        delimiter: delimiter.to_string(),
    })
}

fn trim_line(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r']).trim_end()
}
