//! Table loading with encoding and delimiter auto-detection.
//!
//! Delimited text goes through [`parse_bytes_auto`]: the encoding is guessed
//! with `chardet`, decoded with `encoding_rs`, the delimiter is sniffed from
//! a sample, and records are read with the `csv` crate. Spreadsheets are
//! handled by [`sheet`]. Both produce a [`Table`] of raw string cells; no
//! dataset-specific logic lives here.

pub mod sheet;

use std::path::Path;

use crate::error::{InputError, InputResult};
use crate::models::Table;

/// Bytes of the input inspected when sniffing the delimiter.
const SNIFF_SAMPLE_BYTES: usize = 4096;

/// Delimiters considered by the sniffer, in tie-break order.
const CANDIDATE_DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed table
    pub table: Table,
    /// Detected encoding ("spreadsheet" for workbook input)
    pub encoding: String,
    /// Detected delimiter, `None` for workbook input
    pub delimiter: Option<char>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to string using the specified encoding.
///
/// A leading byte order mark overrides the label. Labels `encoding_rs`
/// does not know are an [`InputError::Encoding`].
pub fn decode_content(bytes: &[u8], encoding: &str) -> InputResult<String> {
    let label = match encoding.to_lowercase().as_str() {
        // ISO-8859-1 input in the wild is almost always cp1252 or 8859-15
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-15".to_string(),
        other => other.to_string(),
    };
    let codec = encoding_rs::Encoding::for_label(label.as_bytes())
        .ok_or_else(|| InputError::Encoding(encoding.to_string()))?;
    let (text, _, _) = codec.decode(bytes);
    Ok(text.into_owned())
}

/// Sniff the delimiter from the start of the content.
///
/// A candidate is preferred when it occurs the same non-zero number of times
/// (outside quotes) on every sampled line; among those the most frequent
/// wins. Without a consistent candidate the most frequent one on the header
/// line is used, and comma is the fallback.
pub fn detect_delimiter(content: &str) -> char {
    let lines = sample_lines(content);
    let Some(header) = lines.first() else {
        return ',';
    };

    let mut best: Option<(char, usize)> = None;
    for &sep in &CANDIDATE_DELIMITERS {
        let first = count_unquoted(header, sep);
        if first == 0 {
            continue;
        }
        let consistent = lines.iter().all(|line| count_unquoted(line, sep) == first);
        if consistent && best.map_or(true, |(_, n)| first > n) {
            best = Some((sep, first));
        }
    }
    if let Some((sep, _)) = best {
        return sep;
    }

    let mut fallback = (',', 0);
    for &sep in &CANDIDATE_DELIMITERS {
        let count = count_unquoted(header, sep);
        if count > fallback.1 {
            fallback = (sep, count);
        }
    }
    fallback.0
}

/// Non-empty lines from the first [`SNIFF_SAMPLE_BYTES`] of `content`,
/// without a trailing partial line.
fn sample_lines(content: &str) -> Vec<&str> {
    let mut end = content.len().min(SNIFF_SAMPLE_BYTES);
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    let sample = &content[..end];
    let truncated = end < content.len();

    let mut lines: Vec<&str> = sample.lines().filter(|l| !l.trim().is_empty()).collect();
    if truncated && lines.len() > 1 && !sample.ends_with('\n') {
        lines.pop();
    }
    lines
}

fn count_unquoted(line: &str, sep: char) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == sep && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Normalize a header: strip whitespace and surrounding quotes.
pub fn clean_header(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}

/// Parse decoded CSV text with an explicit delimiter.
///
/// Short rows are padded, long rows truncated to the header width. Blank
/// lines are skipped. Cells are trimmed.
pub fn parse_table(content: &str, delimiter: char) -> InputResult<Table> {
    if content.trim().is_empty() {
        return Err(InputError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| malformed(&e))?
        .iter()
        .map(clean_header)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(InputError::Empty);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| malformed(&e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::new(headers, rows))
}

fn malformed(err: &csv::Error) -> InputError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    InputError::Malformed {
        line,
        message: err.to_string(),
    }
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> InputResult<ParseResult> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(InputError::Empty);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let table = parse_table(&content, delimiter)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter: Some(delimiter),
    })
}

/// Load a table from disk, dispatching on the file extension.
///
/// Workbooks (`.xlsx`, `.xlsm`, `.xls`, `.ods`, ...) are read from their
/// first sheet; anything else is treated as delimited text. Every error
/// names the file.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> InputResult<ParseResult> {
    let path = path.as_ref();
    load_file(path).map_err(|e| e.in_file(path))
}

fn load_file(path: &Path) -> InputResult<ParseResult> {
    if sheet::is_spreadsheet(path) {
        let table = sheet::load_first_sheet(path)?;
        return Ok(ParseResult {
            table,
            encoding: "spreadsheet".to_string(),
            delimiter: None,
        });
    }

    let bytes = std::fs::read(path).map_err(|source| InputError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bytes_auto(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_simple_csv() {
        let table = parse_table("name;age\nAlice;30\nBob;25", ';').unwrap();

        assert_eq!(table.headers, vec!["name", "age"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], vec!["Alice", "30"]);
        assert_eq!(table.rows[1], vec!["Bob", "25"]);
    }

    #[test]
    fn test_quoted_headers_and_values() {
        let csv = "\"Sex\",\"Region, subregion, country or area\",Year\n\"Female\",\"Iraq\",2020";
        let table = parse_table(csv, ',').unwrap();

        assert_eq!(table.headers[1], "Region, subregion, country or area");
        assert_eq!(table.rows[0], vec!["Female", "Iraq", "2020"]);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_table("a;b\n1;2\n\n3;4\n", ';').unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_and_extra_values() {
        let table = parse_table("a;b;c\n1;;3\n1\n1;2;3;4", ';').unwrap();

        assert_eq!(table.rows[0], vec!["1", "", "3"]);
        assert_eq!(table.rows[1], vec!["1", "", ""]);
        assert_eq!(table.rows[2], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_table("", ';'), Err(InputError::Empty)));
        assert!(matches!(parse_bytes_auto(b"  \n"), Err(InputError::Empty)));
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_detect_delimiter_prefers_consistent_candidate() {
        // Decimal commas vary per line, semicolons do not.
        let content = "Sex;Country;Year;0\nFemale;Iraq;2020;1,5\nMale;Iraq;2020;12";
        assert_eq!(detect_delimiter(content), ';');
    }

    #[test]
    fn test_detect_delimiter_ignores_quoted_separators() {
        let content = "\"Region, subregion, country or area\";Sex;Year\nIraq;Female;2020";
        assert_eq!(detect_delimiter(content), ';');
    }

    #[test]
    fn test_detect_delimiter_fallback_comma() {
        assert_eq!(detect_delimiter("single\nvalue"), ',');
        assert_eq!(detect_delimiter(""), ',');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto(b"name;age\nAlice;30\nBob;25").unwrap();

        assert_eq!(result.delimiter, Some(';'));
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.table.len(), 2);
        assert_eq!(result.table.headers, vec!["name", "age"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_unknown_encoding_is_input_error() {
        let err = decode_content(b"abc", "x-no-such-charset").unwrap_err();
        assert!(matches!(err, InputError::Encoding(_)));
    }

    #[test]
    fn test_parse_file_unreadable() {
        let err = parse_file_auto("/definitely/not/here.csv").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }

    #[test]
    fn test_file_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();

        let blank = dir.path().join("MiddleEastDeath.csv");
        std::fs::write(&blank, "  \n\n").unwrap();
        let err = parse_file_auto(&blank).unwrap_err();
        assert!(err.to_string().contains("MiddleEastDeath.csv"), "{err}");
        assert!(matches!(err.root(), InputError::Empty));

        let book = dir.path().join("broken.xlsx");
        std::fs::write(&book, "not a workbook").unwrap();
        let err = parse_file_auto(&book).unwrap_err();
        assert!(err.to_string().contains("broken.xlsx"), "{err}");
        assert!(matches!(err.root(), InputError::Sheet(_)));
    }

    #[test]
    fn test_parse_file_auto_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "Sex,Country,Year,0\nFemale,Iraq,2020,10\n").unwrap();

        let result = parse_file_auto(file.path()).unwrap();
        assert_eq!(result.delimiter, Some(','));
        assert_eq!(result.table.headers, vec!["Sex", "Country", "Year", "0"]);
        assert_eq!(result.table.rows[0][3], "10");
    }
}
