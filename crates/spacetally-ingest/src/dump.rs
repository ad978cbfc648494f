//! Policy-dump line parser.
//!
//! A dump line is a whitespace-separated list of at least 17 fields:
//!
//! | idx | field |
//! |-----|-------|
//! | 3   | file size in bytes |
//! | 6   | attribute flags (`F` marks an ordinary file) |
//! | 11  | access time |
//! | 12  | modification time |
//! | 14  | change time |
//! | 16… | file name, `%2F`-encoded; further fields belong to a name with spaces |

use std::io::{self, BufRead};

use spacetally_core::{FileRecord, IngestWarning, RecordPath, Timestamps, WarningKind};

/// Encoded path separator inside dump file names.
pub const PATH_SEPARATOR: &str = "%2F";

/// Minimum number of fields in a well-formed line.
pub const MIN_FIELDS: usize = 17;

const SIZE: usize = 3;
const ATTRIBUTES: usize = 6;
const ACCESS_TIME: usize = 11;
const MODIFY_TIME: usize = 12;
const CHANGE_TIME: usize = 14;
const FILE_NAME: usize = 16;

/// Result of parsing one dump line.
#[derive(Debug, Clone, PartialEq)]
pub enum DumpLine {
    /// An ordinary file.
    File(FileRecord),
    /// A well-formed entry that is not an ordinary file, or a blank line.
    Skipped,
    /// A line that could not be parsed.
    Malformed(IngestWarning),
}

/// Parse one line. `line_no` is only used for warnings.
pub fn parse_line(line: &str, line_no: u64) -> DumpLine {
    let fields: Vec<&str> = line.split_whitespace().collect();

    if fields.is_empty() {
        return DumpLine::Skipped;
    }
    if fields.len() < MIN_FIELDS {
        return DumpLine::Malformed(IngestWarning::too_few_fields(
            line_no,
            fields.len(),
            MIN_FIELDS,
        ));
    }
    if !fields[ATTRIBUTES].contains('F') {
        return DumpLine::Skipped;
    }

    let size = match fields[SIZE].parse::<u64>() {
        Ok(size) => size,
        Err(_) => {
            return DumpLine::Malformed(IngestWarning::invalid_number(
                line_no,
                "size",
                fields[SIZE],
            ));
        }
    };

    let mut times = [0i64; 3];
    for (slot, (idx, label)) in times.iter_mut().zip([
        (ACCESS_TIME, "access time"),
        (MODIFY_TIME, "modification time"),
        (CHANGE_TIME, "change time"),
    ]) {
        match fields[idx].parse::<i64>() {
            Ok(value) => *slot = value,
            Err(_) => {
                return DumpLine::Malformed(IngestWarning::invalid_number(
                    line_no,
                    label,
                    fields[idx],
                ));
            }
        }
    }
    let [accessed, modified, created] = times;

    let name = fields[FILE_NAME..].join(" ");
    let Some(path) = RecordPath::parse(&name, PATH_SEPARATOR) else {
        return DumpLine::Malformed(IngestWarning::new(
            line_no,
            format!("File name {name:?} has no path segments"),
            WarningKind::EmptyPath,
        ));
    };

    DumpLine::File(FileRecord::new(
        path,
        size,
        Timestamps::new(accessed, modified, created),
    ))
}

/// Streams parsed lines out of a dump.
///
/// Yields `(line_no, line)`; only genuine read failures are errors.
pub struct DumpReader<R> {
    reader: R,
    line_no: u64,
    buf: Vec<u8>,
}

impl<R: BufRead> DumpReader<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: Vec::new(),
        }
    }

    /// Number of lines read so far.
    pub fn lines_read(&self) -> u64 {
        self.line_no
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = io::Result<(u64, DumpLine)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line_no += 1;
                let parsed = match std::str::from_utf8(&self.buf) {
                    Ok(text) => parse_line(text, self.line_no),
                    Err(_) => DumpLine::Malformed(IngestWarning::new(
                        self.line_no,
                        "Line is not valid UTF-8",
                        WarningKind::InvalidEncoding,
                    )),
                };
                Some(Ok((self.line_no, parsed)))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(attrs: &str, size: &str, name: &str) -> String {
        format!(
            "20656 65544 0 {size} star 65544 {attrs} 1 59805 4002 -rw-r----- \
             1455931754 1455931700 131072 1455931600 -- {name}"
        )
    }

    #[test]
    fn test_parse_file_line() {
        let parsed = parse_line(
            &line("FAu", "512", "%2Fproject%2Fstar%2Fpwg%2Fhist.root"),
            1,
        );
        let DumpLine::File(record) = parsed else {
            panic!("expected a file record");
        };
        assert_eq!(record.size, 512);
        assert_eq!(record.path.to_string(), "project/star/pwg/hist.root");
        assert_eq!(record.timestamps, Timestamps::new(1455931754, 1455931700, 1455931600));
    }

    #[test]
    fn test_parse_name_with_spaces() {
        let parsed = parse_line(&line("F", "1", "%2Fa%2Fmy file  name.txt"), 1);
        let DumpLine::File(record) = parsed else {
            panic!("expected a file record");
        };
        assert_eq!(record.path.file_name(), "my file name.txt");
    }

    #[test]
    fn test_directories_are_skipped() {
        assert_eq!(parse_line(&line("D2u", "4096", "%2Fa"), 1), DumpLine::Skipped);
        assert_eq!(parse_line("   ", 2), DumpLine::Skipped);
    }

    #[test]
    fn test_short_line_is_malformed() {
        let DumpLine::Malformed(warning) = parse_line("1 2 3", 9) else {
            panic!("expected malformed");
        };
        assert_eq!(warning.kind, WarningKind::TooFewFields);
        assert_eq!(warning.line, 9);
    }

    #[test]
    fn test_bad_size_is_malformed() {
        let DumpLine::Malformed(warning) = parse_line(&line("F", "-12", "%2Fa%2Fb"), 3) else {
            panic!("expected malformed");
        };
        assert_eq!(warning.kind, WarningKind::InvalidNumber);
    }

    #[test]
    fn test_reader_counts_lines() {
        let input = format!(
            "{}\nbroken\n{}\n",
            line("F", "1", "%2Fa%2Fx"),
            line("F", "2", "%2Fa%2Fy")
        );
        let mut reader = DumpReader::new(input.as_bytes());
        let lines: Vec<_> = reader.by_ref().map(Result::unwrap).collect();

        assert_eq!(lines.len(), 3);
        assert!(matches!(lines[1], (2, DumpLine::Malformed(_))));
        assert_eq!(reader.lines_read(), 3);
    }

    #[test]
    fn test_invalid_utf8_line_is_malformed() {
        let mut input = line("F", "1", "%2Fa%2Fx").into_bytes();
        input.extend_from_slice(b"\n");
        input.extend_from_slice(line("F", "2", "%2Fa%2F").as_bytes());
        input.extend_from_slice(b"\xff\xfe\n");
        input.extend_from_slice(line("F", "3", "%2Fa%2Fz").as_bytes());

        let lines: Vec<_> = DumpReader::new(input.as_slice())
            .map(Result::unwrap)
            .collect();

        assert_eq!(lines.len(), 3);
        let (line_no, DumpLine::Malformed(warning)) = &lines[1] else {
            panic!("expected a malformed line");
        };
        assert_eq!(*line_no, 2);
        assert_eq!(warning.line, 2);
        assert_eq!(warning.kind, WarningKind::InvalidEncoding);
        assert!(matches!(lines[2], (3, DumpLine::File(_))));
    }
}
