// src/blame/parser.rs

// Parser for `git blame --line-porcelain` output.
//
// Every line of the blamed file is reported as a group: a commit header
// (`sha orig-line final-line [count]`), a run of `key value` headers, then
// the line content prefixed with a TAB.

use crate::error::{ParseError, ParseErrorKind};
use crate::model::BlameRecord;
use tracing::{trace, warn};

/// Records parsed from one file's porcelain output, plus the groups that had
/// to be skipped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedBlame {
    pub records: Vec<BlameRecord>,
    pub errors: Vec<ParseError>,
}

/// Parse the porcelain output of one file.
///
/// Malformed groups are skipped and reported in `errors`; the rest of the
/// output is still parsed.
pub fn parse_porcelain(raw: &str, file_path: &str) -> ParsedBlame {
    let mut parsed = ParsedBlame::default();
    let mut header: Vec<&str> = Vec::new();
    let mut group_start = 1;

    // split on LF only so a CR belonging to the blamed line survives
    for (idx, line) in raw.split('\n').enumerate() {
        if let Some(content) = line.strip_prefix('\t') {
            match build_record(&header, content, file_path) {
                Ok(record) => parsed.records.push(record),
                Err(kind) => parsed.errors.push(ParseError {
                    line: group_start,
                    kind,
                }),
            }
            header.clear();
        } else if !line.is_empty() {
            if header.is_empty() {
                group_start = idx + 1;
            }
            header.push(line);
        }
    }

    if !header.is_empty() {
        parsed.errors.push(ParseError {
            line: group_start,
            kind: ParseErrorKind::MissingContent,
        });
    }

    for err in &parsed.errors {
        warn!(path = file_path, "skipped malformed blame group at {}", err);
    }
    parsed
}

fn build_record(
    header: &[&str],
    content: &str,
    file_path: &str,
) -> Result<BlameRecord, ParseErrorKind> {
    let (first, rest) = header.split_first().ok_or(ParseErrorKind::MissingHeader)?;

    let tokens: Vec<&str> = first.split(' ').collect();
    let line_number = tokens
        .get(2)
        .and_then(|t| t.parse::<u32>().ok())
        .filter(|n| *n > 0);
    let (sha, line_number) = match (tokens.first(), line_number) {
        (Some(sha), Some(n)) if !sha.is_empty() => (sha.to_string(), n),
        _ => return Err(ParseErrorKind::BadCommitHeader(first.to_string())),
    };

    let mut record = BlameRecord {
        sha,
        line_number,
        file_path: file_path.to_string(),
        changed_line: content.to_string(),
        ..BlameRecord::default()
    };

    for entry in rest {
        let (key, value) = entry.split_once(' ').unwrap_or((entry, ""));
        match key {
            "author" => record.author = value.to_string(),
            "author-mail" => record.author_mail = value.to_string(),
            "author-time" => record.author_time = parse_timestamp(key, value)?,
            "author-tz" => record.author_tz = value.to_string(),
            "committer" => record.committer = value.to_string(),
            "committer-mail" => record.committer_mail = value.to_string(),
            "committer-time" => record.committer_time = parse_timestamp(key, value)?,
            "committer-tz" => record.committer_tz = value.to_string(),
            "summary" => record.summary = value.to_string(),
            "boundary" | "previous" | "filename" => {}
            other => trace!(key = other, "dropping porcelain header"),
        }
    }

    Ok(record)
}

fn parse_timestamp(key: &str, value: &str) -> Result<Option<i64>, ParseErrorKind> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ParseErrorKind::BadTimestamp {
            key: key.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA_A: &str = "3f1c2a9e5b7d4c6a8e0f1b2c3d4e5f6a7b8c9d0e";
    const SHA_B: &str = "9a8b7c6d5e4f3a2b1c0d9e8f7a6b5c4d3e2f1a0b";

    fn group(sha: &str, line: u32, author: &str, time: i64, content: &str) -> String {
        format!(
            "{sha} {line} {line} 1\n\
             author {author}\n\
             author-mail <{author}@example.com>\n\
             author-time {time}\n\
             author-tz +0200\n\
             committer {author}\n\
             committer-mail <{author}@example.com>\n\
             committer-time {time}\n\
             committer-tz +0200\n\
             summary Touch line {line}\n\
             previous {SHA_B} src/old.rs\n\
             filename src/lib.rs\n\
             \t{content}\n"
        )
    }

    #[test]
    fn test_parses_one_record_per_group() {
        let raw = group(SHA_A, 1, "alice", 1_600_000_000, "fn main() {")
            + &group(SHA_B, 2, "bob", 1_700_000_000, "    println!(\"hi\");")
            + &group(SHA_A, 3, "alice", 1_600_000_000, "}");

        let parsed = parse_porcelain(&raw, "src/lib.rs");

        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.records.len(), 3);
        let lines: Vec<u32> = parsed.records.iter().map(|r| r.line_number).collect();
        assert_eq!(lines, vec![1, 2, 3]);

        let second = &parsed.records[1];
        assert_eq!(second.sha, SHA_B);
        assert_eq!(second.author, "bob");
        assert_eq!(second.author_mail, "<bob@example.com>");
        assert_eq!(second.author_time, Some(1_700_000_000));
        assert_eq!(second.author_tz, "+0200");
        assert_eq!(second.committer_time, Some(1_700_000_000));
        assert_eq!(second.summary, "Touch line 2");
        assert_eq!(second.file_path, "src/lib.rs");
        assert_eq!(second.changed_line, "    println!(\"hi\");");
    }

    #[test]
    fn test_line_number_comes_from_final_position() {
        let raw = format!("{SHA_A} 7 2\nauthor carol\n\tmoved line\n");
        let parsed = parse_porcelain(&raw, "a.txt");
        assert_eq!(parsed.records[0].line_number, 2);
    }

    #[test]
    fn test_boundary_and_empty_values() {
        let raw = format!(
            "{SHA_A} 1 1 1\nauthor dave\nboundary\nsummary\nauthor-mail \n\t\n"
        );
        let parsed = parse_porcelain(&raw, "a.txt");

        assert!(parsed.errors.is_empty());
        let record = &parsed.records[0];
        assert_eq!(record.author, "dave");
        assert_eq!(record.summary, "");
        assert_eq!(record.author_mail, "");
        assert_eq!(record.author_time, None);
        assert_eq!(record.changed_line, "");
    }

    #[test]
    fn test_carriage_return_in_content_is_kept() {
        let raw = group(SHA_A, 1, "frank", 1_600_000_000, "dos line\r");
        let parsed = parse_porcelain(&raw, "a.txt");
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.records[0].changed_line, "dos line\r");
        assert_eq!(parsed.records[0].author, "frank");
    }

    #[test]
    fn test_unknown_headers_are_dropped() {
        let raw = format!("{SHA_A} 1 1 1\nauthor erin\nencoding latin1\n\tx\n");
        let parsed = parse_porcelain(&raw, "a.txt");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].author, "erin");
    }

    #[test]
    fn test_empty_output_yields_no_records() {
        let parsed = parse_porcelain("", "empty.txt");
        assert!(parsed.records.is_empty());
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn test_malformed_group_is_skipped() {
        let raw = format!("{SHA_A} one two\nauthor frank\n\tbad\n")
            + &group(SHA_B, 2, "grace", 1_650_000_000, "good");

        let parsed = parse_porcelain(&raw, "a.txt");

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].author, "grace");
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].line, 1);
        assert!(matches!(
            parsed.errors[0].kind,
            ParseErrorKind::BadCommitHeader(_)
        ));
    }

    #[test]
    fn test_bad_timestamp_is_reported() {
        let raw = format!("{SHA_A} 1 1 1\nauthor-time yesterday\n\tx\n");
        let parsed = parse_porcelain(&raw, "a.txt");
        assert!(parsed.records.is_empty());
        assert_eq!(
            parsed.errors[0].kind,
            ParseErrorKind::BadTimestamp {
                key: "author-time".into(),
                value: "yesterday".into()
            }
        );
    }

    #[test]
    fn test_truncated_output_reports_missing_content() {
        let raw = group(SHA_A, 1, "heidi", 1_600_000_000, "kept")
            + &format!("{SHA_B} 2 2 1\nauthor ivan\n");

        let parsed = parse_porcelain(&raw, "a.txt");

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].line, 14);
        assert_eq!(parsed.errors[0].kind, ParseErrorKind::MissingContent);
    }

    #[test]
    fn test_content_without_header() {
        let parsed = parse_porcelain("\torphan\n", "a.txt");
        assert_eq!(parsed.errors[0].kind, ParseErrorKind::MissingHeader);
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let raw = group(SHA_A, 1, "judy", 1_600_000_000, "a")
            + &group(SHA_B, 2, "ken", 1_600_000_100, "b");
        assert_eq!(parse_porcelain(&raw, "f"), parse_porcelain(&raw, "f"));
    }
}
