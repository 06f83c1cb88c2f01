//! Minimal CSV reading/writing
//!
//! Rationale strings carry commas, quotes, and pipes, so fields are
//! quoted per RFC 4180. The parser is a small state machine that
//! tolerates quoted newlines.

/// Format one row, quoting any field that needs it.
pub fn format_row(fields: &[&str]) -> String {
    let mut row = fields
        .iter()
        .map(|f| quote_field(f))
        .collect::<Vec<_>>()
        .join(",");
    row.push('\n');
    row
}

fn quote_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Parse a whole CSV document into records of fields.
pub fn parse_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => {
                    record.push(std::mem::take(&mut field));
                }
                '\r' => {}
                '\n' => {
                    record.push(std::mem::take(&mut field));
                    if !(record.len() == 1 && record[0].is_empty()) {
                        records.push(std::mem::take(&mut record));
                    } else {
                        record.clear();
                    }
                }
                _ => field.push(c),
            }
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_fields_with_commas_and_quotes() {
        let row = format_row(&["s1", "0", "He said \"no\", twice"]);
        assert_eq!(row, "s1,0,\"He said \"\"no\"\", twice\"\n");
    }

    #[test]
    fn round_trips_awkward_rationales() {
        let rationale = "[Claim]: x, y | [Evidence]: \"quoted...\" | [Analysis]: z";
        let row = format_row(&["s1", "1", rationale]);
        let records = parse_records(&row);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0], vec!["s1", "1", rationale]);
    }

    #[test]
    fn parses_multiple_rows_and_skips_blank_lines() {
        let content = "Story ID,Prediction,Rationale\ns1,1,ok\n\ns2,0,bad\n";
        let records = parse_records(content);

        assert_eq!(records.len(), 3);
        assert_eq!(records[1][0], "s1");
        assert_eq!(records[2][0], "s2");
    }

    #[test]
    fn handles_quoted_newlines() {
        let content = "a,\"line one\nline two\",c\n";
        let records = parse_records(content);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0][1], "line one\nline two");
    }
}
