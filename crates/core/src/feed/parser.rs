//! Incremental scanner for the catalog's compact record format.
//!
//! The decompressed feed is one large JSON object: a `"Filmliste"` header
//! followed by the record list under the key `"X"`. Records appear either as
//! repeated `"X": [...]` pairs (one positional field array per pair) or as a
//! single `"X": [[...], [...]]` wrapper list; both shapes are handled.
//!
//! The scanner is fed raw byte chunks and yields one field array per record
//! without ever materializing the document. Tokenizing is string-aware:
//! commas, quotes and brackets inside field values never confuse it, and all
//! scan state (including an unfinished record) carries across chunk
//! boundaries.

use serde_json::Value;

use super::FeedError;

/// Key under which record arrays are stored in the feed document.
pub const RECORD_KEY: &[u8] = b"X";

/// One raw positional field array, in document order.
pub type RawRecord = Vec<String>;

/// Incremental, chunk-fed record scanner.
pub struct RecordScanner {
    started: bool,
    depth: usize,
    in_string: bool,
    escaped: bool,
    expect_key: bool,
    reading_key: bool,
    key_buf: Vec<u8>,
    current_key: Vec<u8>,
    /// Inside a top-level array bound to [`RECORD_KEY`].
    outer_active: bool,
    /// The outer array turned out to be a wrapper list of record arrays.
    wrapped: bool,
    /// Actively accumulating record bytes into `buf`.
    collecting: bool,
    buf: Vec<u8>,
    records: u64,
}

impl RecordScanner {
    pub fn new() -> Self {
        Self {
            started: false,
            depth: 0,
            in_string: false,
            escaped: false,
            expect_key: false,
            reading_key: false,
            key_buf: Vec::new(),
            current_key: Vec::new(),
            outer_active: false,
            wrapped: false,
            collecting: false,
            buf: Vec::new(),
            records: 0,
        }
    }

    /// Number of records emitted so far.
    pub fn records_seen(&self) -> u64 {
        self.records
    }

    /// Feed the next chunk, appending completed records to `out`.
    pub fn push(&mut self, chunk: &[u8], out: &mut Vec<RawRecord>) -> Result<(), FeedError> {
        for &b in chunk {
            self.push_byte(b, out)?;
        }
        Ok(())
    }

    /// Verify the document ended cleanly.
    pub fn finish(&self) -> Result<(), FeedError> {
        if !self.started {
            return Err(FeedError::Parse("empty catalog document".to_string()));
        }
        if self.depth != 0 || self.in_string || self.outer_active {
            return Err(FeedError::Parse(format!(
                "truncated catalog document after {} records",
                self.records
            )));
        }
        Ok(())
    }

    fn push_byte(&mut self, b: u8, out: &mut Vec<RawRecord>) -> Result<(), FeedError> {
        if !self.started {
            // Leading whitespace and a UTF-8 BOM are tolerated before the
            // root object.
            if b.is_ascii_whitespace() || matches!(b, 0xef | 0xbb | 0xbf) {
                return Ok(());
            }
            if b != b'{' {
                return Err(FeedError::Parse(
                    "expected top-level object".to_string(),
                ));
            }
            self.started = true;
            self.depth = 1;
            self.expect_key = true;
            return Ok(());
        }

        if self.depth == 0 {
            // Root object already closed; only trailing whitespace is valid.
            if b.is_ascii_whitespace() {
                return Ok(());
            }
            return Err(FeedError::Parse(
                "unexpected content after catalog document".to_string(),
            ));
        }

        if self.in_string {
            if self.collecting {
                self.buf.push(b);
            }
            if self.escaped {
                self.escaped = false;
                if self.reading_key {
                    self.key_buf.push(b);
                }
            } else if b == b'\\' {
                self.escaped = true;
            } else if b == b'"' {
                self.in_string = false;
                if self.reading_key {
                    self.reading_key = false;
                    self.current_key = std::mem::take(&mut self.key_buf);
                }
            } else if self.reading_key {
                self.key_buf.push(b);
            }
            return Ok(());
        }

        match b {
            b'"' => {
                self.in_string = true;
                if self.collecting {
                    self.buf.push(b);
                } else if self.depth == 1 && self.expect_key {
                    self.reading_key = true;
                    self.key_buf.clear();
                }
            }
            b':' => {
                if self.collecting {
                    self.buf.push(b);
                }
                if self.depth == 1 {
                    self.expect_key = false;
                }
            }
            b',' => {
                if self.collecting {
                    self.buf.push(b);
                }
                if self.depth == 1 {
                    self.expect_key = true;
                }
            }
            b'{' => {
                self.depth += 1;
                if self.collecting {
                    self.buf.push(b);
                }
            }
            b'}' => {
                if self.depth == 1 && (self.outer_active || self.collecting) {
                    return Err(FeedError::Parse(format!(
                        "unterminated record list after {} records",
                        self.records
                    )));
                }
                self.depth -= 1;
                if self.collecting && self.depth >= 1 {
                    self.buf.push(b);
                }
            }
            b'[' => {
                self.depth += 1;
                if self.depth == 2 {
                    if self.current_key == RECORD_KEY {
                        self.outer_active = true;
                        self.wrapped = false;
                        self.collecting = true;
                        self.buf.clear();
                        self.buf.push(b);
                    }
                } else if self.outer_active && self.depth == 3 {
                    // Records one level down: the depth-2 array is a wrapper.
                    self.wrapped = true;
                    self.collecting = true;
                    self.buf.clear();
                    self.buf.push(b);
                } else if self.collecting {
                    self.buf.push(b);
                }
            }
            b']' => {
                if self.depth == 1 {
                    return Err(FeedError::Parse(
                        "unbalanced bracket in catalog document".to_string(),
                    ));
                }
                self.depth -= 1;
                if self.outer_active {
                    if self.wrapped && self.depth == 2 {
                        if self.collecting {
                            self.buf.push(b);
                            let record = self.decode_record()?;
                            out.push(record);
                            self.records += 1;
                            self.collecting = false;
                        }
                    } else if self.depth == 1 {
                        if !self.wrapped && self.collecting {
                            self.buf.push(b);
                            let record = self.decode_record()?;
                            out.push(record);
                            self.records += 1;
                        }
                        self.outer_active = false;
                        self.collecting = false;
                    } else if self.collecting {
                        self.buf.push(b);
                    }
                }
            }
            _ => {
                if self.collecting {
                    self.buf.push(b);
                }
            }
        }
        Ok(())
    }

    fn decode_record(&self) -> Result<RawRecord, FeedError> {
        let values: Vec<Value> = serde_json::from_slice(&self.buf).map_err(|e| {
            FeedError::Parse(format!("record {}: {}", self.records + 1, e))
        })?;

        values
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                Value::Null => Ok(String::new()),
                Value::Bool(b) => Ok(b.to_string()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(FeedError::Parse(format!(
                    "record {}: unexpected nested value {}",
                    self.records + 1,
                    other
                ))),
            })
            .collect()
    }
}

impl Default for RecordScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(doc: &str) -> Vec<RawRecord> {
        let mut scanner = RecordScanner::new();
        let mut out = Vec::new();
        scanner.push(doc.as_bytes(), &mut out).unwrap();
        scanner.finish().unwrap();
        out
    }

    /// Feed the document one byte at a time; chunk boundaries must never
    /// change the result.
    fn scan_bytewise(doc: &str) -> Vec<RawRecord> {
        let mut scanner = RecordScanner::new();
        let mut out = Vec::new();
        for b in doc.as_bytes() {
            scanner.push(std::slice::from_ref(b), &mut out).unwrap();
        }
        scanner.finish().unwrap();
        out
    }

    const REPEATED_KEY_DOC: &str = r#"{
        "Filmliste": ["07.08.2026, 09:00", "3"],
        "Filmliste": ["Sender", "Thema", "Titel"],
        "X": ["ARD", "News", "Tagesschau", "07.08.2026"],
        "X": ["", "", "Tagesthemen"],
        "X": ["ZDF", "heute", "heute journal"]
    }"#;

    #[test]
    fn test_repeated_key_records() {
        let records = scan_all(REPEATED_KEY_DOC);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0][0], "ARD");
        assert_eq!(records[1], vec!["", "", "Tagesthemen"]);
        assert_eq!(records[2][2], "heute journal");
    }

    #[test]
    fn test_wrapped_list_records() {
        let doc = r#"{"Filmliste": ["header"], "X": [["ARD","News","A"],["ZDF","heute","B"]]}"#;
        let records = scan_all(doc);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], vec!["ARD", "News", "A"]);
        assert_eq!(records[1], vec!["ZDF", "heute", "B"]);
    }

    #[test]
    fn test_header_arrays_are_skipped() {
        let records = scan_all(REPEATED_KEY_DOC);
        assert!(records.iter().all(|r| r[0] != "Sender"));
    }

    #[test]
    fn test_chunk_boundaries_do_not_matter() {
        assert_eq!(scan_bytewise(REPEATED_KEY_DOC), scan_all(REPEATED_KEY_DOC));

        let wrapped = r#"{"X": [["a \"quoted\" title, with commas","[brackets]"]]}"#;
        assert_eq!(scan_bytewise(wrapped), scan_all(wrapped));
    }

    #[test]
    fn test_string_aware_tokenizing() {
        let doc = r#"{"X": ["AR\"D", "a, b, c", "tit]le [x]", "{}"]}"#;
        let records = scan_all(doc);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0][0], "AR\"D");
        assert_eq!(records[0][1], "a, b, c");
        assert_eq!(records[0][2], "tit]le [x]");
        assert_eq!(records[0][3], "{}");
    }

    #[test]
    fn test_unicode_content() {
        let doc = r#"{"X": ["ARD", "Nachrichten", "Wetter für übermorgen — süß"]}"#;
        let records = scan_bytewise(doc);
        assert_eq!(records[0][2], "Wetter für übermorgen — süß");
    }

    #[test]
    fn test_partial_record_is_emitted_as_is() {
        let records = scan_all(r#"{"X": ["ARD", "News", "Title"]}"#);
        assert_eq!(records[0].len(), 3);
    }

    #[test]
    fn test_records_seen() {
        let mut scanner = RecordScanner::new();
        let mut out = Vec::new();
        scanner
            .push(REPEATED_KEY_DOC.as_bytes(), &mut out)
            .unwrap();
        assert_eq!(scanner.records_seen(), 3);
    }

    #[test]
    fn test_top_level_array_is_fatal() {
        let mut scanner = RecordScanner::new();
        let mut out = Vec::new();
        let result = scanner.push(b"[1, 2]", &mut out);
        assert!(matches!(result, Err(FeedError::Parse(_))));
    }

    #[test]
    fn test_truncated_document_is_fatal() {
        let mut scanner = RecordScanner::new();
        let mut out = Vec::new();
        scanner
            .push(br#"{"X": ["ARD", "News""#, &mut out)
            .unwrap();
        assert!(matches!(scanner.finish(), Err(FeedError::Parse(_))));
    }

    #[test]
    fn test_malformed_record_is_fatal() {
        let mut scanner = RecordScanner::new();
        let mut out = Vec::new();
        // Nested object where a field string belongs
        let result = scanner.push(br#"{"X": ["ARD", {"bad": 1}]}"#, &mut out);
        assert!(matches!(result, Err(FeedError::Parse(_))));
    }

    #[test]
    fn test_error_reports_records_parsed_so_far() {
        let mut scanner = RecordScanner::new();
        let mut out = Vec::new();
        let doc = br#"{"X": ["ARD","News","A"], "X": ["ZDF","heute","B"], "#;
        scanner.push(doc, &mut out).unwrap();
        assert_eq!(out.len(), 2);
        let err = scanner.finish().unwrap_err();
        assert!(err.to_string().contains("2 records"));
    }

    #[test]
    fn test_empty_document_is_fatal() {
        let scanner = RecordScanner::new();
        assert!(matches!(scanner.finish(), Err(FeedError::Parse(_))));
    }

    #[test]
    fn test_bom_and_whitespace_prefix() {
        let mut doc = vec![0xef, 0xbb, 0xbf, b'\n'];
        doc.extend_from_slice(br#"{"X": ["ARD","News","A"]}"#);
        let mut scanner = RecordScanner::new();
        let mut out = Vec::new();
        scanner.push(&doc, &mut out).unwrap();
        scanner.finish().unwrap();
        assert_eq!(out.len(), 1);
    }
}
