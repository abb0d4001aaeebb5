// ==========================================
// Sigorta CRM - file parsers
// ==========================================
// Stage 0 of the import pipeline: upload file -> header row + raw records.
// Supported: delimited text (semicolon/windows-1254 legacy export, comma/
// UTF-8 quote-aware variant) and Excel (.xlsx). The delimiter and
// quoting style come from the per-file-format configuration, never from
// sniffing the content.
// ==========================================

use crate::domain::{CsvFormat, ImportFormat};
use crate::importer::encoding;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_decoder::RawRow;
use calamine::{open_workbook, Reader, Xlsx};
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;

/// Header row plus all non-blank data records of one upload.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

pub trait FileParser: Send + Sync {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedFile>;
}

// ==========================================
// CsvParser
// ==========================================
pub struct CsvParser {
    format: CsvFormat,
}

impl CsvParser {
    pub fn new(format: CsvFormat) -> Self {
        Self { format }
    }
}

impl FileParser for CsvParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedFile> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "csv" && ext != "txt" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        // Decode the legacy code page before any line/field splitting.
        let bytes = fs::read(file_path)?;
        let text = encoding::decode(&bytes, self.format.encoding());

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.format.delimiter())
            .quoting(self.format.quoting())
            .flexible(true) // short rows are the decoder's call, not a parse error
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let cells: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();

            // skip fully blank rows (trailing newlines etc.)
            if cells.iter().all(|c| c.is_empty()) {
                continue;
            }

            rows.push(RawRow {
                row_number: idx + 1,
                cells,
            });
        }

        Ok(ParsedFile { headers, rows })
    }
}

// ==========================================
// ExcelParser
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedFile> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook: Xlsx<_> = open_workbook(file_path)?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("workbook has no sheets".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let mut sheet_rows = range.rows();
        let header_row = sheet_rows.next().ok_or(ImportError::EmptyFile)?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, data_row) in sheet_rows.enumerate() {
            let cells: Vec<String> = data_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect();

            if cells.iter().all(|c| c.is_empty()) {
                continue;
            }

            rows.push(RawRow {
                row_number: idx + 1,
                cells,
            });
        }

        Ok(ParsedFile { headers, rows })
    }
}

// ==========================================
// UniversalFileParser - format dispatch
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(
        &self,
        file_path: P,
        format: ImportFormat,
    ) -> ImportResult<ParsedFile> {
        match format {
            ImportFormat::Csv(csv_format) => CsvParser::new(csv_format).parse(file_path.as_ref()),
            ImportFormat::Excel => ExcelParser.parse(file_path.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_csv(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_semicolon_legacy_windows_1254() {
        // name column carries windows-1254 accented letters
        let mut content: Vec<u8> = Vec::new();
        content.extend_from_slice(b"HESAP KODU;ADI SOYADI;BRUT PRIM\n");
        content.extend_from_slice(b"C-1;G\xDCL \xDE\xC7\n"); // GÜL ŞÇ
        content.extend_from_slice(b"C-2;MEHMET;1.250,50\n");

        let file = write_csv(&content);
        let parsed = CsvParser::new(CsvFormat::SemicolonLegacy)
            .parse(file.path())
            .unwrap();

        assert_eq!(parsed.headers, vec!["HESAP KODU", "ADI SOYADI", "BRUT PRIM"]);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].cells[1], "GÜL ŞÇ");
        assert_eq!(parsed.rows[1].cells[2], "1.250,50");
    }

    #[test]
    fn test_comma_quoted_variant() {
        let file = write_csv(
            b"HESAP KODU,ADI SOYADI,ADRES\nC-1,\"YILMAZ, AYSE\",\"Istiklal Cad. No:5, Beyoglu\"\n",
        );
        let parsed = CsvParser::new(CsvFormat::CommaQuoted)
            .parse(file.path())
            .unwrap();

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].cells[1], "YILMAZ, AYSE");
        assert_eq!(parsed.rows[0].cells[2], "Istiklal Cad. No:5, Beyoglu");
    }

    #[test]
    fn test_blank_rows_skipped_row_numbers_kept() {
        let file = write_csv(b"HESAP KODU;ADI SOYADI\nC-1;A\n;\nC-2;B\n");
        let parsed = CsvParser::new(CsvFormat::SemicolonLegacy)
            .parse(file.path())
            .unwrap();

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].row_number, 1);
        assert_eq!(parsed.rows[1].row_number, 3); // blank row 2 skipped, numbering preserved
    }

    #[test]
    fn test_file_not_found() {
        let result = CsvParser::new(CsvFormat::SemicolonLegacy).parse(Path::new("missing.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_wrong_extension_rejected() {
        let mut file = Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"whatever").unwrap();
        let result = CsvParser::new(CsvFormat::SemicolonLegacy).parse(file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}
