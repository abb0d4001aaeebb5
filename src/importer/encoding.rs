// ==========================================
// Sigorta CRM - encoding normalizer
// ==========================================
// The legacy policy-management export is windows-1254 (Turkish single-byte
// code page). Decoding with the wrong table corrupts every accented letter
// (ş, ğ, ı, İ, ö, ü, ç), so normalization happens before any line or field
// splitting. The newer comma variant arrives as UTF-8.
// ==========================================

use crate::domain::SourceEncoding;
use encoding_rs::WINDOWS_1254;
use tracing::warn;

/// Decode a raw byte buffer into Unicode text.
///
/// Every valid byte maps deterministically to one code point per the code
/// page table. The source is trusted; the handful of unassigned windows-1254
/// bytes decode to U+FFFD and are logged rather than failing the import.
pub fn decode(bytes: &[u8], encoding: SourceEncoding) -> String {
    match encoding {
        SourceEncoding::Windows1254 => {
            let (decoded, _, had_errors) = WINDOWS_1254.decode(bytes);
            if had_errors {
                warn!("windows-1254 input contained unassigned bytes, replaced with U+FFFD");
            }
            decoded.into_owned()
        }
        SourceEncoding::Utf8 => {
            let decoded = String::from_utf8_lossy(bytes);
            if decoded.contains('\u{FFFD}') {
                warn!("UTF-8 input contained invalid sequences, replaced with U+FFFD");
            }
            decoded.into_owned()
        }
    }
}
