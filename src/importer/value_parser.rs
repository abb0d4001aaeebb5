// ==========================================
// Sigorta CRM - value parsers
// ==========================================
// Pure conversions from raw cells to typed values. Convention: blank or
// unparseable cells resolve to None ("absent"), never to zero or an empty
// string - downstream code must be able to tell absent from blank.
// ==========================================

use crate::domain::DateRepairMode;
use chrono::NaiveDate;

/// Two-digit years >= this pivot map to 19xx, the rest to 20xx.
/// Sliding-window heuristic, not a true epoch rule: a birth date of 1950
/// would come out as 2050. The source feed has used it since the DOS era.
pub const TWO_DIGIT_YEAR_PIVOT: u32 = 51;

/// Per-column sentinel one source variant emits for "no value".
const DECIMAL_ABSENT_SENTINEL: &str = ".00";

/// Outcome of a date parse, carrying the repair flag so the decoder can
/// surface a warning in `Reject` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOutcome {
    Absent,
    Parsed(NaiveDate),
    /// Day/month "00" was coerced to "01" (Coerce mode only).
    Repaired(NaiveDate),
    /// Day/month "00" found while repair is disabled; value stays absent.
    RejectedZeroComponent,
}

impl DateOutcome {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            DateOutcome::Parsed(d) | DateOutcome::Repaired(d) => Some(*d),
            _ => None,
        }
    }
}

/// Normalize a raw cell: trim, empty/whitespace-only becomes None.
pub fn normalize_cell(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Parse a Turkish-locale date cell: `DD-MM-YY` or `DD-MM-YYYY`.
///
/// Two-digit years follow the pivot rule ("15-06-99" -> 1999-06-15,
/// "15-06-24" -> 2024-06-15). Day or month "00" is handled per
/// `repair_mode`. Anything else unparseable resolves to Absent.
pub fn parse_date(raw: &str, repair_mode: DateRepairMode) -> DateOutcome {
    let value = match normalize_cell(raw) {
        Some(v) => v,
        None => return DateOutcome::Absent,
    };

    let parts: Vec<&str> = value.split('-').collect();
    if parts.len() != 3 {
        return DateOutcome::Absent;
    }

    let day_raw: u32 = match parts[0].parse() {
        Ok(v) => v,
        Err(_) => return DateOutcome::Absent,
    };
    let month_raw: u32 = match parts[1].parse() {
        Ok(v) => v,
        Err(_) => return DateOutcome::Absent,
    };

    let year: i32 = match parts[2].len() {
        2 => {
            let yy: u32 = match parts[2].parse() {
                Ok(v) => v,
                Err(_) => return DateOutcome::Absent,
            };
            if yy >= TWO_DIGIT_YEAR_PIVOT {
                1900 + yy as i32
            } else {
                2000 + yy as i32
            }
        }
        4 => match parts[2].parse() {
            Ok(v) => v,
            Err(_) => return DateOutcome::Absent,
        },
        _ => return DateOutcome::Absent,
    };

    let zero_component = day_raw == 0 || month_raw == 0;
    if zero_component && repair_mode == DateRepairMode::Reject {
        return DateOutcome::RejectedZeroComponent;
    }

    let day = if day_raw == 0 { 1 } else { day_raw };
    let month = if month_raw == 0 { 1 } else { month_raw };

    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) if zero_component => DateOutcome::Repaired(date),
        Some(date) => DateOutcome::Parsed(date),
        None => DateOutcome::Absent,
    }
}

/// Parse a Turkish-locale decimal cell: "." is the thousands separator,
/// "," the decimal separator ("12.345,67" -> 12345.67). A literal ".00"
/// is a per-column absent sentinel. Optional leading "-" is honored.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let value = normalize_cell(raw)?;
    if value == DECIMAL_ABSENT_SENTINEL {
        return None;
    }

    let normalized = value.replace('.', "").replace(',', ".");
    normalized.parse::<f64>().ok()
}

/// Plain base-10 integer parse; non-numeric or blank cells are absent.
pub fn parse_integer(raw: &str) -> Option<i64> {
    normalize_cell(raw)?.parse::<i64>().ok()
}

/// Text cells: trimmed, blank resolves to absent.
pub fn parse_text(raw: &str) -> Option<String> {
    normalize_cell(raw).map(|v| v.to_string())
}
