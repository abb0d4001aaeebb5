// ==========================================
// Sigorta CRM - row decoder
// ==========================================
// Turns one delimited record into a typed PolicyRecord using the column
// layout and the value parsers. Rows shorter than the layout's minimum
// column count are rejected outright instead of partially decoded, so a
// misaligned source line can never be silently imported.
// ==========================================

use crate::domain::{DateRepairMode, PolicyRecord};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::ColumnLayout;
use crate::importer::value_parser::{
    parse_date, parse_decimal, parse_integer, parse_text, DateOutcome,
};
use chrono::NaiveDate;
use tracing::debug;

/// One raw record as produced by the file parser.
#[derive(Debug, Clone)]
pub struct RawRow {
    /// 1-based data-row number (header row excluded).
    pub row_number: usize,
    pub cells: Vec<String>,
}

/// Decoded row plus any non-fatal warnings (e.g. rejected "00" date
/// components in `Reject` repair mode).
#[derive(Debug, Clone)]
pub struct DecodedRow {
    pub record: PolicyRecord,
    pub warnings: Vec<String>,
}

pub struct RowDecoder {
    layout: ColumnLayout,
    repair_mode: DateRepairMode,
}

impl RowDecoder {
    pub fn new(layout: ColumnLayout, repair_mode: DateRepairMode) -> Self {
        Self {
            layout,
            repair_mode,
        }
    }

    pub fn decode(&self, row: &RawRow) -> ImportResult<DecodedRow> {
        let min_columns = self.layout.min_columns();
        if row.cells.len() < min_columns {
            return Err(ImportError::RowTooShort {
                row: row.row_number,
                expected: min_columns,
                actual: row.cells.len(),
            });
        }

        let mut warnings = Vec::new();

        let record = PolicyRecord {
            account_code: self.text(row, "HESAP KODU"),
            national_id: self.text(row, "TC KIMLIK NO"),
            customer_name: self.text(row, "ADI SOYADI"),
            customer_type: self.text(row, "MUSTERI TIPI"),
            birth_date: self.date(row, "DOGUM TARIHI", &mut warnings),
            occupation: self.text(row, "MESLEK"),

            phone: self.text(row, "TELEFON"),
            mobile_phone: self.text(row, "CEP TELEFONU"),
            email: self.text(row, "EMAIL"),
            address: self.text(row, "ADRES"),
            city: self.text(row, "IL"),
            district: self.text(row, "ILCE"),
            kvkk_consent: self.text(row, "KVKK ONAY"),

            policy_no: self.text(row, "POLICE NO"),
            renewal_no: self.integer(row, "TECDIT NO"),
            endorsement_no: self.integer(row, "ZEYIL NO"),
            agency_code: self.text(row, "ACENTE KODU"),
            company_code: self.text(row, "SIRKET KODU"),
            company_name: self.text(row, "SIRKET ADI"),

            main_branch: self.text(row, "ANA BRANS"),
            sub_branch: self.text(row, "ARA BRANS"),
            product_code: self.text(row, "URUN KODU"),
            product_name: self.text(row, "URUN ADI"),

            issue_date: self.date(row, "TANZIM TARIHI", &mut warnings),
            start_date: self.date(row, "BASLANGIC TARIHI", &mut warnings),
            end_date: self.date(row, "BITIS TARIHI", &mut warnings),

            gross_premium: self.decimal(row, "BRUT PRIM"),
            net_premium: self.decimal(row, "NET PRIM"),
            commission: self.decimal(row, "KOMISYON"),
            currency: self.text(row, "DOVIZ CINSI"),
            installment_count: self.integer(row, "TAKSIT SAYISI"),

            plate_no: self.text(row, "PLAKA"),
            vehicle_brand: self.text(row, "MARKA"),
            vehicle_model: self.text(row, "MODEL"),
            vehicle_model_year: self.integer(row, "MODEL YILI"),
            chassis_no: self.text(row, "SASI NO"),
            engine_no: self.text(row, "MOTOR NO"),

            row_number: row.row_number,
        };

        Ok(DecodedRow { record, warnings })
    }

    fn cell<'a>(&self, row: &'a RawRow, header: &'static str) -> Option<&'a str> {
        let pos = self.layout.position(header)?;
        row.cells.get(pos).map(|s| s.as_str())
    }

    fn text(&self, row: &RawRow, header: &'static str) -> Option<String> {
        self.cell(row, header).and_then(parse_text)
    }

    fn decimal(&self, row: &RawRow, header: &'static str) -> Option<f64> {
        self.cell(row, header).and_then(parse_decimal)
    }

    fn integer(&self, row: &RawRow, header: &'static str) -> Option<i64> {
        self.cell(row, header).and_then(parse_integer)
    }

    fn date(
        &self,
        row: &RawRow,
        header: &'static str,
        warnings: &mut Vec<String>,
    ) -> Option<NaiveDate> {
        let raw = self.cell(row, header)?;
        match parse_date(raw, self.repair_mode) {
            DateOutcome::Parsed(d) => Some(d),
            DateOutcome::Repaired(d) => {
                debug!(
                    row = row.row_number,
                    field = header,
                    value = raw,
                    "coerced zero day/month component to 01"
                );
                Some(d)
            }
            DateOutcome::RejectedZeroComponent => {
                warnings.push(format!(
                    "{}: zero day/month component in '{}', value treated as absent",
                    header,
                    raw.trim()
                ));
                None
            }
            DateOutcome::Absent => None,
        }
    }
}
