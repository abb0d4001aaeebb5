// ==========================================
// Sigorta CRM - field mapper
// ==========================================
// Declarative table mapping external column names (Turkish headers of the
// policy-management export) to internal fields and value types. Built once,
// shared read-only across imports.
//
// Two realizations:
// - HeaderIndex: match by header name, resilient to column reordering.
// - FixedLayout: match by fixed position for the frozen export layout;
//   only valid after the header column count has been asserted, since a
//   removed upstream column silently shifts every later field.
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Date,
    Decimal,
    Integer,
}

pub struct ColumnSpec {
    pub header: &'static str,
    pub aliases: &'static [&'static str],
    pub value_type: ValueType,
}

/// The frozen export layout, in file order. Position in this table is the
/// column index used by `FixedLayout`.
pub const COLUMN_TABLE: &[ColumnSpec] = &[
    ColumnSpec { header: "HESAP KODU", aliases: &[], value_type: ValueType::Text },
    ColumnSpec { header: "TC KIMLIK NO", aliases: &["TC KİMLİK NO", "VERGI NO", "VERGİ NO"], value_type: ValueType::Text },
    ColumnSpec { header: "ADI SOYADI", aliases: &["AD SOYAD", "MUSTERI ADI"], value_type: ValueType::Text },
    ColumnSpec { header: "MUSTERI TIPI", aliases: &["MÜŞTERİ TİPİ"], value_type: ValueType::Text },
    ColumnSpec { header: "DOGUM TARIHI", aliases: &["DOĞUM TARİHİ"], value_type: ValueType::Date },
    ColumnSpec { header: "MESLEK", aliases: &[], value_type: ValueType::Text },
    ColumnSpec { header: "TELEFON", aliases: &[], value_type: ValueType::Text },
    ColumnSpec { header: "CEP TELEFONU", aliases: &["GSM"], value_type: ValueType::Text },
    ColumnSpec { header: "EMAIL", aliases: &["E-POSTA"], value_type: ValueType::Text },
    ColumnSpec { header: "ADRES", aliases: &[], value_type: ValueType::Text },
    ColumnSpec { header: "IL", aliases: &["İL"], value_type: ValueType::Text },
    ColumnSpec { header: "ILCE", aliases: &["İLÇE"], value_type: ValueType::Text },
    ColumnSpec { header: "KVKK ONAY", aliases: &["KVKK"], value_type: ValueType::Text },
    ColumnSpec { header: "POLICE NO", aliases: &["POLİÇE NO"], value_type: ValueType::Text },
    ColumnSpec { header: "TECDIT NO", aliases: &["TECDİT NO"], value_type: ValueType::Integer },
    ColumnSpec { header: "ZEYIL NO", aliases: &["ZEYİL NO"], value_type: ValueType::Integer },
    ColumnSpec { header: "ACENTE KODU", aliases: &[], value_type: ValueType::Text },
    ColumnSpec { header: "SIRKET KODU", aliases: &["ŞİRKET KODU"], value_type: ValueType::Text },
    ColumnSpec { header: "SIRKET ADI", aliases: &["ŞİRKET ADI"], value_type: ValueType::Text },
    ColumnSpec { header: "ANA BRANS", aliases: &["ANA BRANŞ"], value_type: ValueType::Text },
    ColumnSpec { header: "ARA BRANS", aliases: &["ARA BRANŞ"], value_type: ValueType::Text },
    ColumnSpec { header: "URUN KODU", aliases: &["ÜRÜN KODU"], value_type: ValueType::Text },
    ColumnSpec { header: "URUN ADI", aliases: &["ÜRÜN ADI"], value_type: ValueType::Text },
    ColumnSpec { header: "TANZIM TARIHI", aliases: &["TANZİM TARİHİ"], value_type: ValueType::Date },
    ColumnSpec { header: "BASLANGIC TARIHI", aliases: &["BAŞLANGIÇ TARİHİ"], value_type: ValueType::Date },
    ColumnSpec { header: "BITIS TARIHI", aliases: &["BİTİŞ TARİHİ"], value_type: ValueType::Date },
    ColumnSpec { header: "BRUT PRIM", aliases: &["BRÜT PRİM"], value_type: ValueType::Decimal },
    ColumnSpec { header: "NET PRIM", aliases: &["NET PRİM"], value_type: ValueType::Decimal },
    ColumnSpec { header: "KOMISYON", aliases: &["KOMİSYON"], value_type: ValueType::Decimal },
    ColumnSpec { header: "DOVIZ CINSI", aliases: &["DÖVİZ CİNSİ"], value_type: ValueType::Text },
    ColumnSpec { header: "TAKSIT SAYISI", aliases: &["TAKSİT SAYISI"], value_type: ValueType::Integer },
    ColumnSpec { header: "PLAKA", aliases: &[], value_type: ValueType::Text },
    ColumnSpec { header: "MARKA", aliases: &[], value_type: ValueType::Text },
    ColumnSpec { header: "MODEL", aliases: &[], value_type: ValueType::Text },
    ColumnSpec { header: "MODEL YILI", aliases: &[], value_type: ValueType::Integer },
    ColumnSpec { header: "SASI NO", aliases: &["ŞASİ NO"], value_type: ValueType::Text },
    ColumnSpec { header: "MOTOR NO", aliases: &[], value_type: ValueType::Text },
];

fn normalize_header(raw: &str) -> String {
    raw.trim().to_uppercase()
}

// ==========================================
// HeaderIndex - name-based column lookup
// ==========================================
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
    column_count: usize,
    /// Highest column index any mapped field resolves to, used as the
    /// short-row cutoff.
    max_mapped_position: usize,
}

impl HeaderIndex {
    pub fn build(headers: &[String]) -> Self {
        let positions: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, h)| (normalize_header(h), idx))
            .collect();

        let max_mapped_position = COLUMN_TABLE
            .iter()
            .filter_map(|spec| Self::lookup(&positions, spec))
            .max()
            .unwrap_or(0);

        Self {
            positions,
            column_count: headers.len(),
            max_mapped_position,
        }
    }

    fn lookup(positions: &HashMap<String, usize>, spec: &ColumnSpec) -> Option<usize> {
        if let Some(&idx) = positions.get(&normalize_header(spec.header)) {
            return Some(idx);
        }
        for alias in spec.aliases {
            if let Some(&idx) = positions.get(&normalize_header(alias)) {
                return Some(idx);
            }
        }
        None
    }

    pub fn position(&self, header: &'static str) -> Option<usize> {
        let spec = COLUMN_TABLE.iter().find(|s| s.header == header)?;
        Self::lookup(&self.positions, spec)
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn min_columns(&self) -> usize {
        self.max_mapped_position + 1
    }
}

// ==========================================
// FixedLayout - index-based column lookup
// ==========================================
#[derive(Debug, Clone)]
pub struct FixedLayout;

impl FixedLayout {
    /// Assert the header row still matches the frozen layout width before
    /// any index-based decoding. Without this check a removed upstream
    /// column would misalign every later field without any error.
    pub fn validate(headers: &[String]) -> ImportResult<Self> {
        if headers.len() != COLUMN_TABLE.len() {
            return Err(ImportError::HeaderMismatch {
                expected: COLUMN_TABLE.len(),
                actual: headers.len(),
            });
        }
        Ok(Self)
    }

    pub fn position(&self, header: &'static str) -> Option<usize> {
        COLUMN_TABLE.iter().position(|s| s.header == header)
    }

    pub fn min_columns(&self) -> usize {
        COLUMN_TABLE.len()
    }
}

// ==========================================
// ColumnLayout - the two realizations
// ==========================================
#[derive(Debug, Clone)]
pub enum ColumnLayout {
    ByName(HeaderIndex),
    ByIndex(FixedLayout),
}

impl ColumnLayout {
    pub fn by_name(headers: &[String]) -> Self {
        ColumnLayout::ByName(HeaderIndex::build(headers))
    }

    pub fn by_index(headers: &[String]) -> ImportResult<Self> {
        Ok(ColumnLayout::ByIndex(FixedLayout::validate(headers)?))
    }

    pub fn position(&self, header: &'static str) -> Option<usize> {
        match self {
            ColumnLayout::ByName(idx) => idx.position(header),
            ColumnLayout::ByIndex(layout) => layout.position(header),
        }
    }

    /// Minimum cell count a row must have to be decodable without
    /// misalignment risk.
    pub fn min_columns(&self) -> usize {
        match self {
            ColumnLayout::ByName(idx) => idx.min_columns(),
            ColumnLayout::ByIndex(layout) => layout.min_columns(),
        }
    }
}
