//! Domain records read from the registry store
//!
//! These structs mirror the joined primary dataset (establishment +
//! entity + tax regime) and the partner table. All fields except the
//! composite key are optional: the source CSVs the registry is loaded
//! from are riddled with blanks, and a data-shape anomaly nulls the
//! field rather than dropping the row.

use crate::domain::keys::{CompositeKey, EntityKey};

/// One row of the joined primary dataset
///
/// Produced by the window query (establishments inner-joined with their
/// entity, left-joined with the tax-regime table). Country code is kept
/// raw here; normalization happens as the first enrichment step.
#[derive(Debug, Clone)]
pub struct EstablishmentRow {
    /// Composite identity, also the cursor value for this row
    pub key: CompositeKey,
    /// 1 = head office, 2 = branch
    pub head_office_indicator: Option<i32>,
    /// Legal name of the owning entity
    pub legal_name: Option<String>,
    /// Trade name of the establishment
    pub trade_name: Option<String>,
    /// Registration status code (2 active, 4 inapt, 1/3/8 inactive)
    pub registration_status: Option<i32>,
    pub registration_status_date: Option<String>,
    pub status_reason_code: Option<i32>,
    /// City name when the establishment is abroad
    pub foreign_city: Option<String>,
    /// Raw country code; 0 is the legacy domestic placeholder
    pub country_code: Option<i32>,
    /// Activity start date, YYYYMMDD
    pub activity_start_date: Option<String>,
    /// Primary activity (CNAE) code
    pub activity_code: Option<String>,
    /// Comma-delimited secondary activity codes
    pub secondary_activity_codes: Option<String>,
    pub street_type: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub postal_code: Option<String>,
    /// Two-letter region (UF) code
    pub region: Option<String>,
    pub municipality_code: Option<i32>,
    pub phone1_area: Option<String>,
    pub phone1: Option<String>,
    pub phone2_area: Option<String>,
    pub phone2: Option<String>,
    pub fax_area: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    /// Legal-nature code of the owning entity
    pub legal_nature_code: Option<i32>,
    /// Qualification code of the responsible partner
    pub responsible_qualification: Option<i32>,
    /// Declared capital; None when the source value is non-numeric
    pub capital: Option<f64>,
    pub company_size: Option<i32>,
    pub special_status: Option<String>,
    pub special_status_date: Option<String>,
    /// Simplified-regime opt flag ('S'/'N')
    pub simples_opt: Option<String>,
    pub simples_opt_date: Option<String>,
    pub simples_exclusion_date: Option<String>,
    /// Micro-entrepreneur (MEI) opt flag ('S'/'N')
    pub mei_opt: Option<String>,
    pub mei_opt_date: Option<String>,
    pub mei_exclusion_date: Option<String>,
}

impl EstablishmentRow {
    /// A row with every attribute blank; the starting point for tests
    /// and synthetic fixtures
    pub fn blank(key: CompositeKey) -> Self {
        Self {
            key,
            head_office_indicator: None,
            legal_name: None,
            trade_name: None,
            registration_status: None,
            registration_status_date: None,
            status_reason_code: None,
            foreign_city: None,
            country_code: None,
            activity_start_date: None,
            activity_code: None,
            secondary_activity_codes: None,
            street_type: None,
            street: None,
            number: None,
            complement: None,
            district: None,
            postal_code: None,
            region: None,
            municipality_code: None,
            phone1_area: None,
            phone1: None,
            phone2_area: None,
            phone2: None,
            fax_area: None,
            fax: None,
            email: None,
            legal_nature_code: None,
            responsible_qualification: None,
            capital: None,
            company_size: None,
            special_status: None,
            special_status_date: None,
            simples_opt: None,
            simples_opt_date: None,
            simples_exclusion_date: None,
            mei_opt: None,
            mei_opt_date: None,
            mei_exclusion_date: None,
        }
    }
}

/// One partner of an entity, in retrieval order
#[derive(Debug, Clone)]
pub struct PartnerRecord {
    pub entity: EntityKey,
    pub name: Option<String>,
    pub qualification_code: Option<i32>,
    /// Entry date, YYYYMMDD
    pub entry_date: Option<String>,
    pub legal_representative: Option<String>,
}
