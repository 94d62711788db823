//! Filter Compiler
//!
//! Translates a structured filter document into the SQL predicate used by
//! the paginated window query. Every dimension is optional and the
//! compiled clauses are conjunctive. Values are validated at this
//! boundary — an out-of-domain value is a hard error naming the field,
//! never a silent no-op — and only validated values are rendered into the
//! predicate, so no raw user input ever reaches the SQL text.
//!
//! Registration-status value sets are fixed domain constants of the
//! registry: active = 2, inapt = 4, inactive ∈ {1, 3, 8}.

use crate::domain::{CnpjError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Registration-status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatusFilter {
    /// situacao_cadastral = 2
    Active,
    /// situacao_cadastral = 4
    Inapt,
    /// situacao_cadastral IN (1, 3, 8)
    Inactive,
}

/// Phone-kind filter, classified by the mobile rule (see the enricher)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneKindFilter {
    Fixed,
    Mobile,
    /// Any phone, fixed or mobile
    Either,
}

/// Tax-regime filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxRegimeFilter {
    MeiOnly,
    ExcludeMei,
    Any,
}

/// Minimum-capital bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapitalBand {
    #[serde(rename = "above_10k")]
    Above10k,
    #[serde(rename = "above_50k")]
    Above50k,
    #[serde(rename = "above_100k")]
    Above100k,
    Any,
}

impl CapitalBand {
    fn threshold(self) -> Option<i64> {
        match self {
            CapitalBand::Above10k => Some(10_000),
            CapitalBand::Above50k => Some(50_000),
            CapitalBand::Above100k => Some(100_000),
            CapitalBand::Any => None,
        }
    }
}

/// Inclusive activity-start date range, YYYYMMDD endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

/// Structured filter specification
///
/// Accepted as a JSON document (`--filter filters.json`) or built
/// programmatically. An empty spec compiles to no filtering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSpec {
    /// Two-letter region (UF) code, exact match
    #[serde(default)]
    pub uf: Option<String>,

    /// Municipality code, exact match
    #[serde(default)]
    pub municipality_code: Option<String>,

    /// Membership in an explicit set of activity codes
    #[serde(default)]
    pub activity_codes: Option<Vec<String>>,

    #[serde(default)]
    pub registration_status: Option<RegistrationStatusFilter>,

    #[serde(default)]
    pub activity_start: Option<DateRange>,

    /// true = only rows with a non-empty email, false = only without
    #[serde(default)]
    pub with_email: Option<bool>,

    /// true = only rows with at least one non-empty phone
    #[serde(default)]
    pub with_phone: Option<bool>,

    #[serde(default)]
    pub phone_kind: Option<PhoneKindFilter>,

    #[serde(default)]
    pub tax_regime: Option<TaxRegimeFilter>,

    #[serde(default)]
    pub capital_band: Option<CapitalBand>,
}

impl FilterSpec {
    /// Parses a filter document from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CnpjError::FilterValidation {
            field: "document".to_string(),
            message: e.to_string(),
        })
    }

    /// Whether no dimension is set
    pub fn is_empty(&self) -> bool {
        self.uf.is_none()
            && self.municipality_code.is_none()
            && self.activity_codes.is_none()
            && self.registration_status.is_none()
            && self.activity_start.is_none()
            && self.with_email.is_none()
            && self.with_phone.is_none()
            && self.phone_kind.is_none()
            && self.tax_regime.is_none()
            && self.capital_band.is_none()
    }

    /// Compiles the filter document into the window-query predicate
    ///
    /// # Errors
    ///
    /// Returns [`CnpjError::FilterValidation`] naming the offending field
    /// when a value is outside its domain.
    pub fn compile(&self) -> Result<CompiledFilter> {
        let mut clauses = Vec::new();

        if let Some(uf) = &self.uf {
            if uf.len() != 2 || !uf.bytes().all(|b| b.is_ascii_uppercase()) {
                return Err(invalid("uf", format!("expected a two-letter uppercase code, got '{uf}'")));
            }
            clauses.push(format!("est.uf = '{uf}'"));
        }

        if let Some(code) = &self.municipality_code {
            if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid(
                    "municipality_code",
                    format!("expected a numeric code, got '{code}'"),
                ));
            }
            clauses.push(format!("est.codigo_municipio = {code}"));
        }

        if let Some(codes) = &self.activity_codes {
            if codes.is_empty() {
                return Err(invalid("activity_codes", "set must not be empty".to_string()));
            }
            for code in codes {
                if code.is_empty() || code.len() > 7 || !code.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid(
                        "activity_codes",
                        format!("expected a numeric CNAE code of up to 7 digits, got '{code}'"),
                    ));
                }
            }
            let list = codes
                .iter()
                .map(|c| format!("'{c}'"))
                .collect::<Vec<_>>()
                .join(", ");
            clauses.push(format!("est.cnae IN ({list})"));
        }

        if let Some(status) = self.registration_status {
            let clause = match status {
                RegistrationStatusFilter::Active => "est.situacao_cadastral = 2",
                RegistrationStatusFilter::Inapt => "est.situacao_cadastral = 4",
                RegistrationStatusFilter::Inactive => "est.situacao_cadastral IN (1, 3, 8)",
            };
            clauses.push(clause.to_string());
        }

        if let Some(range) = &self.activity_start {
            let from = range
                .from
                .as_deref()
                .map(|d| validated_date("activity_start.from", d))
                .transpose()?;
            let to = range
                .to
                .as_deref()
                .map(|d| validated_date("activity_start.to", d))
                .transpose()?;
            if from.is_none() && to.is_none() {
                return Err(invalid(
                    "activity_start",
                    "range must set at least one endpoint".to_string(),
                ));
            }
            if let (Some(from), Some(to)) = (&from, &to) {
                if from > to {
                    return Err(invalid(
                        "activity_start",
                        format!("'from' ({from}) must not be after 'to' ({to})"),
                    ));
                }
            }
            if let Some(from) = from {
                clauses.push(format!("est.data_inicio_atividade >= '{from}'"));
            }
            if let Some(to) = to {
                clauses.push(format!("est.data_inicio_atividade <= '{to}'"));
            }
        }

        if let Some(with_email) = self.with_email {
            if with_email {
                clauses.push(
                    "est.correio_eletronico IS NOT NULL AND est.correio_eletronico <> ''"
                        .to_string(),
                );
            } else {
                clauses.push(
                    "(est.correio_eletronico IS NULL OR est.correio_eletronico = '')".to_string(),
                );
            }
        }

        if let Some(with_phone) = self.with_phone {
            if with_phone {
                clauses.push(format!("({HAS_PHONE_SQL})"));
            } else {
                clauses.push(format!("NOT ({HAS_PHONE_SQL})"));
            }
        }

        if let Some(kind) = self.phone_kind {
            match kind {
                PhoneKindFilter::Mobile => clauses.push(format!("({MOBILE_PHONE_SQL})")),
                PhoneKindFilter::Fixed => {
                    clauses.push(format!("({HAS_PHONE_SQL}) AND NOT ({MOBILE_PHONE_SQL})"))
                }
                // either = any phone at all; presence is the whole constraint
                PhoneKindFilter::Either => clauses.push(format!("({HAS_PHONE_SQL})")),
            }
        }

        match self.tax_regime {
            Some(TaxRegimeFilter::MeiOnly) => clauses.push("s.opcao_mei = 'S'".to_string()),
            Some(TaxRegimeFilter::ExcludeMei) => {
                clauses.push("s.opcao_mei IS DISTINCT FROM 'S'".to_string())
            }
            Some(TaxRegimeFilter::Any) | None => {}
        }

        if let Some(band) = self.capital_band {
            if let Some(threshold) = band.threshold() {
                clauses.push(format!("e.capital_social > {threshold}"));
            }
        }

        Ok(CompiledFilter { clauses })
    }
}

/// SQL fragment: at least one phone number present
const HAS_PHONE_SQL: &str =
    "(est.telefone1 IS NOT NULL AND est.telefone1 <> '') OR (est.telefone2 IS NOT NULL AND est.telefone2 <> '')";

/// SQL fragment: the first phone classifies as mobile — area code plus
/// local number totals 10 or 11 digits and the first local digit is 6-9
const MOBILE_PHONE_SQL: &str = "char_length(coalesce(est.ddd1, '') || coalesce(est.telefone1, '')) BETWEEN 10 AND 11 AND substr(est.telefone1, 1, 1) IN ('6', '7', '8', '9')";

fn invalid(field: &str, message: String) -> CnpjError {
    CnpjError::FilterValidation {
        field: field.to_string(),
        message,
    }
}

fn validated_date(field: &str, value: &str) -> Result<String> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(field, format!("expected YYYYMMDD, got '{value}'")));
    }
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .map_err(|_| invalid(field, format!("'{value}' is not a calendar date")))?;
    Ok(value.to_string())
}

/// The compiled predicate: validated conjunctive SQL clauses
///
/// Owned by the run; the paginator appends it to every window query.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilter {
    clauses: Vec<String>,
}

impl CompiledFilter {
    /// The clauses as an `AND`-joined fragment, or "" for a full scan
    pub fn sql_fragment(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            let joined = self
                .clauses
                .iter()
                .map(|c| format!("({c})"))
                .collect::<Vec<_>>()
                .join(" AND ");
            format!(" AND {joined}")
        }
    }

    /// Number of compiled dimensions, for logging
    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }
}
