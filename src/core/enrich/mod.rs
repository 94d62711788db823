//! Batch Enricher
//!
//! Turns one retrieved window of raw rows into output rows that satisfy
//! the export column contract. The steps run in a fixed order: country
//! normalization first (it must precede the country-name lookup), then
//! the lookup joins, the partner summary attach, phone classification
//! and concatenation, and email validation. The contract itself lives in
//! [`OutputRow`]: every code column is immediately followed by its
//! resolved description column, and serialization order is field order.

use crate::core::lookup::{LookupCache, LookupKind, NormalizedCountryCode};
use crate::domain::{EntityKey, EstablishmentRow};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

/// One record of the export, fields in contract order
///
/// Everything is rendered as text; absent source values become empty
/// strings so the CSV shape is stable regardless of data quality.
#[derive(Debug, Clone, Serialize)]
pub struct OutputRow {
    pub id: u64,
    pub cnpj: String,
    pub identificador_m_f: String,
    pub razao_social: String,
    pub nome_fantasia: String,
    pub situacao_cadastral: String,
    pub data_situacao_cadastral: String,
    pub motivo_situacao_cadastral: String,
    pub descricao_motivo_situacao_cadastral: String,
    pub nome_cidade_exterior: String,
    pub codigo_pais: String,
    pub pais: String,
    pub codigo_natureza_juridica: String,
    pub natureza_juridica: String,
    pub data_inicio_atividade: String,
    pub cnae_codes: String,
    pub cnae_fiscal: String,
    pub cnaes_secundarios: String,
    pub descricao_tipo_logradouro: String,
    pub logradouro: String,
    pub numero: String,
    pub complemento: String,
    pub bairro: String,
    pub cep: String,
    pub uf: String,
    pub codigo_municipio: String,
    pub municipio: String,
    pub ddd_telefone_1: String,
    pub telefone1_celular: i32,
    pub ddd_telefone_2: String,
    pub telefone2_celular: i32,
    pub ddd_fax: String,
    pub correio_eletronico: String,
    pub email: i32,
    pub qualificacao_responsavel: String,
    pub descricao_qualificacao_responsavel: String,
    pub capital_social_empresa: String,
    pub porte_empresa: String,
    pub opcao_simples: String,
    pub data_opcao_simples: String,
    pub data_exclusao_simples: String,
    pub opcao_mei: String,
    pub data_opcao_mei: String,
    pub data_exclusao_opcao_mei: String,
    pub situacao_especial: String,
    pub data_situacao_especial: String,
    pub socios: String,
}

/// Window-level enrichment against the preloaded lookup maps
pub struct Enricher {
    email_regex: Regex,
}

impl Enricher {
    pub fn new() -> Self {
        Self {
            email_regex: Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
                .unwrap(),
        }
    }

    /// Enrich one window into output rows, assigning sequential ids
    ///
    /// `next_id` is the id of the first row produced; ids are sequential
    /// across the whole run, so the caller carries the counter between
    /// windows. `partners` must contain every entity key present in
    /// `rows` (the resolver guarantees this).
    pub fn enrich_window(
        &self,
        rows: &[EstablishmentRow],
        lookups: &LookupCache,
        partners: &HashMap<EntityKey, String>,
        next_id: u64,
    ) -> Vec<OutputRow> {
        rows.iter()
            .enumerate()
            .map(|(offset, row)| self.enrich_row(row, lookups, partners, next_id + offset as u64))
            .collect()
    }

    fn enrich_row(
        &self,
        row: &EstablishmentRow,
        lookups: &LookupCache,
        partners: &HashMap<EntityKey, String>,
        id: u64,
    ) -> OutputRow {
        // Normalization must precede the name lookup, otherwise the
        // legacy placeholder resolves to an empty country name.
        let country = NormalizedCountryCode::from_raw(row.country_code);
        let country_code = country.map(|c| c.as_i32().to_string()).unwrap_or_default();
        let country_name = country
            .map(|c| lookups.country_name(c).to_string())
            .unwrap_or_default();

        let phone1 = concat_phone(&row.phone1_area, &row.phone1);
        let phone2 = concat_phone(&row.phone2_area, &row.phone2);
        let fax = concat_phone(&row.fax_area, &row.fax);
        let email_raw = row.email.clone().unwrap_or_default();

        OutputRow {
            id,
            cnpj: row.key.full_cnpj(),
            identificador_m_f: opt_i32(row.head_office_indicator),
            razao_social: opt_str(&row.legal_name),
            nome_fantasia: opt_str(&row.trade_name),
            situacao_cadastral: opt_i32(row.registration_status),
            data_situacao_cadastral: opt_str(&row.registration_status_date),
            motivo_situacao_cadastral: opt_i32(row.status_reason_code),
            descricao_motivo_situacao_cadastral: describe_i32(
                lookups,
                LookupKind::StatusReason,
                row.status_reason_code,
            ),
            nome_cidade_exterior: opt_str(&row.foreign_city),
            codigo_pais: country_code,
            pais: country_name,
            codigo_natureza_juridica: opt_i32(row.legal_nature_code),
            natureza_juridica: describe_i32(
                lookups,
                LookupKind::LegalNature,
                row.legal_nature_code,
            ),
            data_inicio_atividade: opt_str(&row.activity_start_date),
            cnae_codes: opt_str(&row.activity_code),
            cnae_fiscal: row
                .activity_code
                .as_deref()
                .map(|code| lookups.describe(LookupKind::Activity, code).to_string())
                .unwrap_or_default(),
            cnaes_secundarios: opt_str(&row.secondary_activity_codes),
            descricao_tipo_logradouro: opt_str(&row.street_type),
            logradouro: opt_str(&row.street),
            numero: opt_str(&row.number),
            complemento: opt_str(&row.complement),
            bairro: opt_str(&row.district),
            cep: opt_str(&row.postal_code),
            uf: opt_str(&row.region),
            codigo_municipio: opt_i32(row.municipality_code),
            municipio: describe_i32(lookups, LookupKind::Municipality, row.municipality_code),
            telefone1_celular: classify_phone(&phone1),
            ddd_telefone_1: phone1,
            telefone2_celular: classify_phone(&phone2),
            ddd_telefone_2: phone2,
            ddd_fax: fax,
            email: self.validate_email(&email_raw),
            correio_eletronico: email_raw,
            qualificacao_responsavel: opt_i32(row.responsible_qualification),
            descricao_qualificacao_responsavel: describe_i32(
                lookups,
                LookupKind::Qualification,
                row.responsible_qualification,
            ),
            capital_social_empresa: row
                .capital
                .map(|c| format!("{c:.2}"))
                .unwrap_or_default(),
            porte_empresa: opt_i32(row.company_size),
            opcao_simples: opt_str(&row.simples_opt),
            data_opcao_simples: opt_str(&row.simples_opt_date),
            data_exclusao_simples: opt_str(&row.simples_exclusion_date),
            opcao_mei: opt_str(&row.mei_opt),
            data_opcao_mei: opt_str(&row.mei_opt_date),
            data_exclusao_opcao_mei: opt_str(&row.mei_exclusion_date),
            situacao_especial: opt_str(&row.special_status),
            data_situacao_especial: opt_str(&row.special_status_date),
            socios: partners
                .get(row.key.entity())
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Structural email validation to a 0/1 flag
    pub fn validate_email(&self, email: &str) -> i32 {
        if !email.is_empty() && self.email_regex.is_match(email) {
            1
        } else {
            0
        }
    }
}

impl Default for Enricher {
    fn default() -> Self {
        Self::new()
    }
}

/// Mobile detection on a concatenated area+local number
///
/// Brazilian numbering: two-digit area code, then a local number whose
/// first digit is 6, 7, 8 or 9 for mobile lines. Valid concatenations
/// are 10 or 11 digits; anything else classifies as fixed.
pub fn classify_phone(number: &str) -> i32 {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    if !(10..=11).contains(&digits.len()) {
        return 0;
    }
    match digits.as_bytes()[2] {
        b'6' | b'7' | b'8' | b'9' => 1,
        _ => 0,
    }
}

fn concat_phone(area: &Option<String>, number: &Option<String>) -> String {
    match (area.as_deref(), number.as_deref()) {
        (Some(a), Some(n)) if !a.is_empty() && !n.is_empty() => format!("{a}{n}"),
        _ => String::new(),
    }
}

fn opt_str(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn opt_i32(value: Option<i32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn describe_i32(lookups: &LookupCache, kind: LookupKind, code: Option<i32>) -> String {
    code.map(|c| lookups.describe(kind, &c.to_string()).to_string())
        .unwrap_or_default()
}
