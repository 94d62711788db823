//! Integration tests for the enrichment-to-CSV output contract
//!
//! These exercise the enricher and the sink together against the exact
//! column layout consumers of the export depend on.

use cnpj_export::core::enrich::Enricher;
use cnpj_export::core::lookup::{LookupCache, LookupKind};
use cnpj_export::domain::{CompositeKey, EntityKey, EstablishmentRow};
use cnpj_export::output::CsvSink;
use std::collections::HashMap;
use tempfile::tempdir;

fn lookups() -> LookupCache {
    LookupCache::from_entries([
        (
            LookupKind::Country,
            vec![
                ("105".to_string(), "BRASIL".to_string()),
                ("249".to_string(), "ESTADOS UNIDOS".to_string()),
            ],
        ),
        (
            LookupKind::Municipality,
            vec![("7107".to_string(), "SAO PAULO".to_string())],
        ),
        (
            LookupKind::Activity,
            vec![(
                "4781400".to_string(),
                "Comércio varejista de vestuário".to_string(),
            )],
        ),
        (
            LookupKind::LegalNature,
            vec![("2062".to_string(), "Sociedade Empresária Limitada".to_string())],
        ),
        (
            LookupKind::Qualification,
            vec![("49".to_string(), "Sócio-Administrador".to_string())],
        ),
        (
            LookupKind::StatusReason,
            vec![("0".to_string(), "SEM MOTIVO".to_string())],
        ),
    ])
}

fn populated_row() -> EstablishmentRow {
    let mut row = EstablishmentRow::blank(CompositeKey::new("12345678", "0001", "91").unwrap());
    row.head_office_indicator = Some(1);
    row.legal_name = Some("EMPRESA EXEMPLO LTDA".to_string());
    row.trade_name = Some("LOJA EXEMPLO".to_string());
    row.registration_status = Some(2);
    row.status_reason_code = Some(0);
    row.country_code = Some(0);
    row.legal_nature_code = Some(2062);
    row.activity_code = Some("4781400".to_string());
    row.municipality_code = Some(7107);
    row.region = Some("SP".to_string());
    row.phone1_area = Some("11".to_string());
    row.phone1 = Some("999887766".to_string());
    row.phone2_area = Some("11".to_string());
    row.phone2 = Some("33334444".to_string());
    row.email = Some("usuario@empresa.com.br".to_string());
    row.responsible_qualification = Some(49);
    row.capital = Some(150_000.0);
    row
}

fn export_to_string(rows: &[EstablishmentRow], partners: &HashMap<EntityKey, String>) -> String {
    let dir = tempdir().unwrap();
    let path = dir.path().join("export.csv");
    let mut sink = CsvSink::create(&path).unwrap();
    let output = Enricher::new().enrich_window(rows, &lookups(), partners, 1);
    sink.write_window(&output).unwrap();
    sink.flush().unwrap();
    std::fs::read_to_string(&path).unwrap()
}

#[test]
fn test_header_follows_contract_order() {
    let content = export_to_string(&[populated_row()], &HashMap::new());
    let header: Vec<String> = content
        .lines()
        .next()
        .unwrap()
        .split(';')
        .map(|f| f.trim_matches('"').to_string())
        .collect();

    assert_eq!(header.first().map(String::as_str), Some("id"));
    assert_eq!(header.get(1).map(String::as_str), Some("cnpj"));
    assert_eq!(header.last().map(String::as_str), Some("socios"));

    // Every code column is immediately followed by its description
    let pairs = [
        ("motivo_situacao_cadastral", "descricao_motivo_situacao_cadastral"),
        ("codigo_pais", "pais"),
        ("codigo_natureza_juridica", "natureza_juridica"),
        ("cnae_codes", "cnae_fiscal"),
        ("codigo_municipio", "municipio"),
        ("qualificacao_responsavel", "descricao_qualificacao_responsavel"),
    ];
    for (code, description) in pairs {
        let code_idx = header.iter().position(|h| h == code).unwrap();
        let desc_idx = header.iter().position(|h| h == description).unwrap();
        assert_eq!(desc_idx, code_idx + 1, "{description} must follow {code}");
    }
}

#[test]
fn test_record_values_enriched() {
    let entity = EntityKey::new("12345678").unwrap();
    let partners = HashMap::from([(
        entity,
        "Nome: MARIA | Qualificação: Sócio-Administrador | Data Entrada: 20150310".to_string(),
    )]);
    let content = export_to_string(&[populated_row()], &partners);

    let header: Vec<String> = content
        .lines()
        .next()
        .unwrap()
        .split(';')
        .map(|f| f.trim_matches('"').to_string())
        .collect();
    let record: Vec<String> = content
        .lines()
        .nth(1)
        .unwrap()
        .split(';')
        .map(|f| f.trim_matches('"').to_string())
        .collect();
    let field = |name: &str| {
        let idx = header.iter().position(|h| h == name).unwrap();
        record[idx].clone()
    };

    assert_eq!(field("id"), "1");
    assert_eq!(field("cnpj"), "12345678000191");
    // Legacy placeholder 0 must resolve as Brazil, not as an unknown code
    assert_eq!(field("codigo_pais"), "105");
    assert_eq!(field("pais"), "BRASIL");
    assert_eq!(field("codigo_municipio"), "7107");
    assert_eq!(field("municipio"), "SAO PAULO");
    assert_eq!(field("cnae_codes"), "4781400");
    assert_eq!(field("cnae_fiscal"), "Comércio varejista de vestuário");
    assert_eq!(field("natureza_juridica"), "Sociedade Empresária Limitada");
    assert_eq!(
        field("descricao_qualificacao_responsavel"),
        "Sócio-Administrador"
    );
    assert_eq!(field("ddd_telefone_1"), "11999887766");
    assert_eq!(field("telefone1_celular"), "1");
    assert_eq!(field("ddd_telefone_2"), "1133334444");
    assert_eq!(field("telefone2_celular"), "0");
    assert_eq!(field("correio_eletronico"), "usuario@empresa.com.br");
    assert_eq!(field("email"), "1");
    assert_eq!(field("capital_social_empresa"), "150000.00");
    assert!(field("socios").starts_with("Nome: MARIA"));
}

#[test]
fn test_blank_row_keeps_stable_shape() {
    let row = EstablishmentRow::blank(CompositeKey::new("99999999", "0001", "01").unwrap());
    let content = export_to_string(&[row], &HashMap::new());

    let header_fields = content.lines().next().unwrap().split(';').count();
    let record_fields = content.lines().nth(1).unwrap().split(';').count();
    assert_eq!(header_fields, record_fields);
}

#[test]
fn test_ids_continue_across_windows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("export.csv");
    let mut sink = CsvSink::create(&path).unwrap();
    let enricher = Enricher::new();
    let cache = lookups();
    let partners = HashMap::new();

    let first = vec![populated_row()];
    let out = enricher.enrich_window(&first, &cache, &partners, 1);
    let next_id = 1 + out.len() as u64;
    sink.write_window(&out).unwrap();

    let mut second_row =
        EstablishmentRow::blank(CompositeKey::new("12345679", "0001", "01").unwrap());
    second_row.country_code = Some(105);
    let out = enricher.enrich_window(&[second_row], &cache, &partners, next_id);
    sink.write_window(&out).unwrap();
    sink.flush().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let records: Vec<&str> = content.lines().skip(1).collect();
    assert!(records[0].starts_with("\"1\";"));
    assert!(records[1].starts_with("\"2\";"));
    assert_eq!(sink.rows_written(), 2);
}
