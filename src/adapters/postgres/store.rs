//! Registry store queries
//!
//! All SQL issued against the registry lives here: the keyset window
//! query over the joined primary dataset, the partner IN-list retrieval
//! and the lookup-table preloads. Every column is selected as text and
//! parsed leniently on the Rust side, so a non-numeric capital or a
//! malformed date nulls the field instead of failing the row.

use crate::adapters::postgres::RegistryClient;
use crate::adapters::traits::{LookupSource, PartnerSource, WindowSource};
use crate::core::filter::CompiledFilter;
use crate::core::lookup::LookupKind;
use crate::domain::{CompositeKey, EntityKey, EstablishmentRow, PartnerRecord, StoreError};
use async_trait::async_trait;
use tokio_postgres::Row;

/// Columns of the joined window query, in select order
const WINDOW_COLUMNS: &str = "\
    est.cnpj_part1::text, est.cnpj_part2::text, est.cnpj_part3::text, \
    est.identificador_matriz_filial::text, e.razao_social::text, est.nome_fantasia::text, \
    est.situacao_cadastral::text, est.data_situacao_cadastral::text, \
    est.motivo_situacao_cadastral::text, est.cidade_estrangeira::text, \
    est.codigo_pais::text, est.data_inicio_atividade::text, est.cnae::text, \
    est.cnaes_secundarios::text, est.tipo_logradouro::text, est.logradouro::text, \
    est.numero::text, est.complemento::text, est.bairro::text, est.cep::text, \
    est.uf::text, est.codigo_municipio::text, est.ddd1::text, est.telefone1::text, \
    est.ddd2::text, est.telefone2::text, est.ddd_fax::text, est.fax::text, \
    est.correio_eletronico::text, e.natureza_juridica::text, e.qualificacao_socio::text, \
    e.capital_social::text, e.porte_empresa::text, est.situacao_especial::text, \
    est.data_situacao_especial::text, s.opcao_simples::text, s.data_opcao_simples::text, \
    s.data_exclusao_simples::text, s.opcao_mei::text, s.data_opcao_mei::text, \
    s.data_exclusao_opcao_mei::text";

/// Read-only access to the registry tables
///
/// Owns the pooled client; safe to share across intra-window concurrency
/// since it holds no mutable state.
pub struct RegistryStore {
    client: RegistryClient,
}

impl RegistryStore {
    pub fn new(client: RegistryClient) -> Self {
        Self { client }
    }

    /// Test connectivity before the run starts
    pub async fn test_connection(&self) -> Result<(), StoreError> {
        self.client.test_connection().await
    }

    /// Redacted connection string for logging
    pub fn connection_string_safe(&self) -> String {
        self.client.connection_string_safe()
    }
}

/// Keyset retrieval: cost stays roughly constant regardless of how deep
/// into the dataset the cursor already is, which is why this is a
/// row-tuple comparison and not an OFFSET.
#[async_trait]
impl WindowSource for RegistryStore {
    async fn fetch_window(
        &self,
        filter: &CompiledFilter,
        cursor: Option<&CompositeKey>,
        limit: usize,
    ) -> Result<Vec<EstablishmentRow>, StoreError> {
        let mut sql = format!(
            "SELECT {WINDOW_COLUMNS} \
             FROM cnpj_estabelecimentos est \
             INNER JOIN cnpj_empresas e ON est.cnpj_part1 = e.cnpj_part1 \
             LEFT JOIN cnpj_simples s ON est.cnpj_part1 = s.cnpj_part1 \
             WHERE est.cnpj_part1 IS NOT NULL"
        );

        if cursor.is_some() {
            sql.push_str(
                " AND (est.cnpj_part1, est.cnpj_part2, est.cnpj_part3) > ($1, $2, $3)",
            );
        }
        sql.push_str(&filter.sql_fragment());
        sql.push_str(" ORDER BY est.cnpj_part1, est.cnpj_part2, est.cnpj_part3");
        sql.push_str(&format!(" LIMIT {limit}"));

        let rows = match cursor {
            Some(key) => {
                let params: [&(dyn tokio_postgres::types::ToSql + Sync); 3] =
                    [&key.entity().as_str(), &key.branch(), &key.order()];
                self.client.query(&sql, &params).await?
            }
            None => self.client.query(&sql, &[]).await?,
        };

        rows.iter().map(decode_establishment).collect()
    }
}

/// One IN-list statement per call; the resolver is responsible for
/// chunking the key set to bound statement size.
#[async_trait]
impl PartnerSource for RegistryStore {
    async fn fetch_partners(
        &self,
        keys: &[EntityKey],
    ) -> Result<Vec<PartnerRecord>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let key_list: Vec<&str> = keys.iter().map(EntityKey::as_str).collect();
        let sql = "SELECT soc.cnpj_part1::text, soc.nome_socio::text, \
                   soc.codigo_qualificacao_socio::text, soc.data_entrada_sociedade::text, \
                   soc.nome_representante_legal::text \
                   FROM cnpj_socios soc \
                   WHERE soc.cnpj_part1 = ANY($1) \
                   ORDER BY soc.cnpj_part1, soc.data_entrada_sociedade";

        let rows = self.client.query(sql, &[&key_list]).await?;
        rows.iter().map(decode_partner).collect()
    }
}

/// Loads a full lookup table as (code, description) pairs
#[async_trait]
impl LookupSource for RegistryStore {
    async fn load_lookup(
        &self,
        kind: LookupKind,
    ) -> Result<Vec<(String, String)>, StoreError> {
        let sql = match kind {
            LookupKind::Activity => "SELECT cnae::text, descricao FROM cnpj_cnaes",
            LookupKind::Municipality => "SELECT codigo::text, municipio FROM cnpj_municipios",
            LookupKind::Country => "SELECT codigo::text, pais FROM cnpj_paises",
            LookupKind::LegalNature => {
                "SELECT codigo::text, natureza_juridica FROM cnpj_naturezas"
            }
            LookupKind::Qualification => {
                "SELECT codigo::text, qualificacao FROM cnpj_qualificacao_socios"
            }
            LookupKind::StatusReason => "SELECT codigo::text, motivo FROM cnpj_motivos",
        };

        let rows = self.client.query(sql, &[]).await?;
        Ok(rows
            .iter()
            .map(|row| {
                let code: Option<String> = row.get(0);
                let description: Option<String> = row.get(1);
                (code.unwrap_or_default(), description.unwrap_or_default())
            })
            .collect())
    }
}

fn decode_establishment(row: &Row) -> Result<EstablishmentRow, StoreError> {
    let part1: Option<String> = row.get(0);
    let part2: Option<String> = row.get(1);
    let part3: Option<String> = row.get(2);
    let key = CompositeKey::new(
        part1.unwrap_or_default(),
        part2.unwrap_or_default(),
        part3.unwrap_or_default(),
    )
    .map_err(StoreError::Decode)?;

    Ok(EstablishmentRow {
        key,
        head_office_indicator: parse_i32(row.get(3)),
        legal_name: row.get(4),
        trade_name: row.get(5),
        registration_status: parse_i32(row.get(6)),
        registration_status_date: row.get(7),
        status_reason_code: parse_i32(row.get(8)),
        foreign_city: row.get(9),
        country_code: parse_i32(row.get(10)),
        activity_start_date: row.get(11),
        activity_code: row.get(12),
        secondary_activity_codes: row.get(13),
        street_type: row.get(14),
        street: row.get(15),
        number: row.get(16),
        complement: row.get(17),
        district: row.get(18),
        postal_code: row.get(19),
        region: row.get(20),
        municipality_code: parse_i32(row.get(21)),
        phone1_area: row.get(22),
        phone1: row.get(23),
        phone2_area: row.get(24),
        phone2: row.get(25),
        fax_area: row.get(26),
        fax: row.get(27),
        email: row.get(28),
        legal_nature_code: parse_i32(row.get(29)),
        responsible_qualification: parse_i32(row.get(30)),
        capital: parse_capital(row.get(31)),
        company_size: parse_i32(row.get(32)),
        special_status: row.get(33),
        special_status_date: row.get(34),
        simples_opt: row.get(35),
        simples_opt_date: row.get(36),
        simples_exclusion_date: row.get(37),
        mei_opt: row.get(38),
        mei_opt_date: row.get(39),
        mei_exclusion_date: row.get(40),
    })
}

fn decode_partner(row: &Row) -> Result<PartnerRecord, StoreError> {
    let entity: Option<String> = row.get(0);
    let entity = EntityKey::new(entity.unwrap_or_default()).map_err(StoreError::Decode)?;
    Ok(PartnerRecord {
        entity,
        name: row.get(1),
        qualification_code: parse_i32(row.get(2)),
        entry_date: row.get(3),
        legal_representative: row.get(4),
    })
}

/// Lenient integer parse: anomalies become None, the row survives
fn parse_i32(value: Option<String>) -> Option<i32> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Lenient capital parse; the source sometimes uses a comma decimal mark
fn parse_capital(value: Option<String>) -> Option<f64> {
    value.and_then(|v| v.trim().replace(',', ".").parse().ok())
}
