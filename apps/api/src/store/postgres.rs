use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::dashboard::filter::FilterCriteria;
use crate::models::decision::{
    Celebration, DecisionPatch, DecisionRecord, DecisionRow, NewDecision,
};
use crate::store::{DateOrder, RecordStore, StoreError};

/// Record store backed by the hosted Postgres table `decisoes`.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_records(rows: Vec<DecisionRow>) -> Result<Vec<DecisionRecord>, StoreError> {
    rows.into_iter()
        .map(|row| DecisionRecord::try_from(row).map_err(StoreError::from))
        .collect()
}

/// Escapes LIKE metacharacters so the user's text is matched literally.
fn like_pattern(text: &str) -> String {
    let escaped = text
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// `UPDATE` for the columns present in `patch`. Dependent columns are written
/// through a `CASE` on the value their controlling column will hold after the
/// update: the bound value when the patch sets it, the stored one otherwise.
fn update_query(id: i64, patch: &DecisionPatch) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE decisoes SET ");
    let mut set = builder.separated(", ");

    if let Some(v) = &patch.nome {
        set.push("nome = ").push_bind_unseparated(v.clone());
    }
    if let Some(v) = patch.decisao {
        set.push("decisao = ").push_bind_unseparated(v.as_str());
    }
    if let Some(v) = patch.data_decisao {
        set.push("data_decisao = ").push_bind_unseparated(v);
    }
    if let Some(v) = patch.estado_civil {
        set.push("estado_civil = ")
            .push_bind_unseparated(v.map(|e| e.as_str()));
    }
    if let Some(v) = patch.nascimento {
        set.push("nascimento = ").push_bind_unseparated(v);
    }
    for (column, value) in [
        ("email", &patch.email),
        ("cidade", &patch.cidade),
        ("estado", &patch.estado),
        ("bairro", &patch.bairro),
        ("celular", &patch.celular),
        ("observacao", &patch.observacao),
    ] {
        if let Some(v) = value {
            set.push(format!("{column} = "))
                .push_bind_unseparated(v.clone());
        }
    }
    if let Some(v) = patch.celebracao {
        set.push("celebracao = ")
            .push_bind_unseparated(v.map(|c| c.as_str()));
    }
    if let Some(v) = &patch.celebracao_extra {
        set.push("celebracao_extra = CASE WHEN ");
        match patch.celebracao {
            Some(c) => set.push_bind_unseparated(c.map(|c| c.as_str())),
            None => set.push_unseparated("celebracao"),
        };
        set.push_unseparated(" = ")
            .push_bind_unseparated(Celebration::Other.as_str())
            .push_unseparated(" THEN ")
            .push_bind_unseparated(v.clone())
            .push_unseparated(" END");
    }
    if let Some(v) = patch.status {
        set.push("status = ").push_bind_unseparated(v.as_str());
    }
    if let Some(v) = patch.deseja_gdc {
        set.push("deseja_gdc = ").push_bind_unseparated(v);
    }
    if let Some(v) = &patch.gdc_encaminhado {
        set.push("gdc_encaminhado = CASE WHEN ");
        match patch.deseja_gdc {
            Some(wants) => set.push_bind_unseparated(wants),
            None => set.push_unseparated("deseja_gdc"),
        };
        set.push_unseparated(" THEN ")
            .push_bind_unseparated(v.clone())
            .push_unseparated(" END");
    }
    if let Some(v) = &patch.nome_cadastrante {
        set.push("nome_cadastrante = ")
            .push_bind_unseparated(v.clone());
    }

    builder.push(" WHERE id = ").push_bind(id);
    builder
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list_all(&self, order: DateOrder) -> Result<Vec<DecisionRecord>, StoreError> {
        let sql = format!("SELECT * FROM decisoes ORDER BY data_decisao {}", order.sql());
        let rows = sqlx::query_as::<_, DecisionRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        debug!("Fetched {} decisions", rows.len());
        into_records(rows)
    }

    async fn search_by_name(&self, pattern: &str) -> Result<Vec<DecisionRecord>, StoreError> {
        let rows = sqlx::query_as::<_, DecisionRow>(
            "SELECT * FROM decisoes WHERE nome ILIKE $1 ORDER BY data_decisao DESC",
        )
        .bind(like_pattern(pattern))
        .fetch_all(&self.pool)
        .await?;
        into_records(rows)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<DecisionRecord>, StoreError> {
        let row = sqlx::query_as::<_, DecisionRow>("SELECT * FROM decisoes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(DecisionRecord::try_from).transpose()?)
    }

    async fn insert(&self, d: NewDecision) -> Result<DecisionRecord, StoreError> {
        let row = sqlx::query_as::<_, DecisionRow>(
            r#"
            INSERT INTO decisoes
                (nome, decisao, data_decisao, estado_civil, nascimento, email, cidade,
                 estado, bairro, celular, celebracao, celebracao_extra, status,
                 deseja_gdc, observacao, gdc_encaminhado, user_id, cadastrado_por,
                 nome_cadastrante)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING *
            "#,
        )
        .bind(&d.nome)
        .bind(d.decisao.as_str())
        .bind(d.data_decisao)
        .bind(d.estado_civil.map(|e| e.as_str()))
        .bind(d.nascimento)
        .bind(&d.email)
        .bind(&d.cidade)
        .bind(&d.estado)
        .bind(&d.bairro)
        .bind(&d.celular)
        .bind(d.celebracao.map(|c| c.as_str()))
        .bind(&d.celebracao_extra)
        .bind(d.status.as_str())
        .bind(d.deseja_gdc)
        .bind(&d.observacao)
        .bind(&d.gdc_encaminhado)
        .bind(d.user_id)
        .bind(d.cadastrado_por)
        .bind(&d.nome_cadastrante)
        .fetch_one(&self.pool)
        .await?;

        info!("Inserted decision {} for user {}", row.id, row.user_id);
        Ok(DecisionRecord::try_from(row)?)
    }

    async fn update_fields(&self, id: i64, patch: &DecisionPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }

        let result = update_query(id, patch).build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        info!("Updated decision {id}");
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM decisoes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        info!("Deleted decision {id}");
        Ok(())
    }

    async fn filtered_query(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<DecisionRecord>, StoreError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM decisoes WHERE data_decisao BETWEEN ");
        builder
            .push_bind(criteria.range.start)
            .push(" AND ")
            .push_bind(criteria.range.end);

        if let Some(decisao) = criteria.decisao {
            builder.push(" AND decisao = ").push_bind(decisao.as_str());
        }
        if let Some(cidade) = criteria.cidade.as_deref().filter(|c| !c.trim().is_empty()) {
            builder.push(" AND cidade ILIKE ").push_bind(like_pattern(cidade));
        }
        if let Some(nome) = criteria.nome.as_deref().filter(|n| !n.trim().is_empty()) {
            builder.push(" AND nome ILIKE ").push_bind(like_pattern(nome));
        }
        if let Some(status) = criteria.status {
            let labels: Vec<String> = status
                .stored_labels()
                .iter()
                .map(|l| l.to_string())
                .collect();
            builder.push(" AND (COALESCE(status, '') = ANY(").push_bind(labels).push("))");
        }
        if let Some(deseja_gdc) = criteria.deseja_gdc {
            builder.push(" AND deseja_gdc = ").push_bind(deseja_gdc);
        }
        builder.push(" ORDER BY data_decisao DESC");

        let rows = builder
            .build_query_as::<DecisionRow>()
            .fetch_all(&self.pool)
            .await?;
        into_records(rows)
    }
}
