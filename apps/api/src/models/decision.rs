//! The `decisoes` table: one row per registered decision.
//!
//! Categorical columns are stored as their Portuguese labels. `DecisionRow` mirrors
//! the raw columns; `DecisionRecord` is the typed form every handler works with.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// A stored or submitted label that does not belong to its enumeration.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("unknown {kind} value '{value}'")]
pub struct LabelError {
    pub kind: &'static str,
    pub value: String,
}

impl LabelError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Closed enumerations
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DecisionType {
    #[serde(rename = "Aceitar Jesus")]
    AcceptFaith,
    #[serde(rename = "Reconciliar com Cristo")]
    Reconcile,
    #[serde(rename = "Batismo")]
    Baptism,
    #[serde(rename = "Quero GDC")]
    JoinSmallGroup,
}

impl DecisionType {
    pub const ALL: [DecisionType; 4] = [
        DecisionType::AcceptFaith,
        DecisionType::Reconcile,
        DecisionType::Baptism,
        DecisionType::JoinSmallGroup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionType::AcceptFaith => "Aceitar Jesus",
            DecisionType::Reconcile => "Reconciliar com Cristo",
            DecisionType::Baptism => "Batismo",
            DecisionType::JoinSmallGroup => "Quero GDC",
        }
    }

    pub fn from_label(label: &str) -> Result<Self, LabelError> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == label.trim())
            .ok_or_else(|| LabelError::new("decisao", label))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MaritalStatus {
    #[serde(rename = "Solteiro")]
    Single,
    #[serde(rename = "Casado")]
    Married,
    #[serde(rename = "União Estável")]
    CivilUnion,
    #[serde(rename = "Divorciado")]
    Divorced,
    #[serde(rename = "Viúvo")]
    Widowed,
    #[serde(rename = "Noivo(a)")]
    Engaged,
    #[serde(rename = "Outro")]
    Other,
}

impl MaritalStatus {
    pub const ALL: [MaritalStatus; 7] = [
        MaritalStatus::Single,
        MaritalStatus::Married,
        MaritalStatus::CivilUnion,
        MaritalStatus::Divorced,
        MaritalStatus::Widowed,
        MaritalStatus::Engaged,
        MaritalStatus::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaritalStatus::Single => "Solteiro",
            MaritalStatus::Married => "Casado",
            MaritalStatus::CivilUnion => "União Estável",
            MaritalStatus::Divorced => "Divorciado",
            MaritalStatus::Widowed => "Viúvo",
            MaritalStatus::Engaged => "Noivo(a)",
            MaritalStatus::Other => "Outro",
        }
    }

    pub fn from_label(label: &str) -> Result<Self, LabelError> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == label.trim())
            .ok_or_else(|| LabelError::new("estado_civil", label))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Celebration {
    #[serde(rename = "Dominical")]
    Sunday,
    #[serde(rename = "Eleve")]
    Eleve,
    #[serde(rename = "Ignição")]
    Ignicao,
    /// Free-text celebration carried in `celebracao_extra`.
    #[serde(rename = "Outros")]
    Other,
}

impl Celebration {
    pub const ALL: [Celebration; 4] = [
        Celebration::Sunday,
        Celebration::Eleve,
        Celebration::Ignicao,
        Celebration::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Celebration::Sunday => "Dominical",
            Celebration::Eleve => "Eleve",
            Celebration::Ignicao => "Ignição",
            Celebration::Other => "Outros",
        }
    }

    pub fn from_label(label: &str) -> Result<Self, LabelError> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == label.trim())
            .ok_or_else(|| LabelError::new("celebracao", label))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DecisionStatus {
    #[serde(rename = "Contato realizado")]
    ContactMade,
    #[default]
    #[serde(rename = "Aguardando contato")]
    AwaitingContact,
    #[serde(rename = "Não retornou o contato")]
    NoResponse,
    #[serde(rename = "Encaminhado para GDC")]
    ReferredToGroup,
    #[serde(rename = "Encaminhado para batismo")]
    ReferredToBaptism,
}

impl DecisionStatus {
    pub const ALL: [DecisionStatus; 5] = [
        DecisionStatus::ContactMade,
        DecisionStatus::AwaitingContact,
        DecisionStatus::NoResponse,
        DecisionStatus::ReferredToGroup,
        DecisionStatus::ReferredToBaptism,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::ContactMade => "Contato realizado",
            DecisionStatus::AwaitingContact => "Aguardando contato",
            DecisionStatus::NoResponse => "Não retornou o contato",
            DecisionStatus::ReferredToGroup => "Encaminhado para GDC",
            DecisionStatus::ReferredToBaptism => "Encaminhado para batismo",
        }
    }

    /// Every label a row with this status may carry, including the ones written
    /// by the first version of the status screen.
    pub fn stored_labels(&self) -> &'static [&'static str] {
        match self {
            DecisionStatus::ContactMade => &["Contato realizado"],
            DecisionStatus::AwaitingContact => &["Aguardando contato", ""],
            DecisionStatus::NoResponse => &["Não retornou o contato"],
            DecisionStatus::ReferredToGroup => &["Encaminhado para GDC", "Em GDC"],
            DecisionStatus::ReferredToBaptism => &["Encaminhado para batismo", "Curso de batismo"],
        }
    }

    pub fn from_label(label: &str) -> Result<Self, LabelError> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == label.trim())
            .ok_or_else(|| LabelError::new("status", label))
    }

    /// Reads a stored status column. NULL and blank mean "awaiting contact".
    pub fn from_stored(label: Option<&str>) -> Result<Self, LabelError> {
        let label = label.map(str::trim).unwrap_or_default();
        Self::ALL
            .into_iter()
            .find(|s| s.stored_labels().contains(&label))
            .ok_or_else(|| LabelError::new("status", label))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rows and records
// ────────────────────────────────────────────────────────────────────────────

/// Raw row as returned by `SELECT * FROM decisoes`.
#[derive(Debug, Clone, FromRow)]
pub struct DecisionRow {
    pub id: i64,
    pub nome: String,
    pub decisao: String,
    pub data_decisao: NaiveDate,
    pub estado_civil: Option<String>,
    pub nascimento: Option<NaiveDate>,
    pub email: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub bairro: Option<String>,
    pub celular: Option<String>,
    pub celebracao: Option<String>,
    pub celebracao_extra: Option<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: Option<String>,
    pub deseja_gdc: bool,
    pub observacao: Option<String>,
    pub cadastrado_por: Option<Uuid>,
    pub gdc_encaminhado: Option<String>,
    pub nome_cadastrante: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionRecord {
    pub id: i64,
    pub nome: String,
    pub decisao: DecisionType,
    pub data_decisao: NaiveDate,
    pub estado_civil: Option<MaritalStatus>,
    pub nascimento: Option<NaiveDate>,
    pub email: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub bairro: Option<String>,
    pub celular: Option<String>,
    pub celebracao: Option<Celebration>,
    pub celebracao_extra: Option<String>,
    pub status: DecisionStatus,
    pub deseja_gdc: bool,
    pub observacao: Option<String>,
    pub gdc_encaminhado: Option<String>,
    pub user_id: Uuid,
    pub cadastrado_por: Option<Uuid>,
    pub nome_cadastrante: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DecisionRow> for DecisionRecord {
    type Error = LabelError;

    fn try_from(row: DecisionRow) -> Result<Self, Self::Error> {
        Ok(DecisionRecord {
            id: row.id,
            nome: row.nome,
            decisao: DecisionType::from_label(&row.decisao)?,
            data_decisao: row.data_decisao,
            estado_civil: non_blank(row.estado_civil)
                .map(|v| MaritalStatus::from_label(&v))
                .transpose()?,
            nascimento: row.nascimento,
            email: row.email,
            cidade: row.cidade,
            estado: row.estado,
            bairro: row.bairro,
            celular: row.celular,
            celebracao: non_blank(row.celebracao)
                .map(|v| Celebration::from_label(&v))
                .transpose()?,
            celebracao_extra: row.celebracao_extra,
            status: DecisionStatus::from_stored(row.status.as_deref())?,
            deseja_gdc: row.deseja_gdc,
            observacao: row.observacao,
            gdc_encaminhado: row.gdc_encaminhado,
            user_id: row.user_id,
            cadastrado_por: row.cadastrado_por,
            nome_cadastrante: row.nome_cadastrante,
            created_at: row.created_at,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A record about to be inserted. `id` and `created_at` are assigned by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDecision {
    pub nome: String,
    pub decisao: DecisionType,
    pub data_decisao: NaiveDate,
    pub estado_civil: Option<MaritalStatus>,
    pub nascimento: Option<NaiveDate>,
    pub email: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub bairro: Option<String>,
    pub celular: Option<String>,
    pub celebracao: Option<Celebration>,
    pub celebracao_extra: Option<String>,
    pub status: DecisionStatus,
    pub deseja_gdc: bool,
    pub observacao: Option<String>,
    pub gdc_encaminhado: Option<String>,
    pub user_id: Uuid,
    pub cadastrado_por: Option<Uuid>,
    pub nome_cadastrante: String,
}

impl NewDecision {
    pub fn into_record(self, id: i64, created_at: DateTime<Utc>) -> DecisionRecord {
        DecisionRecord {
            id,
            nome: self.nome,
            decisao: self.decisao,
            data_decisao: self.data_decisao,
            estado_civil: self.estado_civil,
            nascimento: self.nascimento,
            email: self.email,
            cidade: self.cidade,
            estado: self.estado,
            bairro: self.bairro,
            celular: self.celular,
            celebracao: self.celebracao,
            celebracao_extra: self.celebracao_extra,
            status: self.status,
            deseja_gdc: self.deseja_gdc,
            observacao: self.observacao,
            gdc_encaminhado: self.gdc_encaminhado,
            user_id: self.user_id,
            cadastrado_por: self.cadastrado_por,
            nome_cadastrante: self.nome_cadastrante,
            created_at,
        }
    }
}

impl DecisionRecord {
    /// `celebracao_extra` only exists for `Outros`; `gdc_encaminhado` only when
    /// the person wants a group.
    pub fn clear_hidden_fields(&mut self) {
        if self.celebracao != Some(Celebration::Other) {
            self.celebracao_extra = None;
        }
        if !self.deseja_gdc {
            self.gdc_encaminhado = None;
        }
    }
}

/// Partial update by primary key. `None` leaves the column untouched; for nullable
/// columns `Some(None)` writes NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionPatch {
    pub nome: Option<String>,
    pub decisao: Option<DecisionType>,
    pub data_decisao: Option<NaiveDate>,
    pub estado_civil: Option<Option<MaritalStatus>>,
    pub nascimento: Option<Option<NaiveDate>>,
    pub email: Option<Option<String>>,
    pub cidade: Option<Option<String>>,
    pub estado: Option<Option<String>>,
    pub bairro: Option<Option<String>>,
    pub celular: Option<Option<String>>,
    pub celebracao: Option<Option<Celebration>>,
    pub celebracao_extra: Option<Option<String>>,
    pub status: Option<DecisionStatus>,
    pub deseja_gdc: Option<bool>,
    pub observacao: Option<Option<String>>,
    pub gdc_encaminhado: Option<Option<String>>,
    pub nome_cadastrante: Option<String>,
}

impl DecisionPatch {
    pub fn is_empty(&self) -> bool {
        *self == DecisionPatch::default()
    }

    /// Clears dependent columns whose controlling column is changed in this patch.
    pub fn normalize(mut self) -> Self {
        if let Some(celebracao) = self.celebracao {
            if celebracao != Some(Celebration::Other) {
                self.celebracao_extra = Some(None);
            }
        }
        if self.deseja_gdc == Some(false) {
            self.gdc_encaminhado = Some(None);
        }
        self
    }

    pub fn apply_to(&self, record: &mut DecisionRecord) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }

        set(&mut record.nome, &self.nome);
        set(&mut record.decisao, &self.decisao);
        set(&mut record.data_decisao, &self.data_decisao);
        set(&mut record.estado_civil, &self.estado_civil);
        set(&mut record.nascimento, &self.nascimento);
        set(&mut record.email, &self.email);
        set(&mut record.cidade, &self.cidade);
        set(&mut record.estado, &self.estado);
        set(&mut record.bairro, &self.bairro);
        set(&mut record.celular, &self.celular);
        set(&mut record.celebracao, &self.celebracao);
        set(&mut record.celebracao_extra, &self.celebracao_extra);
        set(&mut record.status, &self.status);
        set(&mut record.deseja_gdc, &self.deseja_gdc);
        set(&mut record.observacao, &self.observacao);
        set(&mut record.gdc_encaminhado, &self.gdc_encaminhado);
        set(&mut record.nome_cadastrante, &self.nome_cadastrante);
        record.clear_hidden_fields();
    }
}
