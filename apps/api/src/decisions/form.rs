//! The decision form: one set of fields, three modes.
//!
//! Each `FormMode` decides which fields are shown, which may be changed and
//! which must be filled in. Submissions are validated against the mode and then
//! turned into exactly one store write (`NewDecision` or `DecisionPatch`).
//!
//! Two fields are conditional: `celebracao_extra` only matters when the
//! celebration is "Outros", `gdc_encaminhado` only when `deseja_gdc` is set.
//! Values sent for a hidden conditional field are dropped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::decision::{
    Celebration, DecisionPatch, DecisionStatus, DecisionType, LabelError, MaritalStatus,
    NewDecision,
};
use crate::models::user::Identity;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FormError {
    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    #[error("Field '{0}' cannot be changed in this form")]
    ReadOnly(&'static str),

    #[error("Field '{0}' must be a date in YYYY-MM-DD format")]
    InvalidDate(&'static str),

    #[error(transparent)]
    Label(#[from] LabelError),

    #[error("No fields to update")]
    Empty,
}

// ────────────────────────────────────────────────────────────────────────────
// Fields and modes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Nome,
    Decisao,
    DataDecisao,
    EstadoCivil,
    Nascimento,
    Email,
    Celular,
    Cidade,
    Estado,
    Bairro,
    Celebracao,
    CelebracaoExtra,
    Status,
    DesejaGdc,
    GdcEncaminhado,
    Observacao,
    NomeCadastrante,
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::Nome,
        Field::Decisao,
        Field::DataDecisao,
        Field::EstadoCivil,
        Field::Nascimento,
        Field::Email,
        Field::Celular,
        Field::Cidade,
        Field::Estado,
        Field::Bairro,
        Field::Celebracao,
        Field::CelebracaoExtra,
        Field::Status,
        Field::DesejaGdc,
        Field::GdcEncaminhado,
        Field::Observacao,
        Field::NomeCadastrante,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Field::Nome => "nome",
            Field::Decisao => "decisao",
            Field::DataDecisao => "data_decisao",
            Field::EstadoCivil => "estado_civil",
            Field::Nascimento => "nascimento",
            Field::Email => "email",
            Field::Celular => "celular",
            Field::Cidade => "cidade",
            Field::Estado => "estado",
            Field::Bairro => "bairro",
            Field::Celebracao => "celebracao",
            Field::CelebracaoExtra => "celebracao_extra",
            Field::Status => "status",
            Field::DesejaGdc => "deseja_gdc",
            Field::GdcEncaminhado => "gdc_encaminhado",
            Field::Observacao => "observacao",
            Field::NomeCadastrante => "nome_cadastrante",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Nome => "Nome",
            Field::Decisao => "Decisão",
            Field::DataDecisao => "Data da Decisão",
            Field::EstadoCivil => "Estado Civil",
            Field::Nascimento => "Data de Nascimento",
            Field::Email => "E-mail",
            Field::Celular => "Celular / WhatsApp",
            Field::Cidade => "Cidade",
            Field::Estado => "Estado",
            Field::Bairro => "Bairro",
            Field::Celebracao => "Celebração",
            Field::CelebracaoExtra => "Especifique a Celebração",
            Field::Status => "Status",
            Field::DesejaGdc => "Deseja GDC",
            Field::GdcEncaminhado => "Encaminhado para o GDC",
            Field::Observacao => "Observação",
            Field::NomeCadastrante => "Nome do Cadastrante",
        }
    }

    pub fn options(&self) -> Vec<&'static str> {
        match self {
            Field::Decisao => DecisionType::ALL.iter().map(|d| d.as_str()).collect(),
            Field::EstadoCivil => MaritalStatus::ALL.iter().map(|m| m.as_str()).collect(),
            Field::Celebracao => Celebration::ALL.iter().map(|c| c.as_str()).collect(),
            Field::Status => DecisionStatus::ALL.iter().map(|s| s.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            Field::CelebracaoExtra => Visibility::WhenCelebrationOther,
            Field::GdcEncaminhado => Visibility::WhenWantsGroup,
            _ => Visibility::Always,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Always,
    WhenCelebrationOther,
    WhenWantsGroup,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    Create,
    Edit,
    #[serde(rename = "status")]
    StatusUpdate,
}

const REQUIRED_ON_CREATE: &[Field] = &[
    Field::Nome,
    Field::Decisao,
    Field::DataDecisao,
    Field::EstadoCivil,
    Field::Nascimento,
    Field::Celebracao,
    Field::NomeCadastrante,
];

const STATUS_FORM_FIELDS: &[Field] = &[
    Field::Nome,
    Field::Decisao,
    Field::Status,
    Field::DesejaGdc,
    Field::GdcEncaminhado,
    Field::Observacao,
];

const STATUS_FORM_EDITABLE: &[Field] = &[
    Field::Status,
    Field::DesejaGdc,
    Field::GdcEncaminhado,
    Field::Observacao,
];

impl FormMode {
    pub fn shows(&self, field: Field) -> bool {
        match self {
            FormMode::Create | FormMode::Edit => true,
            FormMode::StatusUpdate => STATUS_FORM_FIELDS.contains(&field),
        }
    }

    pub fn is_editable(&self, field: Field) -> bool {
        match self {
            FormMode::Create | FormMode::Edit => true,
            FormMode::StatusUpdate => STATUS_FORM_EDITABLE.contains(&field),
        }
    }

    /// A required field may never be submitted blank. In the non-partial modes
    /// it must also be submitted.
    pub fn is_required(&self, field: Field) -> bool {
        match self {
            FormMode::Create | FormMode::Edit => REQUIRED_ON_CREATE.contains(&field),
            FormMode::StatusUpdate => field == Field::Status,
        }
    }

    fn is_partial(&self) -> bool {
        matches!(self, FormMode::Edit)
    }

    pub fn config(self) -> FormConfig {
        FormConfig {
            mode: self,
            fields: Field::ALL
                .into_iter()
                .filter(|f| self.shows(*f))
                .map(|field| FieldSpec {
                    name: field,
                    label: field.label(),
                    editable: self.is_editable(field),
                    required: self.is_required(field),
                    visible_when: field.visibility(),
                    options: field.options(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: Field,
    pub label: &'static str,
    pub editable: bool,
    pub required: bool,
    pub visible_when: Visibility,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormConfig {
    pub mode: FormMode,
    pub fields: Vec<FieldSpec>,
}

// ────────────────────────────────────────────────────────────────────────────
// Submissions
// ────────────────────────────────────────────────────────────────────────────

/// A submitted form. Absent keys are "not submitted"; blank strings are
/// "submitted empty" and clear nullable columns on edit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionForm {
    pub nome: Option<String>,
    pub decisao: Option<String>,
    pub data_decisao: Option<String>,
    pub estado_civil: Option<String>,
    pub nascimento: Option<String>,
    pub email: Option<String>,
    pub celular: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub bairro: Option<String>,
    pub celebracao: Option<String>,
    pub celebracao_extra: Option<String>,
    pub status: Option<String>,
    pub deseja_gdc: Option<bool>,
    pub gdc_encaminhado: Option<String>,
    pub observacao: Option<String>,
    pub nome_cadastrante: Option<String>,
}

impl DecisionForm {
    fn raw(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Nome => &self.nome,
            Field::Decisao => &self.decisao,
            Field::DataDecisao => &self.data_decisao,
            Field::EstadoCivil => &self.estado_civil,
            Field::Nascimento => &self.nascimento,
            Field::Email => &self.email,
            Field::Celular => &self.celular,
            Field::Cidade => &self.cidade,
            Field::Estado => &self.estado,
            Field::Bairro => &self.bairro,
            Field::Celebracao => &self.celebracao,
            Field::CelebracaoExtra => &self.celebracao_extra,
            Field::Status => &self.status,
            Field::GdcEncaminhado => &self.gdc_encaminhado,
            Field::Observacao => &self.observacao,
            Field::NomeCadastrante => &self.nome_cadastrante,
            Field::DesejaGdc => return None,
        };
        value.as_deref()
    }

    fn is_present(&self, field: Field) -> bool {
        match field {
            Field::DesejaGdc => self.deseja_gdc.is_some(),
            _ => self.raw(field).is_some(),
        }
    }

    fn is_blank(&self, field: Field) -> bool {
        match field {
            Field::DesejaGdc => self.deseja_gdc.is_none(),
            _ => self.raw(field).map_or(true, |v| v.trim().is_empty()),
        }
    }

    pub fn validate(&self, mode: FormMode) -> Result<(), FormError> {
        for field in Field::ALL {
            let present = self.is_present(field);
            if present && !(mode.shows(field) && mode.is_editable(field)) {
                return Err(FormError::ReadOnly(field.column()));
            }
            if mode.is_required(field)
                && self.is_blank(field)
                && (present || !mode.is_partial())
            {
                return Err(FormError::MissingField(field.column()));
            }
        }
        Ok(())
    }

    /// Trimmed value, `None` when absent or blank.
    fn text(&self, field: Field) -> Option<String> {
        self.raw(field)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// `None` when absent, `Some(None)` when submitted blank.
    fn nullable_text(&self, field: Field) -> Option<Option<String>> {
        self.raw(field).map(|_| self.text(field))
    }

    fn date(&self, field: Field) -> Result<Option<NaiveDate>, FormError> {
        self.text(field)
            .map(|v| {
                NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                    .map_err(|_| FormError::InvalidDate(field.column()))
            })
            .transpose()
    }

    fn nullable_date(&self, field: Field) -> Result<Option<Option<NaiveDate>>, FormError> {
        match self.raw(field) {
            None => Ok(None),
            Some(_) => self.date(field).map(Some),
        }
    }

    fn choice<T>(
        &self,
        field: Field,
        parse: fn(&str) -> Result<T, LabelError>,
    ) -> Result<Option<T>, FormError> {
        Ok(self.text(field).map(|v| parse(&v)).transpose()?)
    }

    fn nullable_choice<T>(
        &self,
        field: Field,
        parse: fn(&str) -> Result<T, LabelError>,
    ) -> Result<Option<Option<T>>, FormError> {
        match self.raw(field) {
            None => Ok(None),
            Some(_) => self.choice(field, parse).map(Some),
        }
    }

    fn required<T>(value: Option<T>, field: Field) -> Result<T, FormError> {
        value.ok_or(FormError::MissingField(field.column()))
    }

    /// Builds the insert for the registration form, stamped with the caller's identity.
    pub fn into_new_decision(self, registrant: &Identity) -> Result<NewDecision, FormError> {
        self.validate(FormMode::Create)?;

        let celebracao = self.choice(Field::Celebracao, Celebration::from_label)?;
        let deseja_gdc = self.deseja_gdc.unwrap_or(false);

        Ok(NewDecision {
            nome: Self::required(self.text(Field::Nome), Field::Nome)?,
            decisao: Self::required(
                self.choice(Field::Decisao, DecisionType::from_label)?,
                Field::Decisao,
            )?,
            data_decisao: Self::required(self.date(Field::DataDecisao)?, Field::DataDecisao)?,
            estado_civil: self.choice(Field::EstadoCivil, MaritalStatus::from_label)?,
            nascimento: self.date(Field::Nascimento)?,
            email: self.text(Field::Email),
            cidade: self.text(Field::Cidade),
            estado: self.text(Field::Estado),
            bairro: self.text(Field::Bairro),
            celular: self.text(Field::Celular),
            celebracao,
            celebracao_extra: match celebracao {
                Some(Celebration::Other) => self.text(Field::CelebracaoExtra),
                _ => None,
            },
            status: self
                .choice(Field::Status, DecisionStatus::from_label)?
                .unwrap_or_default(),
            deseja_gdc,
            observacao: self.text(Field::Observacao),
            gdc_encaminhado: if deseja_gdc {
                self.text(Field::GdcEncaminhado)
            } else {
                None
            },
            user_id: registrant.id,
            cadastrado_por: Some(registrant.id),
            nome_cadastrante: Self::required(
                self.text(Field::NomeCadastrante),
                Field::NomeCadastrante,
            )?,
        })
    }

    /// Builds a partial update holding only the submitted fields.
    pub fn into_patch(self, mode: FormMode) -> Result<DecisionPatch, FormError> {
        self.validate(mode)?;

        let patch = DecisionPatch {
            nome: self.text(Field::Nome),
            decisao: self.choice(Field::Decisao, DecisionType::from_label)?,
            data_decisao: self.date(Field::DataDecisao)?,
            estado_civil: self.nullable_choice(Field::EstadoCivil, MaritalStatus::from_label)?,
            nascimento: self.nullable_date(Field::Nascimento)?,
            email: self.nullable_text(Field::Email),
            cidade: self.nullable_text(Field::Cidade),
            estado: self.nullable_text(Field::Estado),
            bairro: self.nullable_text(Field::Bairro),
            celular: self.nullable_text(Field::Celular),
            celebracao: self.nullable_choice(Field::Celebracao, Celebration::from_label)?,
            celebracao_extra: self.nullable_text(Field::CelebracaoExtra),
            status: self.choice(Field::Status, DecisionStatus::from_label)?,
            deseja_gdc: self.deseja_gdc,
            observacao: self.nullable_text(Field::Observacao),
            gdc_encaminhado: self.nullable_text(Field::GdcEncaminhado),
            nome_cadastrante: self.text(Field::NomeCadastrante),
        }
        .normalize();

        if patch.is_empty() {
            return Err(FormError::Empty);
        }
        Ok(patch)
    }
}
