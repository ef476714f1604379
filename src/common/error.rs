// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Classificação coarse dos erros do domínio.
/// É o que o cliente HTTP recebe no campo `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Validation,
    NotFound,
    StateConflict,
    ReferentialConflict,
    Unauthenticated,
    Forbidden,
    Internal,
}

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Quantidade inválida: {0} (deve ser um inteiro positivo)")]
    InvalidQuantity(i64),

    #[error("Valor inválido: {0}")]
    InvalidAmount(String),

    #[error("O campo '{0}' é obrigatório")]
    MissingField(&'static str),

    #[error("{entity} '{id}' não encontrado")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} '{id}': transição inválida de {from} para {to}")]
    InvalidStateTransition {
        entity: &'static str,
        id: String,
        from: String,
        to: String,
    },

    #[error("O ativo '{0}' já possui uma atribuição em aberto")]
    AlreadyAssigned(String),

    #[error("O ativo '{asset_id}' não está disponível (status atual: {status})")]
    NotAvailable { asset_id: String, status: String },

    #[error("A atribuição '{0}' já foi devolvida")]
    NotOpen(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("{entity} com o nome '{name}' já existe")]
    NameAlreadyExists { entity: &'static str, name: String },

    #[error("Já existe uma fatura para o reparo '{0}'")]
    InvoiceAlreadyExists(String),

    #[error("{entity} '{id}' ainda é referenciado por {referenced_by}")]
    ReferentialConflict {
        entity: &'static str,
        id: String,
        referenced_by: String,
    },

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Nenhuma sessão ativa")]
    Unauthenticated,

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound { entity, id: id.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidQuantity(_)
            | AppError::InvalidAmount(_)
            | AppError::MissingField(_) => ErrorKind::Validation,
            AppError::NotFound { .. } => ErrorKind::NotFound,
            AppError::InvalidStateTransition { .. }
            | AppError::AlreadyAssigned(_)
            | AppError::NotAvailable { .. }
            | AppError::NotOpen(_)
            | AppError::EmailAlreadyExists
            | AppError::NameAlreadyExists { .. }
            | AppError::InvoiceAlreadyExists(_) => ErrorKind::StateConflict,
            AppError::ReferentialConflict { .. } => ErrorKind::ReferentialConflict,
            AppError::InvalidCredentials | AppError::Unauthenticated => ErrorKind::Unauthenticated,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::InternalServerError(_) | AppError::BcryptError(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::StateConflict | ErrorKind::ReferentialConflict => StatusCode::CONFLICT,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();

        match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "kind": kind,
                    "details": details,
                }));
                (status, body).into_response()
            }
            // Erros internos: o `tracing` loga o detalhe, o cliente recebe mensagem genérica.
            ref e if kind == ErrorKind::Internal => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                let body = Json(json!({ "error": "Ocorreu um erro inesperado.", "kind": kind }));
                (status, body).into_response()
            }
            e => {
                let body = Json(json!({ "error": e.to_string(), "kind": kind }));
                (status, body).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_http_status() {
        assert_eq!(AppError::InvalidQuantity(0).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::not_found("Part", "P404").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::AlreadyAssigned("ASSET-1".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::ReferentialConflict {
                entity: "Part",
                id: "P001".into(),
                referenced_by: "transação pendente".into(),
            }
            .kind(),
            ErrorKind::ReferentialConflict
        );
        assert_eq!(AppError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = AppError::not_found("Asset", "ASSET-9");
        assert_eq!(err.to_string(), "Asset 'ASSET-9' não encontrado");
    }
}
