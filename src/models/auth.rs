// src/models/auth.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

use crate::models::employee::EmployeeProfile;
use crate::services::access_policy::Feature;

// Dados para login. O identificador normalmente é o e-mail,
// mas o acesso mestre usa "Admin", por isso não validamos formato aqui.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "O identificador é obrigatório."))]
    pub identifier: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub secret: String,
}

// Dados para registro de um novo funcionário
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "O departamento é obrigatório."))]
    pub department: String,
}

// Resposta de sessão: quem está logado e quais abas pode ver
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub employee: EmployeeProfile,
    pub permitted_tabs: BTreeSet<Feature>,
}
