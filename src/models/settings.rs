// src/models/settings.rs

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::store::Record;

/// Configuração global do site. Só o Admin altera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub site_name: String,
    pub currency: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "MobiFix".to_string(),
            currency: "$".to_string(),
        }
    }
}

impl SiteConfig {
    /// Iniciais das palavras do nome, em maiúsculas, no máximo duas. "MF" se vazio.
    pub fn abbreviation(&self) -> String {
        let abbr: String = self
            .site_name
            .split(' ')
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect();
        if abbr.is_empty() { "MF".to_string() } else { abbr }
    }

    /// Formatação de exibição apenas: símbolo + duas casas.
    pub fn format_amount(&self, amount: Decimal) -> String {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_sign_negative() {
            format!("-{}{:.2}", self.currency, rounded.abs())
        } else {
            format!("{}{:.2}", self.currency, rounded)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,
    pub name: String,
}

impl Record for Department {
    const ENTITY: &'static str = "Department";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSitePayload {
    #[validate(length(min = 1, message = "O nome do site é obrigatório."))]
    pub site_name: String,
    #[validate(length(min = 1, max = 4, message = "Símbolo de moeda inválido."))]
    pub currency: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertDepartmentPayload {
    pub id: Option<String>,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn site(name: &str) -> SiteConfig {
        SiteConfig { site_name: name.to_string(), currency: "$".to_string() }
    }

    #[test]
    fn abbreviation_takes_two_initials() {
        assert_eq!(site("MobiFix").abbreviation(), "M");
        assert_eq!(site("Mobi Fix Repairs").abbreviation(), "MF");
        assert_eq!(site("acme tech").abbreviation(), "AT");
        assert_eq!(site("").abbreviation(), "MF");
    }

    #[test]
    fn amounts_are_formatted_with_symbol_and_two_places() {
        let s = site("MobiFix");
        assert_eq!(s.format_amount(dec("249")), "$249.00");
        assert_eq!(s.format_amount(dec("12.345")), "$12.35");
        assert_eq!(s.format_amount(dec("-3.5")), "-$3.50");
    }
}
