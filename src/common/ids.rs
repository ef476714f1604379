// src/common/ids.rs

use uuid::Uuid;

/// Ator usado em registros gerados pelo próprio sistema
/// (estoque de abertura, aprovação automática de consumo em reparos).
pub const SYSTEM_ACTOR: &str = "system";

/// Gera um id novo com prefixo legível, ex: "TX-3f2a…".
pub fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_prefix_and_are_unique() {
        let a = new_id("TX");
        let b = new_id("TX");
        assert!(a.starts_with("TX-"));
        assert_ne!(a, b);
    }
}
