// src/services/auth.rs

use async_trait::async_trait;
use bcrypt::{hash, verify};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::RwLock;
use validator::Validate;

use crate::{
    common::{error::AppError, ids::new_id},
    db::EntityStore,
    models::{
        auth::RegisterPayload,
        employee::{Employee, EmployeeStatus, Permissions, Role},
    },
};

/// Chave fixa da sessão: existe no máximo uma identidade logada.
pub const SESSION_KEY: &str = "mobifix_session";

// Acesso mestre e segredo universal (fraqueza conhecida, desligável por config)
const MASTER_IDENTIFIER: &str = "Admin";
const MASTER_SECRET: &str = "1234";
const UNIVERSAL_SECRET: &str = "admin";

/// Senha inicial de quem se cadastra sozinho.
pub const DEFAULT_PASSWORD: &str = "password";

// ---
// Verificação de credenciais
// ---

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, secret: &str, stored: &str) -> Result<bool, AppError>;

    /// Como a senha deve ficar gravada no funcionário.
    async fn encode(&self, secret: &str) -> Result<String, AppError>;

    /// Se o valor gravado já está no formato deste verificador.
    fn is_encoded(&self, _stored: &str) -> bool {
        true
    }
}

/// Regrava no formato do verificador as senhas que ainda estão em outro
/// (ex: texto puro vindo da semente ou de um snapshot antigo).
/// Devolve quantos funcionários mudaram.
pub async fn upgrade_stored_passwords(
    store: &mut EntityStore,
    verifier: &dyn CredentialVerifier,
) -> Result<usize, AppError> {
    let mut upgraded = 0;
    for employee in store.employees_mut().iter_mut() {
        if verifier.is_encoded(&employee.password) {
            continue;
        }
        employee.password = verifier.encode(&employee.password).await?;
        upgraded += 1;
    }
    if upgraded > 0 {
        tracing::info!(upgraded, "senhas gravadas convertidas para o esquema atual");
    }
    Ok(upgraded)
}

/// Texto puro. É o que o documento salvo traz hoje.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextVerifier;

#[async_trait]
impl CredentialVerifier for PlaintextVerifier {
    async fn verify(&self, secret: &str, stored: &str) -> Result<bool, AppError> {
        Ok(secret == stored)
    }

    async fn encode(&self, secret: &str) -> Result<String, AppError> {
        Ok(secret.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BcryptVerifier {
    cost: u32,
}

impl BcryptVerifier {
    pub fn new() -> Self {
        Self { cost: bcrypt::DEFAULT_COST }
    }

    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialVerifier for BcryptVerifier {
    async fn verify(&self, secret: &str, stored: &str) -> Result<bool, AppError> {
        let secret = secret.to_owned();
        let stored = stored.to_owned();

        // Executa a verificação em um thread separado
        let is_valid = tokio::task::spawn_blocking(move || verify(&secret, &stored))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?;

        // Senha gravada que não é hash bcrypt simplesmente não confere
        match is_valid {
            Ok(valid) => Ok(valid),
            Err(e) => {
                tracing::debug!(error = %e, "credencial gravada não é um hash bcrypt válido");
                Ok(false)
            }
        }
    }

    async fn encode(&self, secret: &str) -> Result<String, AppError> {
        let secret = secret.to_owned();
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || hash(&secret, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    fn is_encoded(&self, stored: &str) -> bool {
        stored.starts_with("$2")
    }
}

// ---
// Sessão
// ---

#[derive(Clone, Default)]
pub struct SessionStore {
    slot: Arc<RwLock<Option<Employee>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Employee> {
        self.slot.read().await.clone()
    }

    pub async fn set(&self, employee: Employee) {
        tracing::debug!(key = SESSION_KEY, employee_id = %employee.id, "sessão gravada");
        *self.slot.write().await = Some(employee);
    }

    pub async fn clear(&self) -> Option<Employee> {
        self.slot.write().await.take()
    }

    /// Atualiza a sessão se o funcionário editado for o logado.
    pub async fn refresh(&self, employee: &Employee) {
        let mut slot = self.slot.write().await;
        if slot.as_ref().is_some_and(|current| current.id == employee.id) {
            *slot = Some(employee.clone());
        }
    }

    /// Encerra a sessão se o funcionário logado foi removido.
    pub async fn forget(&self, employee_id: &str) {
        let mut slot = self.slot.write().await;
        if slot.as_ref().is_some_and(|current| current.id == employee_id) {
            *slot = None;
        }
    }
}

// ---
// Serviço
// ---

#[derive(Clone)]
pub struct AuthService {
    verifier: Arc<dyn CredentialVerifier>,
    sessions: SessionStore,
    allow_universal_secret: bool,
}

impl AuthService {
    pub fn new(verifier: Arc<dyn CredentialVerifier>, allow_universal_secret: bool) -> Self {
        if allow_universal_secret {
            tracing::warn!(
                "⚠️ Segredo universal habilitado: qualquer e-mail cadastrado entra com '{}'. Use ALLOW_UNIVERSAL_SECRET=false para desligar.",
                UNIVERSAL_SECRET
            );
        }
        Self {
            verifier,
            sessions: SessionStore::new(),
            allow_universal_secret,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Resolve a identidade sem mexer na sessão. `None` = credenciais não conferem.
    pub async fn authenticate(
        &self,
        store: &RwLock<EntityStore>,
        identifier: &str,
        secret: &str,
    ) -> Result<Option<Employee>, AppError> {
        // O guard de leitura não atravessa a verificação (pode ir para outro thread)
        let candidate = {
            let store = store.read().await;

            // 1. Acesso mestre: primeiro Admin, seja qual for a senha gravada
            if identifier == MASTER_IDENTIFIER && secret == MASTER_SECRET {
                return Ok(store.employees().iter().find(|e| e.role == Role::Admin).cloned());
            }

            // 2. Por e-mail
            match store.find_employee_by_email(identifier) {
                Some(employee) => employee.clone(),
                None => return Ok(None),
            }
        };

        if self.allow_universal_secret && secret == UNIVERSAL_SECRET {
            tracing::warn!(employee_id = %candidate.id, "login pelo segredo universal");
            return Ok(Some(candidate));
        }

        if self.verifier.verify(secret, &candidate.password).await? {
            Ok(Some(candidate))
        } else {
            Ok(None)
        }
    }

    pub async fn login(
        &self,
        store: &RwLock<EntityStore>,
        identifier: &str,
        secret: &str,
    ) -> Result<Employee, AppError> {
        let employee = self
            .authenticate(store, identifier, secret)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        self.sessions.set(employee.clone()).await;
        tracing::info!(employee_id = %employee.id, role = ?employee.role, "login efetuado");
        Ok(employee)
    }

    pub async fn logout(&self) -> Option<Employee> {
        let previous = self.sessions.clear().await;
        if let Some(employee) = &previous {
            tracing::info!(employee_id = %employee.id, "logout");
        }
        previous
    }

    pub async fn current(&self) -> Option<Employee> {
        self.sessions.current().await
    }

    /// Senha inicial codificada pelo verificador configurado.
    /// Fica fora da guarda de escrita (bcrypt roda em outro thread).
    pub async fn placeholder_password(&self) -> Result<String, AppError> {
        self.verifier.encode(DEFAULT_PASSWORD).await
    }

    /// Autocadastro: Staff, Pending, staffId `<sigla>-<100..=999>`.
    /// Roda sob a guarda de escrita; quem chama abre a sessão depois.
    pub fn register(
        &self,
        store: &mut EntityStore,
        payload: RegisterPayload,
        password: String,
    ) -> Result<Employee, AppError> {
        payload.validate()?;

        let suffix: u16 = rand::rng().random_range(100..=999);
        let employee = Employee {
            id: new_id("E"),
            staff_id: format!("{}-{}", store.site().abbreviation(), suffix),
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_string(),
            department: payload.department,
            role: Role::Staff,
            status: EmployeeStatus::Pending,
            permissions: Permissions::default(),
            password,
            join_date: Some(Utc::now().date_naive()),
        };

        // E-mail único e departamento existente
        store.upsert_employee(employee.clone())?;

        tracing::info!(employee_id = %employee.id, staff_id = %employee.staff_id, "novo funcionário cadastrado (pendente)");
        Ok(employee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorKind;
    use crate::db::seed::seeded_store;

    fn service(allow_universal_secret: bool) -> AuthService {
        AuthService::new(Arc::new(PlaintextVerifier), allow_universal_secret)
    }

    fn store() -> RwLock<EntityStore> {
        RwLock::new(seeded_store())
    }

    #[tokio::test]
    async fn master_login_resolves_to_first_admin() {
        let auth = service(true);
        let store = store();

        let employee = auth.login(&store, "Admin", "1234").await.unwrap();
        assert_eq!(employee.id, "E001");
        assert_eq!(employee.role, Role::Admin);
        assert_eq!(auth.current().await.map(|e| e.id), Some("E001".to_string()));
    }

    #[tokio::test]
    async fn email_login_checks_the_stored_credential() {
        let auth = service(false);
        let store = store();

        let manager = auth.login(&store, "Manager@Company.com", "password").await.unwrap();
        assert_eq!(manager.id, "E002");

        let err = auth.login(&store, "manager@company.com", "wrong").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        let err = auth.login(&store, "nobody@company.com", "password").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn universal_secret_can_be_switched_off() {
        let store = store();

        let open = service(true);
        assert!(open.authenticate(&store, "manager@company.com", "admin").await.unwrap().is_some());

        let closed = service(false);
        assert!(closed.authenticate(&store, "manager@company.com", "admin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_clears_the_single_session() {
        let auth = service(true);
        let store = store();
        auth.login(&store, "admin@company.com", "password").await.unwrap();

        assert_eq!(auth.logout().await.map(|e| e.id), Some("E001".to_string()));
        assert!(auth.current().await.is_none());
        assert!(auth.logout().await.is_none());
    }

    #[tokio::test]
    async fn session_refresh_only_touches_the_logged_in_employee() {
        let auth = service(true);
        let store = store();
        auth.login(&store, "manager@company.com", "password").await.unwrap();

        let mut other = store.read().await.employees().require("E001").unwrap().clone();
        other.name = "Outro Nome".into();
        auth.sessions().refresh(&other).await;
        assert_eq!(auth.current().await.unwrap().name, "John Manager");

        let mut me = store.read().await.employees().require("E002").unwrap().clone();
        me.role = Role::Admin;
        auth.sessions().refresh(&me).await;
        assert_eq!(auth.current().await.unwrap().role, Role::Admin);
    }

    #[tokio::test]
    async fn registration_creates_a_pending_staff_member() {
        let auth = service(true);
        let mut store = seeded_store();
        let password = auth.placeholder_password().await.unwrap();

        let employee = auth
            .register(
                &mut store,
                RegisterPayload {
                    name: "Carla Lima".into(),
                    email: "carla@company.com".into(),
                    department: "Support".into(),
                },
                password,
            )
            .unwrap();

        assert_eq!(employee.role, Role::Staff);
        assert_eq!(employee.status, EmployeeStatus::Pending);
        assert_eq!(employee.password, DEFAULT_PASSWORD);
        let (prefix, number) = employee.staff_id.split_once('-').unwrap();
        assert_eq!(prefix, "M");
        assert!((100..=999).contains(&number.parse::<u16>().unwrap()));
        assert!(store.employees().contains(&employee.id));
    }

    #[tokio::test]
    async fn registration_rejects_taken_email_and_unknown_department() {
        let auth = service(true);
        let mut store = seeded_store();

        let err = auth
            .register(
                &mut store,
                RegisterPayload {
                    name: "Clone".into(),
                    email: "ADMIN@company.com".into(),
                    department: "IT".into(),
                },
                DEFAULT_PASSWORD.into(),
            )
            .unwrap_err();
        assert!(matches!(err, AppError::EmailAlreadyExists));

        let err = auth
            .register(
                &mut store,
                RegisterPayload {
                    name: "Dora".into(),
                    email: "dora@company.com".into(),
                    department: "Marketing".into(),
                },
                DEFAULT_PASSWORD.into(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.employees().len(), 2);
    }

    #[tokio::test]
    async fn bcrypt_verifier_checks_hashes_and_refuses_plain_text() {
        let verifier = BcryptVerifier::with_cost(4);
        let hashed = verifier.encode("s3nha").await.unwrap();

        assert!(verifier.verify("s3nha", &hashed).await.unwrap());
        assert!(!verifier.verify("errada", &hashed).await.unwrap());
        assert!(!verifier.verify("password", "password").await.unwrap());
    }

    #[tokio::test]
    async fn seeded_logins_survive_a_switch_to_bcrypt() {
        let verifier = Arc::new(BcryptVerifier::with_cost(4));
        let mut seeded = seeded_store();

        assert_eq!(upgrade_stored_passwords(&mut seeded, verifier.as_ref()).await.unwrap(), 2);
        assert!(seeded.employees().iter().all(|e| e.password.starts_with("$2")));
        // Já convertidas não são refeitas
        assert_eq!(upgrade_stored_passwords(&mut seeded, verifier.as_ref()).await.unwrap(), 0);

        let auth = AuthService::new(verifier, false);
        let store = RwLock::new(seeded);
        let manager = auth
            .authenticate(&store, "manager@company.com", "password")
            .await
            .unwrap()
            .expect("login do gerente");
        assert_eq!(manager.id, "E002");
        assert!(auth.authenticate(&store, "manager@company.com", "errada").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn plaintext_scheme_leaves_passwords_alone() {
        let mut seeded = seeded_store();
        assert_eq!(upgrade_stored_passwords(&mut seeded, &PlaintextVerifier).await.unwrap(), 0);
        assert_eq!(seeded.employees().require("E002").unwrap().password, "password");
    }
}
