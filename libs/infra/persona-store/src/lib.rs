// [libs/infra/persona-store/src/lib.rs]
/*!
 * =================================================================
 * APARATO: PERSONA STORE (ESTRATO L3)
 * RESPONSABILIDAD: CRUD Y VALIDACIÓN DE PERSONAS DNS/HTTP
 *
 * Implementa spec.md §4.A sobre `campaign-infra-db::PersonaRepository`.
 * =================================================================
 */

pub mod errors;
pub mod validation;

pub use errors::PersonaStoreError;

use campaign_domain_models::{Persona, PersonaConfig, PersonaKind};
use campaign_infra_db::PersonaRepository;
use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

pub struct TestOutcome {
    pub valid: bool,
    pub reason: Option<String>,
}

pub struct PersonaStore {
    repository: PersonaRepository,
}

impl PersonaStore {
    pub fn new(repository: PersonaRepository) -> Self {
        Self { repository }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, kind: Option<PersonaKind>, enabled_only: bool) -> Result<Vec<Persona>, PersonaStoreError> {
        let personas = self.repository.list(kind).await?;
        Ok(if enabled_only { personas.into_iter().filter(|p| p.enabled).collect() } else { personas })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Persona, PersonaStoreError> {
        Ok(self.repository.get(id).await?)
    }

    #[instrument(skip(self, config))]
    pub async fn create(&self, name: impl Into<String>, config: PersonaConfig) -> Result<Persona, PersonaStoreError> {
        validation::validate_config(&config)?;

        let now = Utc::now();
        let persona = Persona {
            id: Uuid::new_v4(),
            name: name.into(),
            config,
            enabled: true,
            created_at: now,
            updated_at: now,
        };

        self.repository.insert(&persona).await?;
        Ok(persona)
    }

    #[instrument(skip(self, config))]
    pub async fn update(
        &self,
        id: Uuid,
        name: impl Into<String>,
        config: PersonaConfig,
        enabled: bool,
    ) -> Result<(), PersonaStoreError> {
        validation::validate_config(&config)?;
        let now = Utc::now();
        self.repository.update(id, &name.into(), &config, enabled, now).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), PersonaStoreError> {
        Ok(self.repository.delete(id).await?)
    }

    /// Re-runs write-time validation against a persisted persona's
    /// current configuration — a dry-run "does this still make sense"
    /// check, not a live network probe (the network-capable checks live
    /// in `campaign-core-dns` / `campaign-core-http`).
    #[instrument(skip(self))]
    pub async fn test(&self, id: Uuid) -> Result<TestOutcome, PersonaStoreError> {
        let persona = self.repository.get(id).await?;
        match validation::validate_config(&persona.config) {
            Ok(()) => Ok(TestOutcome { valid: true, reason: None }),
            Err(PersonaStoreError::InvalidConfig(reason)) => Ok(TestOutcome { valid: false, reason: Some(reason) }),
            Err(other) => Err(other),
        }
    }
}
