// [libs/infra/db/src/lib.rs]
/*!
 * =================================================================
 * APARATO: PERSISTENCE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ESQUEMA, CONEXIÓN Y REPOSITORIOS POR ENTIDAD
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::DbClient;
pub use errors::DbError;
pub use repositories::{CampaignRepository, DomainRepository, JobRepository, PersonaRepository, ProxyRepository};
