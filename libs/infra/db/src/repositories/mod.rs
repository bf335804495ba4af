// [libs/infra/db/src/repositories/mod.rs]
pub mod campaign;
pub mod domain;
pub mod job;
pub mod persona;
pub mod proxy;

pub use campaign::CampaignRepository;
pub use domain::DomainRepository;
pub use job::JobRepository;
pub use persona::PersonaRepository;
pub use proxy::ProxyRepository;
