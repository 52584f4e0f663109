//! Persistence core of the dealership back office.
//! Query-by-example DAOs, the classifier taxonomy store and the
//! model-year overlap detector.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig, DatabaseTarget};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::bank::{Bank, BankTemplate};
pub use model::canonical::{
    canonical_definitions, AccountType, ClassifierKind, DocumentType, PaymentType,
    PersonClassification, ProposalState, RiskLevel, SaleProbability, CANONICAL_REGISTRY,
};
pub use model::classifier::{Classifier, ClassifierDefinition, ClassifierTemplate};
pub use model::entity::{
    Entity, EntityId, FieldDescriptor, FieldKind, FieldValue, Reference, ValidationError,
};
pub use model::model_range::{
    ItemModel, ItemModelTemplate, ProductModel, ProductModelTemplate, RangedAssociation,
    YearRange,
};
pub use model::party::{Partner, PartnerTemplate, Person, PersonTemplate};
pub use query::filter::{Filter, MatchMode, Predicate};
pub use query::page::{PageRequest, SortDirection, SortOrder};
pub use repo::classifier_repo::{ClassifierResolver, Resolution, SeedReport};
pub use repo::dao::{Dao, Hydrator, SqliteDao};
pub use repo::error::{RepoError, RepoResult};
pub use repo::range_validator::{OverlapCandidate, OverlapCheck};
pub use service::association_service::{
    AssociationError, AssociationResult, AssociationService, SavedWithWarnings,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
