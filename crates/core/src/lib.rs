pub mod audit;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod flows;
pub mod leads;
pub mod rfp;

pub use config::{AppConfig, ConfigError, LoadOptions, LogFormat};
pub use domain::decision::{BatchId, DecisionBatch};
pub use domain::lead::{FollowUpStatus, Lead, LeadId, Priority, SalesStatus, ScoreResult};
pub use domain::product::{EnquiredProduct, Product, StockState, StockStatus};
pub use engine::{LeadRanking, SalesEngine, SubmissionOutcome, SubmissionRequest};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{BatchProgress, BatchState};
pub use leads::{LeadEvaluation, LeadPrioritizer, PriorityCounts};
pub use rfp::{
    ActionKind, AvailabilityStatus, Catalog, DecisionSubmission, RoutedBatch, RoutingError,
    Selection,
};
