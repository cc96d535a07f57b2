pub mod breakdown;
pub mod calculation;
pub mod config;
pub mod decimal;
pub mod editing;
pub mod errors;
pub mod estimation;
pub mod estimator;
pub mod events;
pub mod payments;
pub mod store;
pub mod types;

// re-export key types
pub use breakdown::{assemble_breakdown, BreakdownRecord, BreakdownSummary, PaymentBreakdown};
pub use calculation::{SavedCalculation, SavedCalculationRecord};
pub use config::{
    EstimationStrategy, EstimatorConfig, FallbackPolicy, HeuristicAssumptions,
    RemoteEstimatorConfig,
};
pub use decimal::{Money, Rate};
pub use editing::{effective_annual_rate, recompute_total, EditedCosts, FixedComponents};
pub use errors::{EstimatorError, Result};
pub use estimation::{
    ChatCompletion, CostEstimator, HeuristicCostEstimator, LocationCosts, OpenAiChatClient,
    RemoteCostEstimator,
};
pub use estimator::{Estimate, MortgageEstimator};
pub use events::{CalculationEvent, EventStore};
pub use payments::{
    compute_principal_interest_pmi, AmortizationSchedule, LoanTerms, PrincipalInterestPmi,
    ScheduledPayment,
};
pub use store::{CalculationStore, InMemoryCalculationStore};
pub use types::{
    BorrowerProfile, CalculationId, MortgageType, OwnerId, ProfileForm, PropertyInput,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
