pub mod alert_evaluator;
pub mod enricher;
pub mod pipeline;
pub mod scheduler;

pub use alert_evaluator::{AlertEvaluator, AlertReport, FailedAlert};
pub use enricher::{last_filled_price, Enricher};
pub use pipeline::{RefreshPipeline, RefreshSummary};
pub use scheduler::Scheduler;
