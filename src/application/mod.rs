pub mod alerter;
pub mod load_injector;
pub mod monitoring;

pub use alerter::{AlertDelivery, Alerter};
pub use load_injector::{DispatchOutcome, InjectionReport, LoadInjector, TargetOutcome};
pub use monitoring::{ContainerOutcome, MonitoringService, PassReport};
