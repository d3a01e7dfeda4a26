//! Post-solve reporting: hard-rule audit and quality metrics.

mod audit;
mod kpi;

pub use audit::audit_allocation;
pub use kpi::AllocationKpi;
