//! LLM-backed services behind the workflow executors.
//!
//! Each service owns its instructions and prompt shape and exposes one
//! typed async operation; the executors stay thin adapters between the
//! graph and these services.

mod hr;
mod it;
mod router;

pub use hr::HrService;
pub use it::{ItDiagnoseService, ItResolveService};
pub use router::RouterService;
