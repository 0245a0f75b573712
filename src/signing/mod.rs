//! Dual-algorithm ClickOnce signing.
//!
//! Executables are signed with signtool using SHA-256 for both the file and
//! timestamp digests. Manifests are regenerated and signed with mage using
//! SHA-1, with the payload's marker extension stripped while mage hashes it.

mod orchestrator;
mod preconditions;
mod request;

pub use orchestrator::{Orchestrator, SignReport, SigningPlan};
pub use preconditions::{
    PreparedRun, check_certificate, check_preconditions, check_publish_dir, check_timestamp_url,
    check_tools,
};
pub use request::{
    CertificateInput, DEFAULT_LAUNCHER, DEFAULT_TIMESTAMP_URL, SigningConfig, SigningRequest,
    ToolOverrides,
};
