//! Signing certificate handling.
//!
//! Covers fingerprint validation, the PKCS#12 re-encoding round trip needed
//! before the Windows store accepts a bundle, import and lookup in the
//! current user's personal store, and best-effort removal afterwards.

mod pem;
mod provision;
mod store;
mod thumbprint;

pub use pem::leaf_certificate_der;
pub use provision::{CertificateHandle, CertificateSource, Provisioner, ReencodedBundle};
pub use store::{CertificateStore, CleanupOutcome};
pub use thumbprint::Thumbprint;
