//! Command builders for the current user's personal certificate store.

use super::invocation::{ToolInvocation, ToolKind};
use crate::certificate::Thumbprint;
use std::path::Path;

/// Personal store name
pub const PERSONAL_STORE: &str = "My";

/// Import a PKCS#12 bundle into the personal store, replacing an existing entry
pub fn import_pfx(program: &Path, bundle: &Path, password: &str) -> ToolInvocation {
    ToolInvocation::new(ToolKind::CertUtil, program)
        .arg("-f")
        .arg("-user")
        .arg("-p")
        .secret_arg(password)
        .arg("-importpfx")
        .arg(PERSONAL_STORE)
        .path_arg(bundle)
}

/// Query the personal store for a certificate; exit status 0 means present
pub fn query(program: &Path, thumbprint: &Thumbprint) -> ToolInvocation {
    ToolInvocation::new(ToolKind::CertUtil, program)
        .arg("-user")
        .arg("-store")
        .arg(PERSONAL_STORE)
        .arg(thumbprint.as_str())
}

/// Delete the entry matching `cert_id` (thumbprint or subject common name)
pub fn delete(program: &Path, cert_id: &str) -> ToolInvocation {
    ToolInvocation::new(ToolKind::CertUtil, program)
        .arg("-user")
        .arg("-delstore")
        .arg(PERSONAL_STORE)
        .arg(cert_id)
}
