//! Process environment capabilities.
//!
//! Elevation is queried once at startup through the [`Environment`] trait so
//! the orchestrator can be driven by a fake in tests.

/// Capabilities of the host process the signing flow depends on
pub trait Environment {
    /// Whether the process runs with administrator (Windows) or root (Unix) rights
    fn is_elevated(&self) -> bool;
}

/// Environment backed by the real operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn is_elevated(&self) -> bool {
        let elevated = platform::is_elevated();
        log::debug!("Process elevation: {}", elevated);
        elevated
    }
}

#[cfg(windows)]
#[allow(unsafe_code)]
mod platform {
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Security::{
        GetTokenInformation, TOKEN_ELEVATION, TOKEN_QUERY, TokenElevation,
    };
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    pub(super) fn is_elevated() -> bool {
        // SAFETY: the token handle is owned by this function and closed before
        // returning; TOKEN_ELEVATION is a plain u32 struct sized for the query.
        unsafe {
            let mut token = HANDLE::default();
            if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token).is_err() {
                return false;
            }

            let mut elevation = TOKEN_ELEVATION::default();
            let mut returned = 0u32;
            let queried = GetTokenInformation(
                token,
                TokenElevation,
                Some(&mut elevation as *mut TOKEN_ELEVATION as *mut core::ffi::c_void),
                std::mem::size_of::<TOKEN_ELEVATION>() as u32,
                &mut returned,
            );
            let _ = CloseHandle(token);

            queried.is_ok() && elevation.TokenIsElevated != 0
        }
    }
}

#[cfg(unix)]
mod platform {
    pub(super) fn is_elevated() -> bool {
        users::get_effective_uid() == 0
    }
}

#[cfg(not(any(windows, unix)))]
mod platform {
    pub(super) fn is_elevated() -> bool {
        false
    }
}

/// Fixed answer, for tests and dry runs driven by callers
#[derive(Debug, Clone, Copy)]
pub struct StaticEnvironment {
    /// Value returned by [`Environment::is_elevated`]
    pub elevated: bool,
}

impl Environment for StaticEnvironment {
    fn is_elevated(&self) -> bool {
        self.elevated
    }
}
