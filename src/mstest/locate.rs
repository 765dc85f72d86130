//! Locating `mstest.exe` from the Visual Studio tools variables.

use std::ffi::OsString;
use std::path::PathBuf;

/// Tools variables checked in order, newest Visual Studio first.
pub const VS_TOOLS_VARIABLES: [&str; 3] = ["VS120COMNTOOLS", "VS110COMNTOOLS", "VS100COMNTOOLS"];

/// Errors locating the MSTest executable.
#[derive(thiserror::Error, Debug)]
pub enum LocateError {
    #[error("Could not find path to Visual Studio tools")]
    ToolsNotFound,
    #[error("Could not find mstest.exe at {0}")]
    ExecutableMissing(PathBuf),
}

/// Find `mstest.exe` using the process environment.
///
/// # Errors
///
/// Returns `LocateError` if no tools variable is set or the executable is
/// not where the variable says.
pub fn locate_mstest() -> Result<PathBuf, LocateError> {
    locate_with(|name| std::env::var_os(name))
}

/// Find `mstest.exe` using `lookup` to read variables.
///
/// # Errors
///
/// Same as [`locate_mstest`].
pub fn locate_with<F>(lookup: F) -> Result<PathBuf, LocateError>
where
    F: Fn(&str) -> Option<OsString>,
{
    let (variable, tools) = VS_TOOLS_VARIABLES
        .iter()
        .find_map(|name| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .map(|value| (*name, PathBuf::from(value)))
        })
        .ok_or(LocateError::ToolsNotFound)?;

    let exe = tools.join("..").join("IDE").join("mstest.exe");
    tracing::debug!(variable, path = %exe.display(), "Resolved mstest.exe");

    if exe.is_file() {
        Ok(exe)
    } else {
        Err(LocateError::ExecutableMissing(exe))
    }
}
