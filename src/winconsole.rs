//! Console profile setup for the PowerShell wrapper on Windows.
//!
//! PowerShell started from a plain `CreateProcess` inherits the cmd.exe
//! console profile, so the first launch seeds a dedicated registry profile
//! with the two color-table values the wrapper's scheme expects. The
//! wrapper script also needs to know where it was installed; that path is
//! published through an environment variable in 8.3 short form to sidestep
//! spaces and non-ASCII characters.

use std::path::Path;

use windows_sys::Win32::Foundation::ERROR_SUCCESS;
use windows_sys::Win32::Storage::FileSystem::GetShortPathNameW;
use windows_sys::Win32::System::Registry::{
    HKEY, HKEY_CURRENT_USER, KEY_READ, KEY_WRITE, REG_DWORD, REG_OPTION_NON_VOLATILE,
    RegCloseKey, RegCreateKeyExW, RegOpenKeyExW, RegSetValueExW,
};

/// Console profile key for powershell.exe launched by its system path.
const CONSOLE_KEY: &str = r"Console\%SystemRoot%_system32_WindowsPowerShell_v1.0_powershell.exe";

const COLOR_TABLE_05: u32 = 5_645_313;
const COLOR_TABLE_06: u32 = 15_789_550;

/// Environment variable `PS.bat` reads to locate the install directory.
pub(crate) const INSTALL_DIR_ENV: &str = "KTERM_PATH";

/// Ensure the powershell console profile exists and publish the install
/// directory for the wrapper script. Failures are logged, never fatal: the
/// wrapper still runs with default console colors.
pub(crate) fn prepare_powershell_profile(install_dir: &Path) {
    if let Err(e) = ensure_console_profile() {
        eprintln!("[resolver] console profile setup failed: {e}");
    }

    let path = short_path(install_dir)
        .unwrap_or_else(|| install_dir.to_string_lossy().to_string());
    // Backtick is PowerShell's escape character; any space surviving the
    // short-path conversion must be escaped for the wrapper.
    let escaped = path.replace(' ', "` ");
    // SAFETY: called from the single-threaded startup path, before any
    // worker thread reads the environment.
    unsafe { std::env::set_var(INSTALL_DIR_ENV, escaped) };
}

fn to_wide(s: &str) -> Vec<u16> {
    use std::os::windows::ffi::OsStrExt;
    std::ffi::OsStr::new(s)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

/// Open the console profile key, creating it with the two color values when
/// absent. An existing key is left untouched.
fn ensure_console_profile() -> Result<(), String> {
    let key_path = to_wide(CONSOLE_KEY);

    let mut existing: HKEY = std::ptr::null_mut();
    let opened = unsafe {
        RegOpenKeyExW(
            HKEY_CURRENT_USER,
            key_path.as_ptr(),
            0,
            KEY_READ,
            &mut existing,
        )
    };
    if opened == ERROR_SUCCESS {
        unsafe { RegCloseKey(existing) };
        return Ok(());
    }

    let mut created: HKEY = std::ptr::null_mut();
    let mut disposition = 0u32;
    let status = unsafe {
        RegCreateKeyExW(
            HKEY_CURRENT_USER,
            key_path.as_ptr(),
            0,
            std::ptr::null(),
            REG_OPTION_NON_VOLATILE,
            KEY_WRITE,
            std::ptr::null(),
            &mut created,
            &mut disposition,
        )
    };
    if status != ERROR_SUCCESS {
        return Err(format!("RegCreateKeyExW failed with code {status}"));
    }

    let result = set_dword(created, "ColorTable05", COLOR_TABLE_05)
        .and_then(|()| set_dword(created, "ColorTable06", COLOR_TABLE_06));
    unsafe { RegCloseKey(created) };
    result
}

fn set_dword(key: HKEY, name: &str, value: u32) -> Result<(), String> {
    let name_w = to_wide(name);
    let bytes = value.to_le_bytes();
    let status = unsafe {
        RegSetValueExW(
            key,
            name_w.as_ptr(),
            0,
            REG_DWORD,
            bytes.as_ptr(),
            bytes.len() as u32,
        )
    };
    if status != ERROR_SUCCESS {
        return Err(format!("RegSetValueExW({name}) failed with code {status}"));
    }
    Ok(())
}

/// 8.3 short form of a path, or None when the conversion is unavailable
/// (e.g. short names disabled on the volume).
fn short_path(path: &Path) -> Option<String> {
    let wide = to_wide(&path.to_string_lossy());
    let mut buf = vec![0u16; 512];
    let len = unsafe { GetShortPathNameW(wide.as_ptr(), buf.as_mut_ptr(), buf.len() as u32) };
    if len == 0 || len as usize > buf.len() {
        return None;
    }
    Some(String::from_utf16_lossy(&buf[..len as usize]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_wide_is_null_terminated() {
        let wide = to_wide("abc");
        assert_eq!(wide.last(), Some(&0));
        assert_eq!(wide.len(), 4);
    }

    #[test]
    fn short_path_of_missing_file_is_none() {
        // GetShortPathNameW fails for paths that don't exist.
        assert!(short_path(Path::new("Z:\\kterm-does-not-exist\\x")).is_none());
    }
}
