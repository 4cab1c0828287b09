use std::path::Path;

/// Returns whether `path` names a regular file the current user may read and
/// execute. Missing paths, directories and permission errors all yield
/// `false`.
pub async fn is_executable(path: &Path) -> bool {
    let path = path.to_path_buf();
    smol::unblock(move || is_executable_sync(&path)).await
}

#[cfg(unix)]
pub fn is_executable_sync(path: &Path) -> bool {
    use std::{ffi::CString, os::unix::ffi::OsStrExt};

    if !std::fs::metadata(path).is_ok_and(|metadata| metadata.is_file()) {
        return false;
    }
    let Ok(path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: `path` is a valid NUL-terminated string for the duration of the call.
    unsafe { libc::access(path.as_ptr(), libc::R_OK | libc::X_OK) == 0 }
}

#[cfg(not(unix))]
pub fn is_executable_sync(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|metadata| metadata.is_file())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn write_file(path: &Path, mode: u32) {
        std::fs::write(path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn test_is_executable() {
        let dir = tempfile::tempdir().unwrap();
        let executable = dir.path().join("gdb");
        let plain = dir.path().join("notes.txt");
        write_file(&executable, 0o755);
        write_file(&plain, 0o644);

        smol::block_on(async {
            assert!(is_executable(&executable).await);
            assert!(!is_executable(&plain).await);
            assert!(!is_executable(&dir.path().join("missing")).await);
            assert!(!is_executable(dir.path()).await);
        });
    }
}
