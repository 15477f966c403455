//! FFI bindings for metascrub
//!
//! C-compatible entry points for inspecting, scanning and stripping images from
//! other languages. Paths are passed as null-terminated UTF-8 strings; reports
//! come back as JSON strings that must be released with `metascrub_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::PathBuf;
use std::ptr;

use crate::adapters::KamadakSource;
use crate::encoder::ReportEncoder;
use crate::error::MetadataError;
use crate::pipeline::{analyze_mapping, MetadataProcessor, ScanOptions};
use crate::strip::strip_file;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_path(ptr: *const c_char, what: &str) -> Option<PathBuf> {
    if ptr.is_null() {
        set_last_error(&format!("Invalid {what} pointer"));
        return None;
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Some(PathBuf::from(s)),
        Err(_) => {
            set_last_error(&format!("{what} is not valid UTF-8"));
            None
        }
    }
}

fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Hand a JSON result to the caller, or record the error and return NULL
fn into_c_result(result: Result<String, MetadataError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze one image and return its report as JSON.
///
/// # Safety
/// - `path` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `metascrub_free_string`.
/// - Returns NULL on error; call `metascrub_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn metascrub_analyze_file(path: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(path) = cstr_to_path(path, "path") else {
        return ptr::null_mut();
    };

    into_c_result(
        MetadataProcessor::new()
            .analyze(&path)
            .and_then(|report| ReportEncoder::to_json(&report)),
    )
}

/// Analyze a bare TIFF/EXIF buffer (no image container) and return its report as JSON.
///
/// # Safety
/// - `data` must point to `len` readable bytes.
/// - Returns a newly allocated string that must be freed with `metascrub_free_string`.
/// - Returns NULL on error; call `metascrub_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn metascrub_analyze_tiff(data: *const u8, len: usize) -> *mut c_char {
    clear_last_error();

    if data.is_null() {
        set_last_error("Invalid data pointer");
        return ptr::null_mut();
    }

    let buffer = std::slice::from_raw_parts(data, len).to_vec();
    let mapping = KamadakSource.load_raw_tiff(buffer);
    into_c_result(ReportEncoder::to_json(&analyze_mapping("<buffer>", &mapping)))
}

/// Scan a folder and return the bulk report as JSON.
///
/// # Safety
/// - `folder` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `metascrub_free_string`.
/// - Returns NULL on error; call `metascrub_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn metascrub_scan_folder(folder: *const c_char, recursive: bool) -> *mut c_char {
    clear_last_error();

    let Some(folder) = cstr_to_path(folder, "folder") else {
        return ptr::null_mut();
    };

    let options = ScanOptions {
        recursive,
        ..ScanOptions::default()
    };
    into_c_result(
        MetadataProcessor::with_options(options)
            .scan(&folder)
            .and_then(|report| ReportEncoder::bulk_to_json(&report)),
    )
}

/// Strip metadata from a JPEG, PNG or WebP image and return the before/after comparison as JSON.
///
/// # Safety
/// - `input` and `output` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `metascrub_free_string`.
/// - Returns NULL on error; call `metascrub_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn metascrub_strip_file(
    input: *const c_char,
    output: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(input) = cstr_to_path(input, "input path") else {
        return ptr::null_mut();
    };
    let Some(output) = cstr_to_path(output, "output path") else {
        return ptr::null_mut();
    };

    into_c_result(
        strip_file(&KamadakSource, &input, &output)
            .and_then(|outcome| serde_json::to_string(&outcome).map_err(MetadataError::from)),
    )
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by metascrub functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a metascrub function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn metascrub_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next metascrub call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn metascrub_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the metascrub library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn metascrub_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{jpeg_with_app1, TiffBuilder};
    use std::fs;

    fn c_path(path: &std::path::Path) -> CString {
        CString::new(path.to_str().unwrap()).unwrap()
    }

    fn write_sample(dir: &std::path::Path) -> PathBuf {
        let tiff = TiffBuilder::new()
            .ascii(0x010F, "Canon")
            .gps_ascii(0x0001, "N")
            .gps_rationals(0x0002, &[(48, 1), (51, 1), (30, 1)])
            .gps_ascii(0x0003, "E")
            .gps_rationals(0x0004, &[(2, 1), (17, 1), (40, 1)])
            .build();
        let path = dir.join("paris.jpg");
        fs::write(&path, jpeg_with_app1(&tiff)).unwrap();
        path
    }

    #[test]
    fn test_ffi_analyze_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = c_path(&write_sample(dir.path()));

        unsafe {
            let result = metascrub_analyze_file(path.as_ptr());
            assert!(!result.is_null());

            let json: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert_eq!(json["privacy"]["score"], 8);
            assert_eq!(json["gps"]["status"], "located");

            metascrub_free_string(result);
        }
    }

    #[test]
    fn test_ffi_analyze_tiff_buffer() {
        let tiff = TiffBuilder::new()
            .ascii(0x013B, "Jane Doe")
            .ascii(0x8298, "Jane Doe")
            .build();

        unsafe {
            let result = metascrub_analyze_tiff(tiff.as_ptr(), tiff.len());
            assert!(!result.is_null());
            let json: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert_eq!(json["privacy"]["score"], 4);
            assert_eq!(json["privacy"]["level"], "MEDIUM");
            assert_eq!(json["gps"]["status"], "absent");
            metascrub_free_string(result);

            let garbage = b"not a tiff";
            let result = metascrub_analyze_tiff(garbage.as_ptr(), garbage.len());
            let json: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert_eq!(json["has_metadata"], false);
            metascrub_free_string(result);

            assert!(metascrub_analyze_tiff(ptr::null(), 0).is_null());
        }
    }

    #[test]
    fn test_ffi_scan_and_strip() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_sample(dir.path());
        let output = dir.path().join("clean.jpg");

        unsafe {
            let folder = c_path(dir.path());
            let result = metascrub_scan_folder(folder.as_ptr(), false);
            assert!(!result.is_null());
            let json: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert_eq!(json["summary"]["images"], 1);
            metascrub_free_string(result);

            let result = metascrub_strip_file(c_path(&input).as_ptr(), c_path(&output).as_ptr());
            assert!(!result.is_null());
            let json: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert_eq!(json["format"], "jpeg");
            assert_eq!(json["removed_segments"], 1);
            assert_eq!(json["after"]["privacy"]["score"], 0);
            metascrub_free_string(result);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let result = metascrub_analyze_file(ptr::null());
            assert!(result.is_null());
            let error = CStr::from_ptr(metascrub_last_error()).to_str().unwrap();
            assert_eq!(error, "Invalid path pointer");

            let missing = CString::new("/nonexistent/metascrub").unwrap();
            let result = metascrub_scan_folder(missing.as_ptr(), true);
            assert!(result.is_null());
            let error = CStr::from_ptr(metascrub_last_error()).to_str().unwrap();
            assert!(error.starts_with("Not a directory"));
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = CStr::from_ptr(metascrub_version()).to_str().unwrap();
            assert_eq!(version, crate::METASCRUB_VERSION);
        }
    }
}
