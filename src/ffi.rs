//! FFI interface for C/C++ hosts
//!
//! Requests and results cross the boundary as JSON strings.

use std::ffi::{c_char, CStr, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::params::Params;
use crate::render::{render, InputTable};

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via free_extraction_result
#[repr(C)]
pub struct ExtractionResultFFI {
    /// JSON-serialized `RenderResult` (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if the request itself was unusable, or null on success
    pub error_ptr: *mut c_char,
}

#[derive(Deserialize)]
struct RenderRequest {
    #[serde(default)]
    input: InputTable,
    /// Raw params, possibly saved by an older version
    #[serde(default)]
    params: Value,
}

/// Run one extraction request.
///
/// # Arguments
/// * `request_json` - `{"input": {"columns": [...]}, "params": {...}}` (null-terminated)
///
/// # Returns
/// ExtractionResultFFI with json_ptr set to the serialized result, or
/// error_ptr set when the request could not be read. Extraction problems
/// (bad selectors and so on) are reported inside the result JSON.
///
/// # Safety
/// - `request_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_extraction_result`
#[no_mangle]
pub unsafe extern "C" fn extract_from_request(request_json: *const c_char) -> ExtractionResultFFI {
    if request_json.is_null() {
        return make_error_result("Request JSON is null");
    }
    let request_str = match CStr::from_ptr(request_json).to_str() {
        Ok(s) => s,
        Err(_) => return make_error_result("Invalid UTF-8 in request JSON"),
    };

    let request: RenderRequest = match serde_json::from_str(request_str) {
        Ok(r) => r,
        Err(e) => return make_error_result(&format!("Failed to parse request JSON: {}", e)),
    };

    let params = match Params::from_json(request.params) {
        Ok(p) => p,
        Err(e) => return make_error_result(&format!("Invalid params: {}", e)),
    };

    // A panic must not unwind into the host
    match catch_unwind(AssertUnwindSafe(|| render(&request.input, &params))) {
        Ok(result) => make_json_result(&result),
        Err(_) => make_error_result("Extraction panicked"),
    }
}

/// Free an ExtractionResultFFI returned by extract_from_request
///
/// # Safety
/// - `result` must have been returned by `extract_from_request`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_extraction_result(result: ExtractionResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

fn make_json_result<T: Serialize>(value: &T) -> ExtractionResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ExtractionResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

fn make_error_result(msg: &str) -> ExtractionResultFFI {
    let error_cstr = CString::new(msg.replace('\0', "")).unwrap_or_default();
    ExtractionResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
