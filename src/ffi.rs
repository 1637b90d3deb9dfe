//! FFI interface for C interop
//!
//! Rule sets go in as JSON and results come back as null-terminated strings.
//! Only the builtin processors are available through this interface; filters
//! cannot be named since none are registered.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use crate::extractors::Feedstock;
use crate::render::{AtomRenderer, Render};
use crate::rules::{Registry, RuleSet};

/// Result struct returned to C
/// Both pointers are owned by Rust and must be freed via feedstock_free_result
#[repr(C)]
pub struct FeedstockResultFFI {
    /// Output (null-terminated), or null on failure
    pub data_ptr: *mut c_char,
    /// Error message if the call failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Extract info and entries from HTML according to a JSON rule set.
///
/// On success `data_ptr` holds `{"info": {...}, "entries": [...]}`.
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `rules_json` must be a valid null-terminated C string
/// - Caller must free the result via `feedstock_free_result`
#[no_mangle]
pub unsafe extern "C" fn feedstock_extract(
    html_ptr: *const c_char,
    html_len: usize,
    rules_json: *const c_char,
) -> FeedstockResultFFI {
    let feedstock = match prepare(rules_json) {
        Ok(f) => f,
        Err(msg) => return make_error_result(&msg),
    };
    let html = match read_html(html_ptr, html_len) {
        Ok(h) => h,
        Err(msg) => return make_error_result(msg),
    };

    let feed = feedstock.extract_html(&html);
    match serde_json::to_string(&feed) {
        Ok(json) => make_data_result(json),
        Err(e) => make_error_result(&format!("Failed to serialize feed: {}", e)),
    }
}

/// Same as `feedstock_extract`, but `data_ptr` holds the rendered Atom feed.
///
/// # Safety
/// Same as feedstock_extract
#[no_mangle]
pub unsafe extern "C" fn feedstock_render_atom(
    html_ptr: *const c_char,
    html_len: usize,
    rules_json: *const c_char,
) -> FeedstockResultFFI {
    let feedstock = match prepare(rules_json) {
        Ok(f) => f,
        Err(msg) => return make_error_result(&msg),
    };
    let html = match read_html(html_ptr, html_len) {
        Ok(h) => h,
        Err(msg) => return make_error_result(msg),
    };

    let feed = feedstock.extract_html(&html);
    match AtomRenderer::new().render(&feed) {
        Ok(xml) => make_data_result(xml),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Free a FeedstockResultFFI returned by this module
///
/// # Safety
/// - `result` must have been returned by `feedstock_extract` or `feedstock_render_atom`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn feedstock_free_result(result: FeedstockResultFFI) {
    if !result.data_ptr.is_null() {
        drop(CString::from_raw(result.data_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn prepare(rules_json: *const c_char) -> Result<Feedstock, String> {
    if rules_json.is_null() {
        return Err("Rules JSON is null".to_string());
    }
    let rules_str = CStr::from_ptr(rules_json)
        .to_str()
        .map_err(|_| "Invalid UTF-8 in rules JSON".to_string())?;

    let rules = RuleSet::from_json(rules_str, &Registry::builtin()).map_err(|e| e.to_string())?;
    Ok(Feedstock::new(rules))
}

unsafe fn read_html(html_ptr: *const c_char, html_len: usize) -> Result<String, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok(String::new());
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice)
        .map(str::to_string)
        .map_err(|_| "Invalid UTF-8 in HTML content")
}

fn make_data_result(data: String) -> FeedstockResultFFI {
    match CString::new(data) {
        Ok(cstr) => FeedstockResultFFI {
            data_ptr: cstr.into_raw(),
            error_ptr: ptr::null_mut(),
        },
        Err(_) => make_error_result("Result contains null bytes"),
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> FeedstockResultFFI {
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    FeedstockResultFFI {
        data_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
