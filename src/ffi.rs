//! FFI bindings for the LearnSmart engine
//!
//! This module provides C-compatible functions for calling the engine from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `learnsmart_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::EngineConfig;
use crate::error::ComputeError;
use crate::pipeline::{analyze_daily_json, StudyProcessor};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Like `cstr_to_string`, recording an error naming the argument on failure
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {} string pointer", name));
    }
    value
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Return a result as a C string, or NULL with the error recorded
fn result_to_cstr(result: Result<String, ComputeError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Helper to convert a Vec<String> to a JSON array string
fn vec_to_json_array(vec: Vec<String>) -> String {
    // Each string is already valid JSON, so we join them as array elements
    format!("[{}]", vec.join(","))
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze one submission JSON and return the analysis JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `learnsmart_free_string`.
/// - Returns NULL on error; call `learnsmart_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn learnsmart_analyze_daily(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = required_arg(json, "JSON") else {
        return ptr::null_mut();
    };

    result_to_cstr(analyze_daily_json(json_str))
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a StudyProcessor
pub struct StudyProcessorHandle {
    processor: StudyProcessor,
}

/// Create a new StudyProcessor.
///
/// # Safety
/// - `config_toml` must be NULL (defaults) or a valid null-terminated C string
///   holding TOML engine configuration.
/// - Returns a pointer to a newly allocated StudyProcessor.
/// - Must be freed with `learnsmart_processor_free`.
/// - Returns NULL on error; call `learnsmart_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn learnsmart_processor_new(
    config_toml: *const c_char,
) -> *mut StudyProcessorHandle {
    clear_last_error();

    let config = if config_toml.is_null() {
        EngineConfig::default()
    } else {
        let Some(toml_str) = required_arg(config_toml, "config") else {
            return ptr::null_mut();
        };
        match EngineConfig::from_toml_str(&toml_str) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let processor = StudyProcessor::with_config(&config);
    Box::into_raw(Box::new(StudyProcessorHandle { processor }))
}

/// Free a StudyProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `learnsmart_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn learnsmart_processor_free(processor: *mut StudyProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Process one keyed submission and return the report JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `learnsmart_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `learnsmart_free_string`.
/// - Returns NULL on error; call `learnsmart_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn learnsmart_processor_process(
    processor: *mut StudyProcessorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &mut *processor;

    let Some(json_str) = required_arg(json, "JSON") else {
        return ptr::null_mut();
    };

    result_to_cstr(handle.processor.process(&json_str))
}

/// Process NDJSON submissions and return a JSON array of reports.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `learnsmart_processor_new`.
/// - `ndjson` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `learnsmart_free_string`.
/// - Returns NULL on error; call `learnsmart_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn learnsmart_processor_process_ndjson(
    processor: *mut StudyProcessorHandle,
    ndjson: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &mut *processor;

    let Some(ndjson_str) = required_arg(ndjson, "NDJSON") else {
        return ptr::null_mut();
    };

    result_to_cstr(handle.processor.process_ndjson(&ndjson_str).map(vec_to_json_array))
}

/// Weekly study hours series for a user as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `learnsmart_processor_new`.
/// - `user_id` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `learnsmart_free_string`.
/// - Returns NULL on error; call `learnsmart_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn learnsmart_processor_weekly_study_hours(
    processor: *mut StudyProcessorHandle,
    user_id: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    let Some(user) = required_arg(user_id, "user_id") else {
        return ptr::null_mut();
    };

    result_to_cstr(
        handle
            .processor
            .weekly_study_hours(&user)
            .and_then(|series| serde_json::to_string(&series).map_err(ComputeError::JsonError)),
    )
}

/// Sleep vs productivity series for a user as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `learnsmart_processor_new`.
/// - `user_id` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `learnsmart_free_string`.
/// - Returns NULL on error; call `learnsmart_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn learnsmart_processor_sleep_vs_productivity(
    processor: *mut StudyProcessorHandle,
    user_id: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    let Some(user) = required_arg(user_id, "user_id") else {
        return ptr::null_mut();
    };

    result_to_cstr(
        handle
            .processor
            .sleep_vs_productivity(&user)
            .and_then(|series| serde_json::to_string(&series).map_err(ComputeError::JsonError)),
    )
}

/// Save processor history to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `learnsmart_processor_new`.
/// - Returns a newly allocated string that must be freed with `learnsmart_free_string`.
/// - Returns NULL on error; call `learnsmart_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn learnsmart_processor_save_history(
    processor: *mut StudyProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;
    result_to_cstr(handle.processor.save_history())
}

/// Load processor history from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `learnsmart_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `learnsmart_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn learnsmart_processor_load_history(
    processor: *mut StudyProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let Some(json_str) = required_arg(json, "JSON") else {
        return -1;
    };

    match handle.processor.load_history(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by LearnSmart functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a LearnSmart function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn learnsmart_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next LearnSmart function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn learnsmart_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn learnsmart_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::RecordStore;

    fn sample_submission(date: &str) -> CString {
        CString::new(format!(
            r#"{{"user_id": "s1", "study_date": "{date}", "study_hours": 6, "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "High"}}"#
        ))
        .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        learnsmart_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_analyze_daily() {
        unsafe {
            let json = CString::new(
                r#"{"study_hours": 6, "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "Medium"}"#,
            )
            .unwrap();
            let output = take_string(learnsmart_analyze_daily(json.as_ptr()));
            let value: serde_json::Value = serde_json::from_str(&output).unwrap();
            assert_eq!(value["score"]["total_score"], 96.7);
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let processor = learnsmart_processor_new(ptr::null());
            assert!(!processor.is_null());

            let json = sample_submission("2024-03-01");
            take_string(learnsmart_processor_process(processor, json.as_ptr()));

            let ndjson = CString::new(format!(
                "{}\n{}",
                sample_submission("2024-03-02").to_str().unwrap(),
                sample_submission("2024-03-03").to_str().unwrap()
            ))
            .unwrap();
            let reports =
                take_string(learnsmart_processor_process_ndjson(processor, ndjson.as_ptr()));
            let reports: serde_json::Value = serde_json::from_str(&reports).unwrap();
            assert_eq!(reports.as_array().map(Vec::len), Some(2));

            let user = CString::new("s1").unwrap();
            let weekly =
                take_string(learnsmart_processor_weekly_study_hours(processor, user.as_ptr()));
            let weekly: serde_json::Value = serde_json::from_str(&weekly).unwrap();
            assert_eq!(weekly["study_hours"].as_array().map(Vec::len), Some(3));

            let sleep = take_string(learnsmart_processor_sleep_vs_productivity(
                processor,
                user.as_ptr(),
            ));
            assert!(sleep.contains("productivity_scores"));

            let history = learnsmart_processor_save_history(processor);
            assert!(!history.is_null());

            let processor2 = learnsmart_processor_new(ptr::null());
            assert_eq!(learnsmart_processor_load_history(processor2, history), 0);
            assert_eq!((*processor2).processor.store().len(), 3);

            learnsmart_free_string(history);
            learnsmart_processor_free(processor);
            learnsmart_processor_free(processor2);
        }
    }

    #[test]
    fn test_ffi_processor_with_config() {
        unsafe {
            let config = CString::new("[suggestions]\nmax_suggestions = 2").unwrap();
            let processor = learnsmart_processor_new(config.as_ptr());
            assert!(!processor.is_null());
            learnsmart_processor_free(processor);

            let bad = CString::new("[suggestions]\nmax_suggestions = 0").unwrap();
            let processor = learnsmart_processor_new(bad.as_ptr());
            assert!(processor.is_null());
            assert!(!learnsmart_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            let result = learnsmart_analyze_daily(invalid_json.as_ptr());
            assert!(result.is_null());

            let error = learnsmart_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());

            assert!(learnsmart_analyze_daily(ptr::null()).is_null());
            assert!(learnsmart_processor_process(ptr::null_mut(), invalid_json.as_ptr()).is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = learnsmart_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
