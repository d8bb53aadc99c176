//! C-compatible API for embedding the service in a host application.
//!
//! A host opens one service handle at startup, shares it across request
//! threads and closes it at shutdown. Every string returned by this module is
//! owned by Rust and must be released with `yieldcast_free_str`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::PathBuf;

use tracing::error;

use crate::api::dto::{self, FALLBACK_JSON};
use crate::common::{log, AppCfg};
use crate::contract::CROP_YIELD;
use crate::inference::InferenceService;

/// ABI version to coordinate with the host layer.
#[no_mangle]
pub extern "C" fn yieldcast_api_version() -> u32 {
    1
}

/// Load configuration and the model artifact once, returning a service handle.
///
/// A null `model_path` uses the configured path. A missing or invalid
/// artifact still yields a handle whose predictions report `ModelNotLoaded`;
/// null is returned only when configuration itself is unreadable.
#[no_mangle]
pub extern "C" fn yieldcast_open(model_path: *const c_char) -> *mut InferenceService {
    let mut cfg = match AppCfg::load() {
        Ok(cfg) => cfg,
        Err(err) => {
            log::init(&AppCfg::default().log_filter, false);
            error!(ev = "config_load", error = %format!("{err:#}"), "configuration rejected");
            return std::ptr::null_mut();
        }
    };
    log::init_from(&cfg);

    if !model_path.is_null() {
        let path = unsafe { CStr::from_ptr(model_path) }
            .to_string_lossy()
            .to_string();
        cfg.model_path = PathBuf::from(path);
    }

    Box::into_raw(Box::new(InferenceService::from_config(&cfg)))
}

/// Run one prediction from a JSON object of fields. Returns the JSON envelope.
#[no_mangle]
pub extern "C" fn yieldcast_predict(
    service: *const InferenceService,
    input: *const c_char,
) -> *const c_char {
    if service.is_null() || input.is_null() {
        return fallback_json_raw();
    }

    let service = unsafe { &*service };
    let input = unsafe { CStr::from_ptr(input) }.to_string_lossy();
    string_to_raw(dto::handle_json(service, &input))
}

/// Describe the contract's fields for form generation.
#[no_mangle]
pub extern "C" fn yieldcast_contract() -> *const c_char {
    string_to_raw(dto::contract_json(&CROP_YIELD))
}

/// Free strings allocated by Rust.
#[no_mangle]
pub extern "C" fn yieldcast_free_str(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        let _ = CString::from_raw(ptr as *mut c_char);
    }
}

/// Release a handle returned by `yieldcast_open`.
#[no_mangle]
pub extern "C" fn yieldcast_close(service: *mut InferenceService) {
    if service.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(service));
    }
}

fn string_to_raw(s: String) -> *const c_char {
    match CString::new(s) {
        Ok(cstring) => cstring.into_raw(),
        Err(_) => fallback_json_raw(),
    }
}

fn fallback_json_raw() -> *const c_char {
    CString::new(FALLBACK_JSON).unwrap_or_default().into_raw()
}
