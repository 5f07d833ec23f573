//! C ABI for linking geogate-core as a static library from Android (NDK) or iOS hosts.
//! The native shell owns permission prompts, the location fix and the HTTP call; it feeds
//! results in here and reads back the query string and target URL.

use std::ffi::c_void;
use std::os::raw::c_int;
use std::slice;

use crate::country::CountryCode;
use crate::decision::parse_decision;
use crate::{Action, Event, RedirectCore};

/// Create a core with default appcode and panel. Returns opaque handle.
#[no_mangle]
pub extern "C" fn geogate_core_create() -> *mut c_void {
    Box::into_raw(Box::new(RedirectCore::new())) as *mut c_void
}

/// Create a core with host-provided appcode and panel (UTF-8, not NUL-terminated).
/// Returns null if either string is null or not UTF-8.
#[no_mangle]
pub extern "C" fn geogate_core_create_with(
    appcode: *const u8,
    appcode_len: usize,
    panel: *const u8,
    panel_len: usize,
) -> *mut c_void {
    let (Some(appcode), Some(panel)) = (read_str(appcode, appcode_len), read_str(panel, panel_len))
    else {
        return std::ptr::null_mut();
    };
    Box::into_raw(Box::new(RedirectCore::with_payload_constants(appcode, panel))) as *mut c_void
}

/// Destroy core instance. No-op if h is null.
#[no_mangle]
pub extern "C" fn geogate_core_destroy(h: *mut c_void) {
    if h.is_null() {
        return;
    }
    let _ = unsafe { Box::from_raw(h as *mut RedirectCore) };
}

/// Start the pipeline. Returns 1 if the host should resolve the country now, 0 if already started, -1 if h null.
#[no_mangle]
pub extern "C" fn geogate_core_start(h: *mut c_void) -> c_int {
    let Some(core) = core_mut(h) else {
        return -1;
    };
    match core.handle(Event::Start) {
        Some(Action::ResolveCountry) => 1,
        _ => 0,
    }
}

/// Report the resolved country (2 ASCII letters). Returns 1 if the host should now send the
/// lookup request (see geogate_core_query_string), 0 if not, -1 on bad input.
#[no_mangle]
pub extern "C" fn geogate_core_country_resolved(h: *mut c_void, code: *const u8, code_len: usize) -> c_int {
    let Some(core) = core_mut(h) else {
        return -1;
    };
    let Some(country) = read_str(code, code_len).and_then(|s| s.parse::<CountryCode>().ok())
    else {
        return -1;
    };
    match core.handle(Event::CountryResolved(country)) {
        Some(Action::FetchDecision(_)) => 1,
        _ => 0,
    }
}

/// Copy the lookup query string (`?m_country=..`) into out_buf. The host POSTs to endpoint + query.
/// Returns bytes written, 0 if no country is resolved yet, -1 on error or a too-small buffer.
#[no_mangle]
pub extern "C" fn geogate_core_query_string(h: *mut c_void, out_buf: *mut u8, out_buf_len: usize) -> c_int {
    let Some(core) = core_mut(h) else {
        return -1;
    };
    match core.pending_payload() {
        Some(payload) => write_bytes(payload.query_string().as_bytes(), out_buf, out_buf_len),
        None => 0,
    }
}

/// Report that no country could be resolved. The pipeline stays stalled. Returns 0, -1 if h null.
#[no_mangle]
pub extern "C" fn geogate_core_country_unresolved(h: *mut c_void) -> c_int {
    let Some(core) = core_mut(h) else {
        return -1;
    };
    core.handle(Event::CountryUnresolved);
    0
}

/// Report that the lookup request has been sent. Returns 0, -1 if h null.
#[no_mangle]
pub extern "C" fn geogate_core_fetch_started(h: *mut c_void) -> c_int {
    let Some(core) = core_mut(h) else {
        return -1;
    };
    core.handle(Event::FetchStarted);
    0
}

/// Feed the raw response body. Returns 1 if target URL changed, 0 if not (including malformed bodies), -1 if h null.
#[no_mangle]
pub extern "C" fn geogate_core_decision_body(h: *mut c_void, body: *const u8, body_len: usize) -> c_int {
    let Some(core) = core_mut(h) else {
        return -1;
    };
    let event = if body.is_null() {
        Event::DecisionFailed
    } else {
        let bytes = unsafe { slice::from_raw_parts(body, body_len) };
        match parse_decision(bytes) {
            Ok(decision) => Event::DecisionReceived(decision),
            Err(_) => Event::DecisionFailed,
        }
    };
    match core.handle(event) {
        Some(Action::Navigate(_)) => 1,
        _ => 0,
    }
}

/// Report a failed request (network error). Returns 0, -1 if h null.
#[no_mangle]
pub extern "C" fn geogate_core_decision_failed(h: *mut c_void) -> c_int {
    let Some(core) = core_mut(h) else {
        return -1;
    };
    core.handle(Event::DecisionFailed);
    0
}

/// Display signals the warm-up surface finished loading. Returns 0, -1 if h null.
#[no_mangle]
pub extern "C" fn geogate_core_warmup_loaded(h: *mut c_void) -> c_int {
    let Some(core) = core_mut(h) else {
        return -1;
    };
    core.handle(Event::WarmupLoaded);
    0
}

/// Copy the current target URL into out_buf. Returns bytes written (0 when empty), -1 on error.
#[no_mangle]
pub extern "C" fn geogate_core_target_url(h: *mut c_void, out_buf: *mut u8, out_buf_len: usize) -> c_int {
    let Some(core) = core_mut(h) else {
        return -1;
    };
    write_bytes(core.navigation().target_url.as_bytes(), out_buf, out_buf_len)
}

/// Current phase: 0 idle, 1 resolving, 2 country resolved, 3 fetching, 4 decided. -1 if h null.
#[no_mangle]
pub extern "C" fn geogate_core_phase(h: *mut c_void) -> c_int {
    match core_mut(h) {
        Some(core) => core.phase().as_u8() as c_int,
        None => -1,
    }
}

fn core_mut<'a>(h: *mut c_void) -> Option<&'a mut RedirectCore> {
    if h.is_null() {
        return None;
    }
    Some(unsafe { &mut *(h as *mut RedirectCore) })
}

fn read_str<'a>(ptr: *const u8, len: usize) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    let bytes = unsafe { slice::from_raw_parts(ptr, len) };
    std::str::from_utf8(bytes).ok()
}

fn write_bytes(bytes: &[u8], out_buf: *mut u8, out_buf_len: usize) -> c_int {
    if bytes.is_empty() {
        return 0;
    }
    if out_buf.is_null() || out_buf_len < bytes.len() {
        return -1;
    }
    unsafe {
        out_buf.copy_from_nonoverlapping(bytes.as_ptr(), bytes.len());
    }
    bytes.len() as c_int
}
