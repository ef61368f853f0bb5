//! Minimal native plugin for exercising the loader.
//!
//! Exports `Entry` and two sets of lifecycle functions. Copied to `libfixture.so` it runs as the
//! `fixture` plugin, whose stages only succeed when called in lifecycle order. Copied to
//! `libfailing.so` it runs as the `failing` plugin, whose `AfterCheck` returns `7`.
//!
//! The file pointer is opaque here: this library does not link abckit.
#![allow(non_snake_case)]

use std::{
    ffi::{c_int, c_void},
    sync::atomic::{AtomicI32, Ordering},
};

/// Last lifecycle stage the `fixture` plugin completed, `0` before `Initialize`.
static STAGE: AtomicI32 = AtomicI32::new(0);

/// Code returned for a stage called out of order.
const OUT_OF_ORDER: c_int = 100;

/// Code returned when the host passes no file.
const NO_FILE: c_int = 101;

fn advance(from: i32, file: *mut c_void) -> c_int {
    if file.is_null() {
        return NO_FILE;
    }
    match STAGE.compare_exchange(from, from + 1, Ordering::SeqCst, Ordering::SeqCst) {
        Ok(_) => 0,
        Err(_) => OUT_OF_ORDER + from,
    }
}

#[no_mangle]
pub extern "C" fn Entry(file: *mut c_void) -> c_int {
    if file.is_null() {
        NO_FILE
    } else {
        0
    }
}

#[no_mangle]
pub extern "C" fn fixture_Initialize() -> c_int {
    STAGE.store(1, Ordering::SeqCst);
    0
}

#[no_mangle]
pub extern "C" fn fixture_AfterParse(file: *mut c_void) -> c_int {
    advance(1, file)
}

#[no_mangle]
pub extern "C" fn fixture_AfterCheck(file: *mut c_void) -> c_int {
    advance(2, file)
}

#[no_mangle]
pub extern "C" fn fixture_AfterLowerings(file: *mut c_void) -> c_int {
    advance(3, file)
}

#[no_mangle]
pub extern "C" fn failing_Initialize() -> c_int {
    0
}

#[no_mangle]
pub extern "C" fn failing_AfterParse(_file: *mut c_void) -> c_int {
    0
}

#[no_mangle]
pub extern "C" fn failing_AfterCheck(_file: *mut c_void) -> c_int {
    7
}

#[no_mangle]
pub extern "C" fn failing_AfterLowerings(_file: *mut c_void) -> c_int {
    0
}
