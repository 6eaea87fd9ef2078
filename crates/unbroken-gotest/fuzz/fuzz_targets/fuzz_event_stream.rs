// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for the event parser and metric deriver
//!
//! Arbitrary bytes go through `parse_events`; whatever parses is fed to the
//! deriver and encoded. None of it should panic.

#![no_main]

use libfuzzer_sys::fuzz_target;

use unbroken_gotest::{Diagnostic, MetricDeriver, encode_batch, parse_events};

fuzz_target!(|data: &[u8]| {
    if let Ok(events) = parse_events(data) {
        let metrics = MetricDeriver::new(Vec::<Diagnostic>::new()).derive_all(&events);
        let _ = encode_batch(&metrics);
    }
});
