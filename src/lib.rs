//! RustyDTD - DTD parsing and content-model completion for editors
//!
//! A DTD is parsed once (optionally through the shared cache) and handed to
//! Elixir as a reference. Queries against it answer:
//! - which elements, attributes, values and character references exist
//! - which child elements may come next inside an element

use std::sync::Arc;

use rustler::{Binary, Encoder, Env, NifResult, ResourceArc, Term};

pub mod cache;
pub mod config;
pub mod content;
pub mod core;
pub mod dtd;
pub mod resource;
pub mod strategy;
mod term;

use cache::{fingerprint, DtdCache};
use config::{CatalogEntry, DtdMode, ParseOptions};
use crate::core::encoding::decode_source;
use crate::core::error::Result as DtdResult;
use dtd::{CatalogProvider, Dtd};
use resource::{DtdRef, DtdResource};
use term::{
    attribute_to_term, char_ref_to_term, completion_result_to_term, completion_to_term,
    dtd_summary_to_term, element_to_term, error_to_term, ok, str_to_binary, strings_to_term,
};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                let current = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                let mut peak = PEAK_ALLOCATED.load(Ordering::Relaxed);
                while current > peak {
                    match PEAK_ALLOCATED.compare_exchange_weak(
                        peak,
                        current,
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => break,
                        Err(p) => peak = p,
                    }
                }
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Memory Tracking NIFs
// ============================================================================

#[cfg(feature = "memory_tracking")]
use std::sync::atomic::Ordering;

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn get_rust_memory() -> usize {
    tracking::ALLOCATED.load(Ordering::SeqCst)
}

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    tracking::PEAK_ALLOCATED.load(Ordering::SeqCst)
}

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    let current = tracking::ALLOCATED.load(Ordering::SeqCst);
    let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
    (current, peak)
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn get_rust_memory() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    (0, 0)
}

// ============================================================================
// Parsing
// ============================================================================

fn parse_bytes(
    source: &[u8],
    identifier: &str,
    options: &ParseOptions,
    catalog: &[CatalogEntry],
) -> DtdResult<Dtd> {
    let text = decode_source(source)?;
    let provider = CatalogProvider::from_entries(catalog);
    dtd::parse_source(&provider, identifier, &text, options)
}

fn dtd_result_to_term<'a>(env: Env<'a>, result: DtdResult<Arc<Dtd>>) -> Term<'a> {
    match result {
        Ok(dtd) => (ok(), ResourceArc::new(DtdResource::new(dtd))).encode(env),
        Err(e) => error_to_term(env, &e),
    }
}

/// Parse DTD text; external parameter entities resolve against `catalog`
#[rustler::nif(schedule = "DirtyCpu")]
fn parse_dtd<'a>(
    env: Env<'a>,
    source: Binary<'a>,
    identifier: &str,
    options: ParseOptions,
    catalog: Vec<CatalogEntry>,
) -> Term<'a> {
    let result = parse_bytes(source.as_slice(), identifier, &options, &catalog).map(Arc::new);
    dtd_result_to_term(env, result)
}

/// Like parse_dtd, but reuses an earlier parse of the same inputs
#[rustler::nif(schedule = "DirtyCpu")]
fn parse_dtd_cached<'a>(
    env: Env<'a>,
    source: Binary<'a>,
    identifier: &str,
    options: ParseOptions,
    catalog: Vec<CatalogEntry>,
) -> Term<'a> {
    let bytes = source.as_slice();
    let key = fingerprint(bytes, &options, &catalog);
    let result = DtdCache::global().get_or_parse(identifier, key, || {
        parse_bytes(bytes, identifier, &options, &catalog)
    });
    dtd_result_to_term(env, result)
}

#[rustler::nif]
fn cache_clear() -> usize {
    let cache = DtdCache::global();
    let size = cache.len();
    cache.clear();
    size
}

#[rustler::nif]
fn cache_size() -> usize {
    DtdCache::global().len()
}

// ============================================================================
// DTD Queries
// ============================================================================

#[rustler::nif]
fn dtd_info<'a>(env: Env<'a>, dtd_ref: DtdRef) -> NifResult<Term<'a>> {
    dtd_summary_to_term(env, dtd_ref.dtd())
}

/// Element names starting with prefix
#[rustler::nif]
fn element_names<'a>(env: Env<'a>, dtd_ref: DtdRef, prefix: &str) -> Term<'a> {
    let elements = dtd_ref.dtd().element_list(prefix);
    strings_to_term(env, elements.iter().map(|e| e.name()))
}

#[rustler::nif]
fn element_info<'a>(env: Env<'a>, dtd_ref: DtdRef, name: &str) -> NifResult<Term<'a>> {
    match dtd_ref.dtd().element(name) {
        Some(element) => element_to_term(env, element),
        None => Ok(rustler::types::atom::nil().encode(env)),
    }
}

/// Attribute maps of an element, required ones first; nil for an unknown element
#[rustler::nif]
fn attributes<'a>(env: Env<'a>, dtd_ref: DtdRef, element: &str, prefix: &str) -> NifResult<Term<'a>> {
    let Some(element) = dtd_ref.dtd().element(element) else {
        return Ok(rustler::types::atom::nil().encode(env));
    };
    let mut list = Term::list_new_empty(env);
    for attribute in element.attribute_list(prefix).into_iter().rev() {
        list = list.list_prepend(attribute_to_term(env, attribute)?);
    }
    Ok(list)
}

/// Allowed values of an enumerated attribute; nil otherwise
#[rustler::nif]
fn attribute_values<'a>(
    env: Env<'a>,
    dtd_ref: DtdRef,
    element: &str,
    attribute: &str,
    prefix: &str,
) -> Term<'a> {
    let values = dtd_ref
        .dtd()
        .element(element)
        .and_then(|e| e.attribute(attribute))
        .and_then(|a| a.value_list(prefix));
    match values {
        Some(values) => strings_to_term(env, values),
        None => rustler::types::atom::nil().encode(env),
    }
}

#[rustler::nif]
fn char_refs<'a>(env: Env<'a>, dtd_ref: DtdRef, prefix: &str) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for char_ref in dtd_ref.dtd().char_ref_list(prefix).into_iter().rev() {
        list = list.list_prepend(char_ref_to_term(env, char_ref));
    }
    list
}

#[rustler::nif]
fn char_ref<'a>(env: Env<'a>, dtd_ref: DtdRef, name: &str) -> Term<'a> {
    match dtd_ref.dtd().char_ref(name) {
        Some(char_ref) => char_ref_to_term(env, char_ref),
        None => rustler::types::atom::nil().encode(env),
    }
}

// ============================================================================
// Content Completion
// ============================================================================

/// Children allowed after `consumed` inside the innermost element of `path`
#[rustler::nif]
fn possible_children<'a>(
    env: Env<'a>,
    dtd_ref: DtdRef,
    path: Vec<String>,
    consumed: Vec<String>,
) -> Term<'a> {
    let result = content::complete_element(dtd_ref.dtd(), &path, &consumed);
    completion_result_to_term(env, &result)
}

/// Many completion queries against one DTD, evaluated in parallel
#[rustler::nif(schedule = "DirtyCpu")]
fn possible_children_batch<'a>(
    env: Env<'a>,
    dtd_ref: DtdRef,
    queries: Vec<(Vec<String>, Vec<String>)>,
) -> Term<'a> {
    let results = strategy::complete_parallel(dtd_ref.dtd(), &queries);

    let mut list = Term::list_new_empty(env);
    for result in results.iter().rev() {
        list = list.list_prepend(completion_result_to_term(env, result));
    }
    list
}

/// Completion for each prefix of `children`: the answers while typing them in order
#[rustler::nif(schedule = "DirtyCpu")]
fn completion_trail<'a>(
    env: Env<'a>,
    dtd_ref: DtdRef,
    path: Vec<String>,
    children: Vec<String>,
) -> Term<'a> {
    match strategy::parallel::completion_trail(dtd_ref.dtd(), &path, &children) {
        Ok(trail) => {
            let mut list = Term::list_new_empty(env);
            for completion in trail.iter().rev() {
                list = list.list_prepend(completion_to_term(env, completion));
            }
            (ok(), list).encode(env)
        }
        Err(e) => error_to_term(env, &e),
    }
}

/// Completion over a standalone content model expression
#[rustler::nif]
fn content_model_next<'a>(
    env: Env<'a>,
    expression: &str,
    consumed: Vec<String>,
    xml: bool,
) -> Term<'a> {
    let mode = if xml { DtdMode::Xml } else { DtdMode::Sgml };
    match content::parse_content_model(expression, mode) {
        Ok(model) => completion_to_term(env, &content::complete(&model, mode, &consumed)),
        Err(e) => error_to_term(env, &e),
    }
}

/// Canonical rendering of a content model expression
#[rustler::nif]
fn content_model_format<'a>(env: Env<'a>, expression: &str, xml: bool) -> Term<'a> {
    let mode = if xml { DtdMode::Xml } else { DtdMode::Sgml };
    match content::parse_content_model(expression, mode) {
        Ok(model) => (ok(), str_to_binary(env, &model.to_string())).encode(env),
        Err(e) => error_to_term(env, &e),
    }
}

// ============================================================================
// NIF Initialization
// ============================================================================

// DtdResource is registered by `#[rustler::resource_impl]`
fn load(_env: Env, _info: Term) -> bool {
    tracing::debug!("RustyDTD NIF loaded");
    true
}

rustler::init!("Elixir.RustyDTD.Native", load = load);
