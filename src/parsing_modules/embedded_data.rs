//! Embedded product data extraction.
//!
//! Catalog pages rendered by a JS framework ship the product list twice: once
//! as markup and once as the hydration state the components were built from.
//! That state is inlined into a `<script>` body, so it is found by scanning
//! the raw page text rather than the DOM.
//!
//! # Lookup order
//!
//! 1. A `"products": [ ... ]` array. The whole array is decoded; if that
//!    fails, or the array is cut off, each top-level element is decoded on
//!    its own.
//! 2. If step 1 produced nothing, every `"product": { ... }` object.
//!
//! Extents are found with a string-aware bracket scan, so a closing bracket
//! inside a quoted title does not end the fragment early. A fragment that
//! fails to decode is counted and skipped; it never aborts the scan.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::json_utils::{is_truthy, lookup, safe_deserialize};

lazy_static! {
    static ref PRODUCTS_ARRAY: Regex =
        Regex::new(r#""products"\s*:\s*\["#).expect("valid products pattern");
    static ref PRODUCT_OBJECT: Regex =
        Regex::new(r#""product"\s*:\s*\{"#).expect("valid product pattern");
}

/// Raw product objects recovered from one page, before normalization.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedScan {
    /// Objects with a usable `offer.price`
    pub objects: Vec<Value>,
    /// Fragments that could not be decoded
    pub fragment_failures: usize,
    /// Decoded objects dropped for lacking a price
    pub unpriced: usize,
}

impl EmbeddedScan {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Scan raw page text for embedded product objects.
pub fn scan(html: &str) -> EmbeddedScan {
    let mut result = EmbeddedScan::default();

    let mut found = scan_products_arrays(html, &mut result.fragment_failures);
    if found.is_empty() {
        found = scan_product_objects(html, &mut result.fragment_failures);
    }

    let before = found.len();
    result.objects = found.into_iter().filter(has_usable_price).collect();
    result.unpriced = before - result.objects.len();

    debug!(
        objects = result.objects.len(),
        fragment_failures = result.fragment_failures,
        unpriced = result.unpriced,
        "embedded data scan finished"
    );
    result
}

/// Whether `offer.price` carries a value.
pub fn has_usable_price(object: &Value) -> bool {
    lookup(object, &["offer", "price"])
        .map(is_truthy)
        .unwrap_or(false)
}

fn scan_products_arrays(html: &str, failures: &mut usize) -> Vec<Value> {
    for m in PRODUCTS_ARRAY.find_iter(html) {
        let open = m.end() - 1;
        let objects: Vec<Value> = match balanced_end(html, open) {
            Some(end) => {
                let fragment = &html[open..end];
                match safe_deserialize::<Vec<Value>>(fragment) {
                    Ok(items) => items.into_iter().filter(Value::is_object).collect(),
                    Err(e) => {
                        debug!(offset = open, error = %e, "products array failed to decode, decoding elements one by one");
                        decode_elements(fragment, failures)
                    }
                }
            }
            None => {
                debug!(offset = open, "products array is not terminated, salvaging complete elements");
                let before = *failures;
                let salvaged = decode_elements(&html[open..], failures);
                // A cut between elements leaves no broken element behind.
                if *failures == before {
                    *failures += 1;
                }
                salvaged
            }
        };

        if !objects.is_empty() {
            return objects;
        }
    }
    Vec::new()
}

/// Decode each top-level object of an array fragment independently.
fn decode_elements(array: &str, failures: &mut usize) -> Vec<Value> {
    let mut objects = Vec::new();
    for element in top_level_objects(array) {
        match safe_deserialize::<Value>(element) {
            Ok(value) if value.is_object() => objects.push(value),
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "skipping malformed array element");
                *failures += 1;
            }
        }
    }
    objects
}

fn scan_product_objects(html: &str, failures: &mut usize) -> Vec<Value> {
    let mut objects = Vec::new();
    let mut pos = 0;

    while let Some(m) = PRODUCT_OBJECT.find_at(html, pos) {
        let open = m.end() - 1;
        match balanced_end(html, open) {
            Some(end) => match safe_deserialize::<Value>(&html[open..end]) {
                Ok(value) if value.is_object() => {
                    objects.push(value);
                    // Nested "product" keys belong to this object.
                    pos = end;
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(offset = open, error = %e, "skipping malformed product object");
                    *failures += 1;
                }
            },
            None => {
                debug!(offset = open, "product object is not terminated");
                *failures += 1;
            }
        }
        pos = m.end();
    }

    objects
}

/// Byte index one past the bracket that closes the one at `open`.
///
/// Square and curly brackets share one depth counter; brackets inside
/// string literals are ignored. Returns `None` if the text ends first.
pub fn balanced_end(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    match bytes.get(open) {
        Some(b'[') | Some(b'{') => {}
        _ => return None,
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => depth += 1,
            b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Slices of every `{...}` directly inside an array fragment `[...]`.
///
/// An element whose braces never close is returned as the remaining text so
/// that the caller counts it as a failure.
fn top_level_objects(array: &str) -> Vec<&str> {
    let bytes = array.as_bytes();
    let mut elements = Vec::new();
    let mut i = 1; // past the opening '['
    let mut in_string = false;
    let mut escaped = false;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => match balanced_end(array, i) {
                Some(end) => {
                    elements.push(&array[i..end]);
                    i = end;
                    continue;
                }
                None => {
                    elements.push(&array[i..]);
                    break;
                }
            },
            _ => {}
        }
        i += 1;
    }
    elements
}
