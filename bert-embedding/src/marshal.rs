//! Conversions between Rust values and the shapes the C API expects.

use crate::error::{EmbeddingError, EmbeddingResult as Result};
use std::ffi::CString;

/// NUL-terminated copy of `text`
pub fn to_c_string(text: &str) -> Result<CString> {
    CString::new(text).map_err(|e| {
        EmbeddingError::text_encoding(format!(
            "text contains a NUL byte at position {}",
            e.nul_position()
        ))
    })
}

/// NUL-terminated copies of every text; the error names the first bad index
pub fn to_c_strings<S: AsRef<str>>(texts: &[S]) -> Result<Vec<CString>> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            CString::new(text.as_ref()).map_err(|e| {
                EmbeddingError::text_encoding(format!(
                    "input {} contains a NUL byte at position {}",
                    i,
                    e.nul_position()
                ))
            })
        })
        .collect()
}

/// Convert a count to a C `int32`
pub fn to_c_int(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| {
        EmbeddingError::configuration(format!("{} ({}) does not fit in a C int", what, value))
    })
}

/// Permutation of indices ordering `lengths` longest first. Ties keep input order.
pub fn length_descending_order(lengths: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..lengths.len()).collect();
    order.sort_by(|&a, &b| lengths[b].cmp(&lengths[a]));
    order
}

/// Undo [`length_descending_order`]: `values[k]` belongs to input `order[k]`
pub fn restore_order<T>(values: Vec<T>, order: &[usize]) -> Vec<T> {
    debug_assert_eq!(values.len(), order.len());
    let mut slots: Vec<Option<T>> = (0..values.len()).map(|_| None).collect();
    for (value, &original) in values.into_iter().zip(order) {
        slots[original] = Some(value);
    }
    slots.into_iter().flatten().collect()
}
