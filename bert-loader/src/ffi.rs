//! Raw C ABI of the native BERT library.
//!
//! Every function here is `unsafe` to call: pointers must be valid for the
//! sizes the native side expects and the context must not be used after
//! `bert_free`.

use std::ffi::c_char;

/// Opaque native model context (`bert_ctx`)
#[repr(C)]
pub struct BertContext {
    _private: [u8; 0],
}

pub type BertLoadFromFileFn = unsafe extern "C" fn(fname: *const c_char) -> *mut BertContext;

pub type BertFreeFn = unsafe extern "C" fn(ctx: *mut BertContext);

pub type BertEncodeFn = unsafe extern "C" fn(
    ctx: *mut BertContext,
    n_threads: i32,
    text: *const c_char,
    embeddings: *mut f32,
);

pub type BertEncodeBatchFn = unsafe extern "C" fn(
    ctx: *mut BertContext,
    n_threads: i32,
    n_batch_size: i32,
    n_inputs: i32,
    texts: *const *const c_char,
    embeddings: *mut *mut f32,
);

pub type BertTokenizeFn = unsafe extern "C" fn(
    ctx: *mut BertContext,
    text: *const c_char,
    tokens: *mut i32,
    n_tokens: *mut i32,
    n_max_tokens: i32,
);

pub type BertEvalFn = unsafe extern "C" fn(
    ctx: *mut BertContext,
    n_threads: i32,
    tokens: *mut i32,
    n_tokens: i32,
    embeddings: *mut f32,
);

pub type BertEvalBatchFn = unsafe extern "C" fn(
    ctx: *mut BertContext,
    n_threads: i32,
    n_batch_size: i32,
    batch_tokens: *mut *mut i32,
    n_tokens: *mut i32,
    batch_embeddings: *mut *mut f32,
);

pub type BertNEmbdFn = unsafe extern "C" fn(ctx: *mut BertContext) -> i32;

pub type BertNMaxTokensFn = unsafe extern "C" fn(ctx: *mut BertContext) -> i32;

pub type BertVocabIdToTokenFn =
    unsafe extern "C" fn(ctx: *mut BertContext, id: i32) -> *const c_char;

/// Exported symbol names, in resolution order
pub const SYMBOLS: [&str; 10] = [
    "bert_load_from_file",
    "bert_free",
    "bert_encode",
    "bert_encode_batch",
    "bert_tokenize",
    "bert_eval",
    "bert_eval_batch",
    "bert_n_embd",
    "bert_n_max_tokens",
    "bert_vocab_id_to_token",
];

/// Resolved function table of the native library
#[derive(Clone, Copy)]
pub struct BertApi {
    pub load_from_file: BertLoadFromFileFn,
    pub free: BertFreeFn,
    pub encode: BertEncodeFn,
    pub encode_batch: BertEncodeBatchFn,
    pub tokenize: BertTokenizeFn,
    pub eval: BertEvalFn,
    pub eval_batch: BertEvalBatchFn,
    pub n_embd: BertNEmbdFn,
    pub n_max_tokens: BertNMaxTokensFn,
    pub vocab_id_to_token: BertVocabIdToTokenFn,
}

impl std::fmt::Debug for BertApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertApi")
            .field("symbols", &SYMBOLS.len())
            .finish()
    }
}
