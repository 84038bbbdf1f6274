//! In-process stand-in for the native BERT library.
//!
//! The functions follow the C ABI of `libbert` but compute trivially
//! checkable outputs, so tests can verify what crossed the boundary:
//!
//! - `bert_encode`: `[word count, byte length, n_threads, 1.0]`
//! - `bert_eval`: `[n_tokens, sum of ids, n_threads, 1.0]`
//! - `bert_eval_batch`: like `bert_eval`, with slot 3 set to `1.0` only when
//!   the batch arrived sorted longest first
//! - `bert_tokenize`: `[CLS]`, one id per whitespace-separated word, `[SEP]`

#![allow(dead_code)]

use bert_embedding::{BertModel, EmbeddingConfig};
use bert_loader::{BertApi, BertContext, BertLibrary};
use std::collections::HashMap;
use std::ffi::{c_char, CStr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tempfile::TempDir;

pub const FAKE_DIM: usize = 4;
pub const FAKE_MAX_TOKENS: usize = 8;

pub const CLS: i32 = 101;
pub const SEP: i32 = 102;
pub const UNK: i32 = 100;
pub const HELLO: i32 = 7592;
pub const WORLD: i32 = 2088;

struct FakeContext {
    path: String,
}

fn live_contexts() -> &'static Mutex<HashMap<String, usize>> {
    static LIVE: OnceLock<Mutex<HashMap<String, usize>>> = OnceLock::new();
    LIVE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Number of contexts opened from `path` that have not been freed
pub fn live_count(path: &Path) -> usize {
    let key = path.to_string_lossy().to_string();
    live_contexts()
        .lock()
        .unwrap()
        .get(&key)
        .copied()
        .unwrap_or(0)
}

fn word_id(word: &str) -> i32 {
    match word.to_lowercase().trim_matches(|c: char| !c.is_alphanumeric()) {
        "hello" => HELLO,
        "world" => WORLD,
        _ => UNK,
    }
}

unsafe fn write_outputs(out: *mut f32, values: [f32; FAKE_DIM]) {
    let slice = std::slice::from_raw_parts_mut(out, FAKE_DIM);
    slice.copy_from_slice(&values);
}

unsafe extern "C" fn fake_load_from_file(fname: *const c_char) -> *mut BertContext {
    let path = CStr::from_ptr(fname).to_string_lossy().to_string();
    if path.contains("corrupt") {
        return std::ptr::null_mut();
    }
    *live_contexts().lock().unwrap().entry(path.clone()).or_insert(0) += 1;
    Box::into_raw(Box::new(FakeContext { path })) as *mut BertContext
}

unsafe extern "C" fn fake_free(ctx: *mut BertContext) {
    let ctx = Box::from_raw(ctx as *mut FakeContext);
    if let Some(count) = live_contexts().lock().unwrap().get_mut(&ctx.path) {
        *count -= 1;
    }
}

unsafe extern "C" fn fake_encode(
    _ctx: *mut BertContext,
    n_threads: i32,
    text: *const c_char,
    embeddings: *mut f32,
) {
    let text = CStr::from_ptr(text).to_string_lossy();
    let words = text.split_whitespace().count();
    write_outputs(
        embeddings,
        [words as f32, text.len() as f32, n_threads as f32, 1.0],
    );
}

unsafe extern "C" fn fake_encode_batch(
    ctx: *mut BertContext,
    n_threads: i32,
    _n_batch_size: i32,
    n_inputs: i32,
    texts: *const *const c_char,
    embeddings: *mut *mut f32,
) {
    for i in 0..n_inputs as usize {
        fake_encode(ctx, n_threads, *texts.add(i), *embeddings.add(i));
    }
}

unsafe extern "C" fn fake_tokenize(
    _ctx: *mut BertContext,
    text: *const c_char,
    tokens: *mut i32,
    n_tokens: *mut i32,
    n_max_tokens: i32,
) {
    let text = CStr::from_ptr(text).to_string_lossy();
    let mut ids = vec![CLS];
    ids.extend(text.split_whitespace().map(word_id));
    ids.push(SEP);
    ids.truncate(n_max_tokens as usize);

    let out = std::slice::from_raw_parts_mut(tokens, n_max_tokens as usize);
    out[..ids.len()].copy_from_slice(&ids);
    *n_tokens = ids.len() as i32;
}

unsafe fn eval_values(n_threads: i32, tokens: *const i32, n_tokens: i32) -> [f32; FAKE_DIM] {
    let sum: i64 = if n_tokens == 0 {
        0
    } else {
        std::slice::from_raw_parts(tokens, n_tokens as usize)
            .iter()
            .map(|&t| t as i64)
            .sum()
    };
    [n_tokens as f32, sum as f32, n_threads as f32, 1.0]
}

unsafe extern "C" fn fake_eval(
    _ctx: *mut BertContext,
    n_threads: i32,
    tokens: *mut i32,
    n_tokens: i32,
    embeddings: *mut f32,
) {
    write_outputs(embeddings, eval_values(n_threads, tokens, n_tokens));
}

unsafe extern "C" fn fake_eval_batch(
    _ctx: *mut BertContext,
    n_threads: i32,
    n_batch_size: i32,
    batch_tokens: *mut *mut i32,
    n_tokens: *mut i32,
    batch_embeddings: *mut *mut f32,
) {
    let counts = std::slice::from_raw_parts(n_tokens, n_batch_size as usize);
    let sorted = counts.windows(2).all(|w| w[0] >= w[1]);

    for (i, &count) in counts.iter().enumerate() {
        let tokens = *batch_tokens.add(i);
        assert_eq!(tokens.is_null(), count == 0, "null pointer must mean empty sequence");
        let mut values = eval_values(n_threads, tokens, count);
        values[3] = if sorted { 1.0 } else { 0.0 };
        write_outputs(*batch_embeddings.add(i), values);
    }
}

unsafe extern "C" fn fake_n_embd(_ctx: *mut BertContext) -> i32 {
    FAKE_DIM as i32
}

unsafe extern "C" fn fake_n_max_tokens(_ctx: *mut BertContext) -> i32 {
    FAKE_MAX_TOKENS as i32
}

unsafe extern "C" fn fake_vocab_id_to_token(_ctx: *mut BertContext, id: i32) -> *const c_char {
    let entry: &'static [u8] = match id {
        CLS => b"[CLS]\0",
        SEP => b"[SEP]\0",
        UNK => b"[UNK]\0",
        HELLO => b"hello\0",
        WORLD => b"world\0",
        _ => return std::ptr::null(),
    };
    entry.as_ptr() as *const c_char
}

unsafe extern "C" fn fake_zero_embd(_ctx: *mut BertContext) -> i32 {
    0
}

/// Function table pointing at the fakes above
pub fn fake_api() -> BertApi {
    BertApi {
        load_from_file: fake_load_from_file,
        free: fake_free,
        encode: fake_encode,
        encode_batch: fake_encode_batch,
        tokenize: fake_tokenize,
        eval: fake_eval,
        eval_batch: fake_eval_batch,
        n_embd: fake_n_embd,
        n_max_tokens: fake_n_max_tokens,
        vocab_id_to_token: fake_vocab_id_to_token,
    }
}

/// Same as [`fake_api`] but reporting an invalid embedding size
pub fn broken_api() -> BertApi {
    BertApi {
        n_embd: fake_zero_embd,
        ..fake_api()
    }
}

pub fn fake_library() -> Arc<BertLibrary> {
    Arc::new(BertLibrary::from_api(fake_api()))
}

/// A model file on disk; the fake never reads it
pub struct ModelFixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

pub fn model_fixture(name: &str) -> ModelFixture {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, b"ggml").unwrap();
    ModelFixture { dir, path }
}

/// Load a model against the fake library with a fixed thread count
pub fn load_fake_model(config: EmbeddingConfig) -> (BertModel, ModelFixture) {
    let fixture = model_fixture("minilm12-q4.bin");
    let model = BertModel::load_with_library(fake_library(), &fixture.path, config).unwrap();
    (model, fixture)
}

pub fn two_threads() -> EmbeddingConfig {
    EmbeddingConfig {
        threads: 2,
        ..Default::default()
    }
}
