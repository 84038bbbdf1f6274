//! In-process stand-in for the native BERT library.
//!
//! `bert_encode` writes `[word count, byte length, n_threads, 1.0]`;
//! `bert_tokenize` emits `[CLS]`, one id per word, then `[SEP]`.

#![allow(dead_code)]

use bert_embedding::{BertModel, EmbeddingConfig};
use bert_loader::{BertApi, BertContext, BertLibrary};
use std::ffi::{c_char, CStr};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const FAKE_DIM: usize = 4;
pub const FAKE_MAX_TOKENS: usize = 16;

pub const CLS: i32 = 101;
pub const SEP: i32 = 102;
pub const UNK: i32 = 100;
pub const HELLO: i32 = 7592;
pub const WORLD: i32 = 2088;

fn word_id(word: &str) -> i32 {
    match word.to_lowercase().as_str() {
        "hello" => HELLO,
        "world" => WORLD,
        _ => UNK,
    }
}

unsafe extern "C" fn fake_load_from_file(_fname: *const c_char) -> *mut BertContext {
    Box::into_raw(Box::new(0u8)) as *mut BertContext
}

unsafe extern "C" fn fake_free(ctx: *mut BertContext) {
    drop(Box::from_raw(ctx as *mut u8));
}

unsafe extern "C" fn fake_encode(
    _ctx: *mut BertContext,
    n_threads: i32,
    text: *const c_char,
    embeddings: *mut f32,
) {
    let text = CStr::from_ptr(text).to_string_lossy();
    let values = [
        text.split_whitespace().count() as f32,
        text.len() as f32,
        n_threads as f32,
        1.0,
    ];
    std::slice::from_raw_parts_mut(embeddings, FAKE_DIM).copy_from_slice(&values);
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

    std::slice::from_raw_parts_mut(tokens, ids.len()).copy_from_slice(&ids);
    *n_tokens = ids.len() as i32;
}

unsafe extern "C" fn fake_eval(
    _ctx: *mut BertContext,
    _n_threads: i32,
    _tokens: *mut i32,
    n_tokens: i32,
    embeddings: *mut f32,
) {
    let values = [n_tokens as f32, 0.0, 0.0, 1.0];
    std::slice::from_raw_parts_mut(embeddings, FAKE_DIM).copy_from_slice(&values);
}

unsafe extern "C" fn fake_eval_batch(
    ctx: *mut BertContext,
    n_threads: i32,
    n_batch_size: i32,
    batch_tokens: *mut *mut i32,
    n_tokens: *mut i32,
    batch_embeddings: *mut *mut f32,
) {
    for i in 0..n_batch_size as usize {
        fake_eval(
            ctx,
            n_threads,
            *batch_tokens.add(i),
            *n_tokens.add(i),
            *batch_embeddings.add(i),
        );
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

/// Temporary directory holding a placeholder model file
pub struct Workspace {
    pub dir: TempDir,
    pub model_path: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let model_path = dir.path().join("minilm12-q4.bin");
        std::fs::write(&model_path, b"ggml").unwrap();
        Self { dir, model_path }
    }

    pub fn write_input(&self, content: &str) -> PathBuf {
        let path = self.dir.path().join("input.txt");
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Load the placeholder model against the fake library
    pub fn load_model(&self, config: EmbeddingConfig) -> BertModel {
        let library = Arc::new(BertLibrary::from_api(fake_api()));
        BertModel::load_with_library(library, &self.model_path, config).unwrap()
    }
}

pub fn two_threads() -> EmbeddingConfig {
    EmbeddingConfig {
        threads: 2,
        ..Default::default()
    }
}
