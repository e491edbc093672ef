//! Tokenizer modules loaded at runtime from shared libraries.
//!
//! A module exports one symbol, [`MODULE_SYMBOL`], returning a table of its
//! members. The table is checked against the tokenizer contract before any
//! member is called; loading never fails loudly, it just yields `None`.

use std::ffi::{c_char, c_void, CStr};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libloading::Library;
use thiserror::Error;

use crate::capability::{CapabilityError, TokenizerCapability, ValidatedTokenizer};
use crate::contract::{self, Member, MemberKind, ReturnKind, Signature};

/// Entry point every module exports.
pub const MODULE_SYMBOL: &[u8] = b"sift_tokenizer_module\0";

/// One exported member as laid out by the module.
#[repr(C)]
pub struct RawMember {
    pub name: *const c_char,
    /// 0 = async, 1 = sync.
    pub kind: u32,
    pub arity: u32,
    /// 0 = unit, 1 = bool, 2 = string sequence.
    pub returns: u32,
    pub func: *const c_void,
}

/// The member table returned by [`MODULE_SYMBOL`]. Must stay valid while the library is loaded.
#[repr(C)]
pub struct RawModule {
    pub members: *const RawMember,
    pub len: usize,
}

type FnModule = unsafe extern "C" fn() -> RawModule;
/// Returns 0 on success.
type FnInit = unsafe extern "C" fn() -> i32;
/// Returns 1 (claimed), 0 (not claimed) or a negative error status.
type FnIsTokenizable = unsafe extern "C" fn(text: *const u8, len: usize) -> i32;
/// Called once per token by `tokenize`.
pub type FnPushToken = unsafe extern "C" fn(sink: *mut c_void, token: *const u8, len: usize);
/// Pushes each token through `push`, then returns 0 or a negative error status.
type FnTokenize =
    unsafe extern "C" fn(text: *const u8, len: usize, sink: *mut c_void, push: FnPushToken) -> i32;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not open library: {0}")]
    Open(#[source] libloading::Error),
    #[error("missing entry point `sift_tokenizer_module`: {0}")]
    EntryPoint(#[source] libloading::Error),
    #[error("member table is malformed: {0}")]
    Malformed(&'static str),
    #[error("module does not satisfy the tokenizer contract:\n{0}")]
    Contract(String),
}

/// The three members of a module that passed validation.
#[derive(Clone, Copy)]
struct EntryPoints {
    init: FnInit,
    is_tokenizable: FnIsTokenizable,
    tokenize: FnTokenize,
}

/// A validated module's entry points, kept alive with its library.
pub struct DylibTokenizer {
    name: String,
    library: Arc<Library>,
    entry: EntryPoints,
}

/// Loads, validates and initializes the module at `path`.
///
/// Any failure (missing file, not a library, contract violation, init error)
/// is logged as a warning and yields `None`.
pub async fn load_from_path(path: &Path) -> Option<ValidatedTokenizer> {
    let tokenizer = match DylibTokenizer::open(path) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to load tokenizer module");
            return None;
        }
    };
    ValidatedTokenizer::initialize(Box::new(tokenizer)).await
}

impl DylibTokenizer {
    fn open(path: &Path) -> Result<Self, LoadError> {
        // SAFETY: loading a library runs its initializers. Modules are
        // configured explicitly by the user; that is the trust boundary.
        let library = unsafe { Library::new(path) }.map_err(LoadError::Open)?;
        let module = unsafe {
            let entry = library
                .get::<FnModule>(MODULE_SYMBOL)
                .map_err(LoadError::EntryPoint)?;
            entry()
        };

        let entry = EntryPoints::from_module(&module)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            library: Arc::new(library),
            entry,
        })
    }
}

impl EntryPoints {
    /// Reads a module's member table and checks it against the tokenizer
    /// contract. Nothing in the module is called.
    fn from_module(module: &RawModule) -> Result<Self, LoadError> {
        let raw = read_members(module)?;
        let members: Vec<Member> = raw.iter().map(|(m, _)| m.clone()).collect();
        let violations = contract::validate(&members);
        if !violations.is_empty() {
            return Err(LoadError::Contract(contract::render_diff(&violations)));
        }

        let func = |name: &str| {
            raw.iter()
                .find(|(m, _)| m.name == name)
                .map(|(_, f)| *f)
                .filter(|f| !f.is_null())
                .ok_or(LoadError::Malformed("member has a null function pointer"))
        };
        let init = func(contract::INIT)?;
        let is_tokenizable = func(contract::IS_TOKENIZABLE)?;
        let tokenize = func(contract::TOKENIZE)?;

        // SAFETY: the signatures were checked against the contract above.
        Ok(Self {
            init: unsafe { std::mem::transmute::<*const c_void, FnInit>(init) },
            is_tokenizable: unsafe {
                std::mem::transmute::<*const c_void, FnIsTokenizable>(is_tokenizable)
            },
            tokenize: unsafe { std::mem::transmute::<*const c_void, FnTokenize>(tokenize) },
        })
    }

    fn is_tokenizable(&self, text: &str) -> Result<bool, CapabilityError> {
        // SAFETY: validated entry point; `text` is valid for `len` bytes during the call.
        match unsafe { (self.is_tokenizable)(text.as_ptr(), text.len()) } {
            0 => Ok(false),
            1 => Ok(true),
            s => Err(CapabilityError::Status(s)),
        }
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>, CapabilityError> {
        let mut tokens: Vec<String> = Vec::new();
        let sink = &mut tokens as *mut Vec<String> as *mut c_void;
        // SAFETY: validated entry point; `sink` points at a live Vec for the duration of the call.
        let status = unsafe { (self.tokenize)(text.as_ptr(), text.len(), sink, push_token) };
        if status < 0 {
            return Err(CapabilityError::Status(status));
        }
        Ok(tokens)
    }
}

/// Copies the member table out of module memory.
fn read_members(module: &RawModule) -> Result<Vec<(Member, *const c_void)>, LoadError> {
    if module.len == 0 {
        return Ok(Vec::new());
    }
    if module.members.is_null() {
        return Err(LoadError::Malformed("member table is null"));
    }
    // SAFETY: the module promises `len` contiguous entries at `members`.
    let raw = unsafe { std::slice::from_raw_parts(module.members, module.len) };
    raw.iter()
        .map(|m| {
            if m.name.is_null() {
                return Err(LoadError::Malformed("member without a name"));
            }
            // SAFETY: non-null, NUL-terminated per the module ABI.
            let name = unsafe { CStr::from_ptr(m.name) }
                .to_string_lossy()
                .into_owned();
            let member = Member {
                name,
                signature: Signature {
                    kind: MemberKind::from_raw(m.kind),
                    arity: m.arity,
                    returns: ReturnKind::from_raw(m.returns),
                },
            };
            Ok((member, m.func))
        })
        .collect()
}

unsafe extern "C" fn push_token(sink: *mut c_void, token: *const u8, len: usize) {
    if sink.is_null() || token.is_null() {
        return;
    }
    let tokens = &mut *(sink as *mut Vec<String>);
    let bytes = std::slice::from_raw_parts(token, len);
    tokens.push(String::from_utf8_lossy(bytes).into_owned());
}

#[async_trait]
impl TokenizerCapability for DylibTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&mut self) -> Result<(), CapabilityError> {
        let init = self.entry.init;
        let library = Arc::clone(&self.library);
        let status = tokio::task::spawn_blocking(move || {
            let _library = library;
            // SAFETY: validated `init` entry point; the library outlives the call.
            unsafe { init() }
        })
        .await
        .map_err(|e| CapabilityError::Init(e.to_string()))?;

        match status {
            0 => Ok(()),
            s => Err(CapabilityError::Status(s)),
        }
    }

    fn is_tokenizable(&self, text: &str) -> Result<bool, CapabilityError> {
        self.entry.is_tokenizable(text)
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>, CapabilityError> {
        self.entry.tokenize(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TokenizerRegistry;
    use crate::tokenize::{tokenize_for_indexing, IndexingOptions};

    extern "C" fn init_ok() -> i32 {
        0
    }

    unsafe extern "C" fn claims_ascii(text: *const u8, len: usize) -> i32 {
        i32::from(std::slice::from_raw_parts(text, len).is_ascii())
    }

    unsafe extern "C" fn split_in_half(
        text: *const u8,
        len: usize,
        sink: *mut c_void,
        push: FnPushToken,
    ) -> i32 {
        let mid = len / 2;
        push(sink, text, mid);
        push(sink, text.add(mid), len - mid);
        0
    }

    fn member(name: &'static [u8], kind: u32, arity: u32, returns: u32, func: *const c_void) -> RawMember {
        RawMember {
            name: name.as_ptr() as *const c_char,
            kind,
            arity,
            returns,
            func,
        }
    }

    fn init_member() -> RawMember {
        member(b"init\0", 0, 0, 0, init_ok as *const c_void)
    }

    fn predicate_member() -> RawMember {
        member(b"is_tokenizable\0", 1, 1, 1, claims_ascii as *const c_void)
    }

    fn tokenize_member() -> RawMember {
        member(b"tokenize\0", 1, 1, 2, split_in_half as *const c_void)
    }

    fn module(raw: &[RawMember]) -> RawModule {
        RawModule {
            members: raw.as_ptr(),
            len: raw.len(),
        }
    }

    #[test]
    fn conforming_table_is_callable() {
        let raw = [init_member(), predicate_member(), tokenize_member()];
        let Ok(entry) = EntryPoints::from_module(&module(&raw)) else {
            panic!("conforming table was rejected");
        };
        assert!(entry.is_tokenizable("abcd").unwrap());
        assert!(!entry.is_tokenizable("中文").unwrap());
        assert_eq!(entry.tokenize("abcd").unwrap(), vec!["ab", "cd"]);
    }

    #[test]
    fn module_without_predicate_is_rejected_and_indexing_goes_on() {
        let raw = [init_member(), tokenize_member()];
        let Err(LoadError::Contract(diff)) = EntryPoints::from_module(&module(&raw)) else {
            panic!("table without is_tokenizable passed validation");
        };
        assert_eq!(diff, "- is_tokenizable: fn(text) -> bool");

        // The rejected module never joins the registry; the default split still applies.
        let registry = TokenizerRegistry::new();
        let tokens = tokenize_for_indexing("ab cd", IndexingOptions::default(), &registry);
        assert_eq!(tokens, vec!["ab", "cd", "ab", "cd"]);
    }

    #[test]
    fn null_function_pointer_is_malformed() {
        let raw = [
            init_member(),
            predicate_member(),
            member(b"tokenize\0", 1, 1, 2, std::ptr::null()),
        ];
        assert!(matches!(
            EntryPoints::from_module(&module(&raw)),
            Err(LoadError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn missing_module_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from_path(&dir.path().join("nope.so")).await.is_none());
    }

    #[tokio::test]
    async fn non_library_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.so");
        std::fs::write(&path, b"definitely not an ELF").unwrap();
        assert!(load_from_path(&path).await.is_none());
    }

    #[test]
    fn open_reports_open_errors() {
        let err = DylibTokenizer::open(Path::new("/nonexistent/tokenizer.so")).err().unwrap();
        assert!(matches!(err, LoadError::Open(_)));
    }

    #[test]
    fn empty_table_fails_the_contract() {
        let module = RawModule {
            members: std::ptr::null(),
            len: 0,
        };
        let members: Vec<Member> = read_members(&module)
            .unwrap()
            .into_iter()
            .map(|(m, _)| m)
            .collect();
        assert_eq!(contract::validate(&members).len(), 3);
    }

    #[test]
    fn table_is_read_into_members() {
        extern "C" fn noop() -> i32 {
            0
        }
        let raw = [RawMember {
            name: b"init\0".as_ptr() as *const c_char,
            kind: 0,
            arity: 0,
            returns: 0,
            func: noop as *const c_void,
        }];
        let module = RawModule {
            members: raw.as_ptr(),
            len: raw.len(),
        };
        let members = read_members(&module).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].0.name, "init");
        assert_eq!(members[0].0.signature.kind, MemberKind::Async);
        assert!(!members[0].1.is_null());
    }

    #[test]
    fn sink_collects_tokens() {
        let mut tokens: Vec<String> = Vec::new();
        let sink = &mut tokens as *mut Vec<String> as *mut c_void;
        let word = "词语";
        unsafe { push_token(sink, word.as_ptr(), word.len()) };
        assert_eq!(tokens, vec!["词语".to_string()]);
    }
}
