//! C FFI layer for cross-language interoperability.
//!
//! Every string returned through [`MdLatexResult`] is owned by the caller
//! and must be released with [`mdlatex_free_result`] or
//! [`mdlatex_free_string`].

use crate::config::{LatexConfig, DEFAULT_TEMPLATE_MARKER};
use crate::template::apply_template;
use libc::c_char;
use std::ffi::{CStr, CString};
use std::ptr;

/// Result type for FFI operations.
#[repr(C)]
pub struct MdLatexResult {
    /// Pointer to result string (caller must free with mdlatex_free_string)
    pub data: *mut c_char,
    /// Error message if data is null (caller must free with mdlatex_free_string)
    pub error: *mut c_char,
}

impl MdLatexResult {
    fn ok(data: String) -> Self {
        Self {
            data: to_c_string(data).into_raw(),
            error: ptr::null_mut(),
        }
    }

    fn err(error: impl ToString) -> Self {
        Self {
            data: ptr::null_mut(),
            error: to_c_string(error.to_string()).into_raw(),
        }
    }
}

impl<E: std::fmt::Display> From<Result<String, E>> for MdLatexResult {
    fn from(result: Result<String, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e),
        }
    }
}

/// Interior NULs cannot cross the boundary; they are dropped.
fn to_c_string(s: String) -> CString {
    CString::new(s)
        .or_else(|e| {
            let mut bytes = e.into_vec();
            bytes.retain(|&b| b != 0);
            CString::new(bytes)
        })
        .unwrap_or_default()
}

/// Borrow a C string as UTF-8, naming the argument in the error.
unsafe fn read_str<'a>(s: *const c_char, what: &str) -> Result<&'a str, String> {
    if s.is_null() {
        return Err(format!("Null {} pointer", what));
    }
    CStr::from_ptr(s)
        .to_str()
        .map_err(|_| format!("Invalid UTF-8 {}", what))
}

/// Convert Markdown to LaTeX with the default configuration.
///
/// # Safety
///
/// - `input` must be a valid null-terminated UTF-8 string.
/// - The returned strings must be freed with `mdlatex_free_result`.
#[no_mangle]
pub unsafe extern "C" fn mdlatex_convert(input: *const c_char) -> MdLatexResult {
    let input = match read_str(input, "input") {
        Ok(s) => s,
        Err(e) => return MdLatexResult::err(e),
    };

    crate::markdown_to_latex(input, None).into()
}

/// Convert Markdown to LaTeX with a TOML configuration.
///
/// # Safety
///
/// - `input` must be a valid null-terminated UTF-8 string.
/// - `config` must be a valid null-terminated UTF-8 string, or null for
///   the default configuration.
/// - The returned strings must be freed with `mdlatex_free_result`.
#[no_mangle]
pub unsafe extern "C" fn mdlatex_convert_with_config(
    input: *const c_char,
    config: *const c_char,
) -> MdLatexResult {
    let input = match read_str(input, "input") {
        Ok(s) => s,
        Err(e) => return MdLatexResult::err(e),
    };

    let config = if config.is_null() {
        LatexConfig::default()
    } else {
        let toml = match read_str(config, "config") {
            Ok(s) => s,
            Err(e) => return MdLatexResult::err(e),
        };
        match LatexConfig::from_toml_str(toml) {
            Ok(c) => c,
            Err(e) => return MdLatexResult::err(e),
        }
    };

    crate::markdown_to_latex(input, Some(&config)).into()
}

/// Insert rendered LaTeX at the `INSERT-TEXT-HERE` marker of a template.
///
/// # Safety
///
/// - `template` and `latex` must be valid null-terminated UTF-8 strings.
/// - The returned strings must be freed with `mdlatex_free_result`.
#[no_mangle]
pub unsafe extern "C" fn mdlatex_apply_template(
    template: *const c_char,
    latex: *const c_char,
) -> MdLatexResult {
    let (template, latex) = match (read_str(template, "template"), read_str(latex, "latex")) {
        (Ok(t), Ok(l)) => (t, l),
        (Err(e), _) | (_, Err(e)) => return MdLatexResult::err(e),
    };

    apply_template(template, latex, DEFAULT_TEMPLATE_MARKER).into()
}

/// Free a string returned by mdlatex functions.
///
/// # Safety
///
/// - `s` must be a pointer returned by a mdlatex function, or null.
#[no_mangle]
pub unsafe extern "C" fn mdlatex_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Free a result struct.
///
/// # Safety
///
/// - `result` must be a valid MdLatexResult.
#[no_mangle]
pub unsafe extern "C" fn mdlatex_free_result(result: MdLatexResult) {
    mdlatex_free_string(result.data);
    mdlatex_free_string(result.error);
}

/// Get the library version.
///
/// The returned string is static and must not be freed.
#[no_mangle]
pub extern "C" fn mdlatex_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}

// Generate C header content for documentation
/// ```c
/// // markdown_latex.h
/// #ifndef MARKDOWN_LATEX_H
/// #define MARKDOWN_LATEX_H
///
/// typedef struct {
///     char* data;
///     char* error;
/// } MdLatexResult;
///
/// MdLatexResult mdlatex_convert(const char* input);
/// MdLatexResult mdlatex_convert_with_config(const char* input, const char* toml_config);
/// MdLatexResult mdlatex_apply_template(const char* template_, const char* latex);
/// void mdlatex_free_string(char* s);
/// void mdlatex_free_result(MdLatexResult result);
/// const char* mdlatex_version(void);
///
/// #endif
/// ```
const _: () = ();

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn take(result: MdLatexResult) -> (Option<String>, Option<String>) {
        let read = |p: *mut c_char| {
            (!p.is_null()).then(|| CStr::from_ptr(p).to_string_lossy().into_owned())
        };
        let out = (read(result.data), read(result.error));
        mdlatex_free_result(result);
        out
    }

    #[test]
    fn test_convert() {
        let input = CString::new("## Hi").unwrap();
        let (data, error) = unsafe { take(mdlatex_convert(input.as_ptr())) };
        assert_eq!(data.as_deref(), Some("\\section{Hi}"));
        assert!(error.is_none());
    }

    #[test]
    fn test_null_input() {
        let (data, error) = unsafe { take(mdlatex_convert(ptr::null())) };
        assert!(data.is_none());
        assert_eq!(error.as_deref(), Some("Null input pointer"));
    }

    #[test]
    fn test_convert_with_config() {
        let input = CString::new("Text[^n].\n\n[^n]: Note.").unwrap();
        let config = CString::new("footnotes = true").unwrap();
        let (data, _) = unsafe { take(mdlatex_convert_with_config(input.as_ptr(), config.as_ptr())) };
        assert_eq!(data.as_deref(), Some("Text\\footnote{Note.}."));

        let bad = CString::new("footnotes = 3").unwrap();
        let (data, error) = unsafe { take(mdlatex_convert_with_config(input.as_ptr(), bad.as_ptr())) };
        assert!(data.is_none());
        assert!(error.unwrap().starts_with("Invalid configuration"));
    }

    #[test]
    fn test_apply_template() {
        let template = CString::new("\\begin{document}INSERT-TEXT-HERE\\end{document}").unwrap();
        let latex = CString::new("x").unwrap();
        let (data, _) = unsafe { take(mdlatex_apply_template(template.as_ptr(), latex.as_ptr())) };
        assert_eq!(data.as_deref(), Some("\\begin{document}x\\end{document}"));
    }

    #[test]
    fn test_interior_nul_dropped() {
        assert_eq!(to_c_string("a\0b".to_string()).to_str().unwrap(), "ab");
    }

    #[test]
    fn test_version() {
        let version = unsafe { CStr::from_ptr(mdlatex_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }
}
