//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, boxed slices handed out as pointer plus
//! length instead of `Vec`, and enums with explicit discriminants. Conversion
//! functions live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use catalog_core::error::{ApiError, TransportError};
use catalog_core::http::HttpMethod;
use catalog_core::{CatalogItem, CatalogPage, HttpRequest, NetworkConfiguration};

/// Opaque handle to a catalog client. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiCatalogClient {
    pub(crate) config: NetworkConfiguration,
}

/// Convert to a C string, dropping interior NULs instead of failing.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let mut bytes = s.into().into_bytes();
    bytes.retain(|b| *b != 0);
    CString::new(bytes).unwrap_or_default().into_raw()
}

fn c_string_opt(s: Option<String>) -> *mut c_char {
    s.map(c_string).unwrap_or(std::ptr::null_mut())
}

/// Leak a vector as a pointer plus length. Empty vectors become null.
pub(crate) fn leak_slice<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = items.len() as u32;
    let ptr = Box::into_raw(items.into_boxed_slice()) as *mut T;
    (ptr, len)
}

/// Reclaim a slice produced by `leak_slice`.
///
/// # Safety
/// `ptr` and `len` must come from a single `leak_slice` call and must not
/// have been reclaimed already.
pub(crate) unsafe fn reclaim_slice<T>(ptr: *mut T, len: u32) -> Box<[T]> {
    unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len as usize)) }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Head = 1,
    Post = 2,
    Put = 3,
    Patch = 4,
    Delete = 5,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Head => FfiHttpMethod::Head,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `catalog_build_*` functions. The C caller executes the request
/// and passes the response back through `catalog_parse_*`. The body is raw
/// bytes because encoders are not required to produce text.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut u8,
    pub body_len: u32,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: c_string(k),
                value: c_string(v),
            })
            .collect();
        let (headers, headers_len) = leak_slice(headers);
        let (body, body_len) = leak_slice(req.body.unwrap_or_default());

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
            body,
            body_len,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP request,
/// then passes a pointer to a `catalog_parse_*` function. The FFI layer reads
/// but does not free these fields. A null `body` is an empty body.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const u8,
    pub body_len: u32,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiSearchResult`.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    MalformedEndpoint = 1,
    QuerySerialization = 2,
    BodySerialization = 3,
    Transport = 4,
    Http = 5,
    Decoding = 6,
    Panic = 7,
    NullArg = 8,
}

/// A single catalog item exposed to C. Absent optional fields are null.
#[repr(C)]
pub struct FfiCatalogItem {
    pub id: u64,
    pub title: *mut c_char,
    pub overview: *mut c_char,
    pub release_date: *mut c_char,
    pub poster_path: *mut c_char,
}

impl FfiCatalogItem {
    fn from_core(item: CatalogItem) -> Self {
        FfiCatalogItem {
            id: item.id,
            title: c_string(item.title),
            overview: c_string_opt(item.overview),
            release_date: c_string_opt(item.release_date),
            poster_path: c_string_opt(item.poster_path),
        }
    }
}

/// One page of search results. Unknown totals are `-1`.
#[repr(C)]
pub struct FfiResultPage {
    pub page: u32,
    pub total_pages: i64,
    pub total_results: i64,
    pub items: *mut FfiCatalogItem,
    pub len: u32,
}

/// Result envelope for parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `page`
/// points to the parsed payload. On failure `error_code` describes the
/// category, `error_message` is a human-readable C string, and `page` is null.
#[repr(C)]
pub struct FfiSearchResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub page: *mut FfiResultPage,
}

impl FfiSearchResult {
    /// Build a success result carrying a result page.
    pub(crate) fn ok_page(page: CatalogPage) -> *mut Self {
        let items: Vec<FfiCatalogItem> = page.items.into_iter().map(FfiCatalogItem::from_core).collect();
        let (items, len) = leak_slice(items);
        let ffi_page = Box::new(FfiResultPage {
            page: page.page,
            total_pages: page.total_pages.map_or(-1, i64::from),
            total_results: page
                .total_results
                .map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX)),
            items,
            len,
        });
        Box::into_raw(Box::new(FfiSearchResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            page: Box::into_raw(ffi_page),
        }))
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_code, http_status) = match &err {
            ApiError::MalformedEndpoint(_) => (FfiErrorCode::MalformedEndpoint, 0),
            ApiError::QuerySerializationFailed(_) => (FfiErrorCode::QuerySerialization, 0),
            ApiError::BodySerializationFailed(_) => (FfiErrorCode::BodySerialization, 0),
            ApiError::Transport(TransportError::Status { status, .. }) => (FfiErrorCode::Http, *status),
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
            ApiError::DecodingFailed(_) => (FfiErrorCode::Decoding, 0),
        };
        Self::failure(error_code, http_status, err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, 0, msg.to_string())
    }

    fn failure(error_code: FfiErrorCode, http_status: u16, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiSearchResult {
            error_code,
            error_message: c_string(msg),
            http_status,
            page: std::ptr::null_mut(),
        }))
    }
}
