//! C-ABI wrapper around `catalog-core`.
//!
//! # Overview
//! Exposes catalog search through `extern "C"` functions so any language with
//! a C FFI can build requests and parse responses without linking to Rust's
//! async runtime. The C side owns the network: it executes each
//! `FfiHttpRequest` however it likes and hands the reply back.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Building goes through the same `build_request` the async core uses, so
//!   URL composition is identical on both paths.
//! - A single `FfiSearchResult` envelope conveys success payloads and errors.
//! - The C caller owns all returned pointers and must call the matching
//!   `catalog_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use catalog_core::catalog::{parse_search_response, search_endpoint};
use catalog_core::{build_request, HttpResponse, NetworkConfiguration, SearchQuery, SearchRequest};

use types::*;

/// Read a nullable C string. Null and invalid UTF-8 both yield `None`.
///
/// # Safety
/// `s` must be null or point to a NUL-terminated string.
unsafe fn read_str(s: *const c_char) -> Option<String> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok().map(str::to_string)
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new catalog client bound to `base_url`.
///
/// `api_key` and `language` may be null. When set they become the `api_key`
/// and `language` query parameters on every request, and `language` is also
/// sent as `Accept-Language`.
/// Returns null if `base_url` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `catalog_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_client_new(
    base_url: *const c_char,
    api_key: *const c_char,
    language: *const c_char,
) -> *mut FfiCatalogClient {
    catch_unwind(|| {
        let Some(url) = (unsafe { read_str(base_url) }) else {
            return std::ptr::null_mut();
        };
        let mut config = NetworkConfiguration::new(url).with_header("Accept", "application/json");
        if let Some(key) = unsafe { read_str(api_key) } {
            config = config.with_query_parameter("api_key", key);
        }
        if let Some(language) = unsafe { read_str(language) } {
            config = config
                .with_header("Accept-Language", language.clone())
                .with_query_parameter("language", language);
        }
        Box::into_raw(Box::new(FfiCatalogClient { config }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `catalog_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_client_free(client: *mut FfiCatalogClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the request for one page of a title search.
///
/// Returns null if `client` or `query` is null, or if the request cannot be
/// built (for example a malformed base URL).
/// The caller must free the returned pointer with `catalog_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_build_search_request(
    client: *const FfiCatalogClient,
    query: *const c_char,
    page: u32,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let Some(text) = (unsafe { read_str(query) }) else {
            return std::ptr::null_mut();
        };
        let client = unsafe { &*client };
        let request = SearchRequest::new(SearchQuery::new(text), page);
        match build_request(&search_endpoint(&request), &client.config) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Copy an `FfiHttpResponse` into a core `HttpResponse`.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() || resp.body_len == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(resp.body, resp.body_len as usize) }.to_vec()
    };
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body,
    }
}

/// Parse the reply to a request built by `catalog_build_search_request`.
///
/// Returns a result whose `page` is set on success. Non-2xx replies come
/// back with `error_code = Http` and the status in `http_status`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_parse_search_response(
    response: *const FfiHttpResponse,
) -> *mut FfiSearchResult {
    catch_unwind(|| {
        if response.is_null() {
            return FfiSearchResult::null_arg("response");
        }
        let resp = unsafe { &*response };
        match parse_search_response(&ffi_response_to_core(resp)) {
            Ok(page) => FfiSearchResult::ok_page(page),
            Err(e) => FfiSearchResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiSearchResult::panic("panic in catalog_parse_search_response"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Free an `FfiHttpRequest` returned by any `catalog_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        if !req.body.is_null() {
            drop(unsafe { reclaim_slice(req.body, req.body_len) });
        }
        if !req.headers.is_null() {
            let headers = unsafe { reclaim_slice(req.headers, req.headers_len) };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    });
}

/// Free an `FfiSearchResult` returned by any `catalog_parse_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_free_result(result: *mut FfiSearchResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if result.page.is_null() {
            return;
        }
        let page = unsafe { Box::from_raw(result.page) };
        if !page.items.is_null() {
            let items = unsafe { reclaim_slice(page.items, page.len) };
            for item in items.iter() {
                free_c_string(item.title);
                free_c_string(item.overview);
                free_c_string(item.release_date);
                free_c_string(item.poster_path);
            }
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn client(api_key: Option<&str>, language: Option<&str>) -> *mut FfiCatalogClient {
        let url = CString::new("http://localhost:3000/").unwrap();
        let key = api_key.map(|k| CString::new(k).unwrap());
        let lang = language.map(|l| CString::new(l).unwrap());
        catalog_client_new(
            url.as_ptr(),
            key.as_ref().map_or(std::ptr::null(), |k| k.as_ptr()),
            lang.as_ref().map_or(std::ptr::null(), |l| l.as_ptr()),
        )
    }

    fn str_at(ptr: *const c_char) -> String {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string()
    }

    fn parse(status: u16, body: &str) -> *mut FfiSearchResult {
        let response = FfiHttpResponse {
            status,
            body: body.as_ptr(),
            body_len: body.len() as u32,
        };
        catalog_parse_search_response(&response)
    }

    #[test]
    fn client_new_and_free() {
        let client = client(None, None);
        assert!(!client.is_null());
        catalog_client_free(client);
    }

    #[test]
    fn client_new_null_returns_null() {
        let client = catalog_client_new(std::ptr::null(), std::ptr::null(), std::ptr::null());
        assert!(client.is_null());
    }

    #[test]
    fn client_free_null_is_safe() {
        catalog_client_free(std::ptr::null_mut());
    }

    #[test]
    fn build_search_request_composes_url() {
        let client = client(Some("k"), None);
        let query = CString::new("the batman").unwrap();
        let req = catalog_build_search_request(client, query.as_ptr(), 2);
        assert!(!req.is_null());

        let req_ref = unsafe { &*req };
        assert_eq!(req_ref.method, FfiHttpMethod::Get);
        assert_eq!(
            str_at(req_ref.url),
            "http://localhost:3000/search?api_key=k&query=the%20batman&page=2"
        );
        assert!(req_ref.body.is_null());
        assert_eq!(req_ref.body_len, 0);
        assert_eq!(req_ref.headers_len, 1);

        let header = unsafe { &*req_ref.headers };
        assert_eq!(str_at(header.key), "Accept");
        assert_eq!(str_at(header.value), "application/json");

        catalog_free_request(req);
        catalog_client_free(client);
    }

    #[test]
    fn build_search_request_sends_language_both_ways() {
        let client = client(None, Some("de-DE"));
        let query = CString::new("heat").unwrap();
        let req = catalog_build_search_request(client, query.as_ptr(), 1);

        let req_ref = unsafe { &*req };
        assert_eq!(
            str_at(req_ref.url),
            "http://localhost:3000/search?language=de-DE&query=heat&page=1"
        );
        let headers = unsafe { std::slice::from_raw_parts(req_ref.headers, req_ref.headers_len as usize) };
        assert!(headers
            .iter()
            .any(|h| str_at(h.key) == "Accept-Language" && str_at(h.value) == "de-DE"));

        catalog_free_request(req);
        catalog_client_free(client);
    }

    #[test]
    fn build_search_request_null_args_return_null() {
        let query = CString::new("heat").unwrap();
        assert!(catalog_build_search_request(std::ptr::null(), query.as_ptr(), 1).is_null());

        let client = client(None, None);
        assert!(catalog_build_search_request(client, std::ptr::null(), 1).is_null());
        catalog_client_free(client);
    }

    #[test]
    fn build_search_request_malformed_base_returns_null() {
        let url = CString::new("not a url").unwrap();
        let client = catalog_client_new(url.as_ptr(), std::ptr::null(), std::ptr::null());
        let query = CString::new("heat").unwrap();
        assert!(catalog_build_search_request(client, query.as_ptr(), 1).is_null());
        catalog_client_free(client);
    }

    #[test]
    fn parse_search_response_success() {
        let result = parse(
            200,
            r#"{"page":1,"total_pages":2,"total_results":3,"results":[
                {"id":268,"title":"Batman","overview":"","release_date":"1989-06-23","poster_path":"/268.jpg"}
            ]}"#,
        );
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(r.error_message.is_null());

        let page = unsafe { &*r.page };
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.total_results, 3);
        assert_eq!(page.len, 1);

        let item = unsafe { &*page.items };
        assert_eq!(item.id, 268);
        assert_eq!(str_at(item.title), "Batman");
        assert!(item.overview.is_null());
        assert_eq!(str_at(item.release_date), "1989-06-23");
        assert_eq!(str_at(item.poster_path), "/268.jpg");

        catalog_free_result(result);
    }

    #[test]
    fn parse_search_response_unknown_totals_are_negative() {
        let result = parse(200, r#"{"page":3,"results":[]}"#);
        let page = unsafe { &*(*result).page };
        assert_eq!(page.total_pages, -1);
        assert_eq!(page.total_results, -1);
        assert!(page.items.is_null());
        assert_eq!(page.len, 0);
        catalog_free_result(result);
    }

    #[test]
    fn parse_search_response_http_error() {
        let result = parse(401, r#"{"status_message":"Invalid API key"}"#);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Http);
        assert_eq!(r.http_status, 401);
        assert!(r.page.is_null());
        assert!(str_at(r.error_message).contains("Invalid API key"));
        catalog_free_result(result);
    }

    #[test]
    fn parse_search_response_bad_json() {
        let result = parse(200, "<html>");
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Decoding);
        assert!(!r.error_message.is_null());
        catalog_free_result(result);
    }

    #[test]
    fn parse_search_response_null_body_is_empty() {
        let response = FfiHttpResponse {
            status: 200,
            body: std::ptr::null(),
            body_len: 0,
        };
        let result = catalog_parse_search_response(&response);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::Decoding);
        catalog_free_result(result);
    }

    #[test]
    fn parse_search_response_null_response() {
        let result = catalog_parse_search_response(std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        assert_eq!(str_at(r.error_message), "null argument: response");
        catalog_free_result(result);
    }

    #[test]
    fn free_functions_accept_null() {
        catalog_free_request(std::ptr::null_mut());
        catalog_free_result(std::ptr::null_mut());
        catalog_free_string(std::ptr::null_mut());
    }
}
