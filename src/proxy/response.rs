//! Error Responses
//!
//! Renders the HTML error page returned to clients whose request the proxy
//! refuses.

use crate::error::ProxyError;

// == Error Page ==
/// Full HTTP/1.0 response (status line, headers and HTML body).
pub fn error_page(code: u16, short: &str, long: &str, cause: &str) -> String {
    let body = format!(
        "<html><title>Proxy Error</title><body bgcolor=\"ffffff\">\r\n\
         {code}: {short}\r\n\
         <p>{long}: {cause}\r\n\
         <hr><em>mini_proxy</em>\r\n</body></html>\r\n"
    );

    format!(
        "HTTP/1.0 {code} {short}\r\nContent-type: text/html\r\nContent-length: {}\r\n\r\n{body}",
        body.len()
    )
}

/// Error page for a client protocol error, or `None` if the error is not
/// reported to the client.
pub fn error_page_for(err: &ProxyError) -> Option<String> {
    let (code, short) = err.status()?;
    let (long, cause) = match err {
        ProxyError::NotImplemented(method) => ("Proxy does not implement this method", method.as_str()),
        ProxyError::BadRequest(reason) => ("Proxy could not parse the request", reason.as_str()),
        _ => ("Proxy error", ""),
    };
    Some(error_page(code, short, long, cause))
}
