use lambda_http::http::header::HOST;
use lambda_http::Request;

/// Returns the server's host name (e.g. "https://api.heroes.example.com").
/// When there is no Host header the host name can't be determined, so an
/// empty string is returned and links stay relative.
pub fn get_host_name(request: &Request) -> String {
    let headers = request.headers();

    let Some(host) = headers.get(HOST).and_then(|value| value.to_str().ok()) else {
        return String::new();
    };

    let protocol = headers
        .get("x-forwarded-proto")
        .or_else(|| headers.get("cloudfront-forwarded-proto"))
        .and_then(|value| value.to_str().ok())
        .unwrap_or("https");

    format!("{protocol}://{host}")
}
