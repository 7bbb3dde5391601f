//! Loopback redirect listener for the installed-app OAuth2 flow.
//!
//! Binds `127.0.0.1:<port>`, accepts the single browser redirect and pulls
//! the authorization code out of the query string.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

use super::provider::ProviderError;

const SUCCESS_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Colorbook | Signed in</title></head>
<body style="font-family: system-ui, sans-serif; text-align: center; padding-top: 20vh;">
    <h1>You're signed in</h1>
    <p>You can close this window and go back to Colorbook.</p>
</body>
</html>"#;

const ERROR_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Colorbook | Sign-in failed</title></head>
<body style="font-family: system-ui, sans-serif; text-align: center; padding-top: 20vh;">
    <h1>Sign-in did not complete</h1>
    <p>Check your terminal for details and try again.</p>
</body>
</html>"#;

/// Authorization code delivered to the redirect URI
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    pub code: String,
}

/// Redirect URI registered for the given port
pub fn redirect_uri(port: u16) -> String {
    format!("http://127.0.0.1:{}/callback", port)
}

/// Bind the listener. A busy port means another sign-in is waiting on it.
pub async fn bind(port: u16) -> Result<TcpListener, ProviderError> {
    let addr = format!("127.0.0.1:{}", port);
    TcpListener::bind(&addr).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            ProviderError::InProgress
        } else {
            ProviderError::Failed(format!("Failed to start callback server on {}: {}", addr, e))
        }
    })
}

/// Accept one redirect and return its authorization code
pub async fn wait_for_code(
    listener: TcpListener,
    expected_state: &str,
) -> Result<AuthorizationCode, ProviderError> {
    let (mut socket, _) = listener
        .accept()
        .await
        .map_err(|e| ProviderError::Failed(format!("Failed to accept redirect: {}", e)))?;

    let mut buffer = vec![0u8; 4096];
    let n = socket
        .read(&mut buffer)
        .await
        .map_err(|e| ProviderError::Failed(format!("Failed to read redirect: {}", e)))?;

    let request = String::from_utf8_lossy(&buffer[..n]);
    let result = parse_redirect(&request, expected_state);

    let (status, body) = match &result {
        Ok(_) => ("200 OK", SUCCESS_HTML),
        Err(_) => ("400 Bad Request", ERROR_HTML),
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;

    result
}

/// Parse `GET /callback?code=..&state=.. HTTP/1.1`
fn parse_redirect(request: &str, expected_state: &str) -> Result<AuthorizationCode, ProviderError> {
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or_else(|| ProviderError::Failed("Malformed redirect request".to_string()))?;

    let url = Url::parse(&format!("http://127.0.0.1{}", target))
        .map_err(|e| ProviderError::Failed(format!("Failed to parse redirect URL: {}", e)))?;

    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if let Some(error) = param("error") {
        if error == "access_denied" {
            return Err(ProviderError::Cancelled);
        }
        let description = param("error_description").unwrap_or_else(|| "no description".to_string());
        return Err(ProviderError::Failed(format!(
            "Authorization failed: {} - {}",
            error, description
        )));
    }

    match param("state") {
        Some(state) if state == expected_state => {}
        Some(state) => {
            return Err(ProviderError::Failed(format!(
                "State mismatch: expected {}, got {}",
                expected_state, state
            )))
        }
        None => return Err(ProviderError::Failed("Missing state parameter".to_string())),
    }

    let code = param("code")
        .ok_or_else(|| ProviderError::Failed("Missing authorization code".to_string()))?;
    Ok(AuthorizationCode { code })
}
