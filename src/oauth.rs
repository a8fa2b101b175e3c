//! Browser side of the authorization code flow.

use std::collections::HashMap;

use async_trait::async_trait;
use chosei_graph::auth::{AuthorizationResponse, Interaction};
use chosei_graph::{GraphError, GraphResult};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use url::Url;

/// Opens the system browser and catches the redirect on localhost.
pub struct BrowserInteraction {
    redirect_address: String,
}

impl BrowserInteraction {
    pub fn new(redirect_address: String) -> Self {
        Self { redirect_address }
    }
}

#[async_trait]
impl Interaction for BrowserInteraction {
    async fn authorize(&self, authorize_url: &Url) -> GraphResult<AuthorizationResponse> {
        // Bind before opening the browser so a fast redirect is not missed.
        let listener = TcpListener::bind(&self.redirect_address).await?;

        eprintln!("\nOpen this URL in your browser to sign in:\n");
        eprintln!("{}\n", authorize_url);

        if open::that(authorize_url.as_str()).is_err() {
            eprintln!("(Could not open browser automatically, please copy the URL above)");
        }

        let params = wait_for_callback(listener).await?;

        if let Some(error) = params.get("error") {
            let description = params.get("error_description").unwrap_or(error);
            return Err(GraphError::Auth(description.clone()));
        }

        let code = params
            .get("code")
            .ok_or_else(|| GraphError::Auth("No code in callback".into()))?;
        let state = params
            .get("state")
            .ok_or_else(|| GraphError::Auth("No state in callback".into()))?;

        Ok(AuthorizationResponse {
            code: code.clone(),
            state: state.clone(),
        })
    }
}

async fn wait_for_callback(listener: TcpListener) -> GraphResult<HashMap<String, String>> {
    let (stream, _) = listener.accept().await?;

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    let url_part = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| GraphError::Auth("Invalid HTTP request".into()))?;

    let url = Url::parse(&format!("http://localhost{}", url_part))
        .map_err(|e| GraphError::Auth(format!("Invalid callback URL: {e}")))?;

    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    let message = if params.contains_key("code") {
        "サインインが完了しました。このウィンドウを閉じてターミナルに戻ってください。"
    } else {
        "サインインに失敗しました。ターミナルを確認してください。"
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html; charset=utf-8\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body><h1>chosei</h1><p>{message}</p></body></html>"
    );

    let mut stream = reader.into_inner();
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;

    Ok(params)
}
