/// GitHub gist API client.
///
/// Implements the core `GistApi` over REST:
///   POST   /gists        -> create
///   PATCH  /gists/{id}   -> update (files merged by name)
///   GET    /gists/{id}   -> fetch (truncated files completed via raw_url)
///   DELETE /gists/{id}   -> delete
/// 404 maps to NotFound, other non-success statuses to Remote, network
/// failures to Transport.
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use slidegist_core::gist::{GistApi, GistError, GistPayload, RemoteGist};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const CLIENT_USER_AGENT: &str = "slidegist";

pub struct GithubGists {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl GithubGists {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }

    fn gist_url(&self, id: &str) -> String {
        format!("{}/gists/{}", self.base_url, id)
    }

    async fn send(&self, request: RequestBuilder, id: &str) -> Result<Response, GistError> {
        let response = request.send().await.map_err(transport_error)?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(status_error(response, id).await)
        }
    }

    async fn send_for_gist(&self, request: RequestBuilder, id: &str) -> Result<RemoteGist, GistError> {
        let response = self.send(request, id).await?;
        response
            .json::<RemoteGist>()
            .await
            .map_err(|e| GistError::Decode(e.to_string()))
    }

    /// Replace the content of truncated files with the full text from raw_url.
    /// Files that cannot be completed keep their truncated content.
    async fn complete_truncated(&self, gist: &mut RemoteGist) {
        for (name, file) in gist.files.iter_mut() {
            let Some(file) = file.as_mut() else { continue };
            if !file.truncated {
                continue;
            }
            let Some(raw_url) = file.raw_url.clone() else { continue };

            let result = self.send(self.request(Method::GET, &raw_url), &gist.id).await;
            match result {
                Ok(response) => match response.text().await {
                    Ok(text) => {
                        file.content = Some(text);
                        file.truncated = false;
                    }
                    Err(e) => log::warn!(
                        target: "slidegist.github",
                        "Reading raw {} of {} failed: {}",
                        name,
                        gist.id,
                        e
                    ),
                },
                Err(e) => log::warn!(
                    target: "slidegist.github",
                    "Fetching raw {} of {} failed: {}",
                    name,
                    gist.id,
                    e
                ),
            }
        }
    }
}

fn transport_error(e: reqwest::Error) -> GistError {
    GistError::Transport(e.to_string())
}

async fn status_error(response: Response, id: &str) -> GistError {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return GistError::NotFound(id.to_string());
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["message"].as_str().map(str::to_string))
        .unwrap_or(body);
    GistError::Remote {
        status: status.as_u16(),
        message,
    }
}

impl GistApi for GithubGists {
    async fn create(&self, payload: &GistPayload) -> Result<RemoteGist, GistError> {
        let url = format!("{}/gists", self.base_url);
        self.send_for_gist(self.request(Method::POST, &url).json(payload), "")
            .await
    }

    async fn update(&self, id: &str, payload: &GistPayload) -> Result<RemoteGist, GistError> {
        let url = self.gist_url(id);
        self.send_for_gist(self.request(Method::PATCH, &url).json(payload), id)
            .await
    }

    async fn fetch(&self, id: &str) -> Result<RemoteGist, GistError> {
        let url = self.gist_url(id);
        let mut gist = self.send_for_gist(self.request(Method::GET, &url), id).await?;
        self.complete_truncated(&mut gist).await;
        Ok(gist)
    }

    async fn delete(&self, id: &str) -> Result<(), GistError> {
        let url = self.gist_url(id);
        self.send(self.request(Method::DELETE, &url), id).await?;
        Ok(())
    }
}
