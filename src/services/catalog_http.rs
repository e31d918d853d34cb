use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{TitleId, TitleSummary, TitleType},
    services::catalog::TitleCatalog,
};

/// Title catalog backed by a remote catalog service.
///
/// A 404 from the service means "unknown title"; any other non-success
/// status is an external API error the caller decides how to treat.
pub struct HttpTitleCatalog {
    http_client: HttpClient,
    api_url: String,
    api_key: Option<String>,
}

impl HttpTitleCatalog {
    pub fn new(api_url: String, api_key: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            api_key,
        }
    }
}

/// Wire format of the catalog service's title resource
#[derive(Debug, Clone, Deserialize)]
struct ApiTitle {
    id: String,
    title: String,
    #[serde(rename = "type")]
    title_type: String,
    #[serde(default)]
    release_year: Option<i32>,
}

fn to_summary(api: ApiTitle) -> AppResult<TitleSummary> {
    let id = TitleId::new(&api.id)
        .map_err(|_| AppError::ExternalApi("Catalog returned a title without an id".to_string()))?;
    Ok(TitleSummary {
        id,
        title: api.title,
        title_type: TitleType::parse(&api.title_type),
        release_year: api.release_year,
    })
}

#[async_trait]
impl TitleCatalog for HttpTitleCatalog {
    async fn get(&self, title: &TitleId) -> AppResult<Option<TitleSummary>> {
        let url = format!("{}/api/v1/titles/{}", self.api_url, title);

        let mut request = self.http_client.get(&url);
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                title = %title,
                status = %status,
                body = %body,
                "Catalog service request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "Catalog service returned status {}: {}",
                status, body
            )));
        }

        let api_title: ApiTitle = response.json().await?;
        Ok(Some(to_summary(api_title)?))
    }
}
