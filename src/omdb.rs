use anyhow::{Context, Result, anyhow};
use futures::FutureExt;
use futures::future::BoxFuture;
use image::DynamicImage;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// A single entry from the search endpoint. Order is whatever the server returned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
  #[serde(rename = "imdbID")]
  pub id: String,
  #[serde(rename = "Title", default)]
  pub title: String,
  #[serde(rename = "Year", default)]
  pub year: String,
  #[serde(rename = "Poster", default)]
  pub poster_url: String,
}

/// Full record from the detail endpoint. Every field arrives as a string; `N/A` marks a missing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MovieDetail {
  #[serde(rename = "imdbID", default)]
  pub id: String,
  #[serde(rename = "Title", default)]
  pub title: String,
  #[serde(rename = "Poster", default)]
  pub poster: String,
  #[serde(rename = "Year", default)]
  pub year: String,
  /// `"<int> min"`
  #[serde(rename = "Runtime", default)]
  pub runtime: String,
  #[serde(rename = "imdbRating", default)]
  pub imdb_rating: String,
  #[serde(rename = "Plot", default)]
  pub plot: String,
  #[serde(rename = "Released", default)]
  pub released: String,
  #[serde(rename = "Actors", default)]
  pub actors: String,
  #[serde(rename = "Director", default)]
  pub director: String,
  #[serde(rename = "Genre", default)]
  pub genre: String,
}

/// Why a search produced no results.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
  /// Non-success status or a broken connection.
  #[error("error fetching data")]
  Transport,
  /// The API answered `Response: "False"`; the message is shown verbatim.
  #[error("{0}")]
  Api(String),
  #[error("unreadable response: {0}")]
  Decode(String),
  /// Superseded by a newer query. Never shown to the user.
  #[error("request was cancelled")]
  Cancelled,
  #[error("search task failed")]
  TaskFailed,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
  #[serde(rename = "Response", default)]
  response: String,
  #[serde(rename = "Search", default)]
  search: Vec<SearchResult>,
  #[serde(rename = "Error")]
  error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
  #[serde(rename = "Response", default)]
  response: String,
  #[serde(rename = "Error")]
  error: Option<String>,
  #[serde(flatten)]
  detail: MovieDetail,
}

/// Turn a search response body into either the result list or a logical failure.
fn interpret_search(body: &str) -> Result<Vec<SearchResult>, SearchError> {
  let parsed: SearchResponse = serde_json::from_str(body).map_err(|e| SearchError::Decode(e.to_string()))?;
  if parsed.response == "False" {
    return Err(SearchError::Api(parsed.error.unwrap_or_else(|| "Unknown error".to_string())));
  }
  Ok(parsed.search)
}

fn interpret_detail(body: &str) -> Result<MovieDetail> {
  let parsed: DetailResponse = serde_json::from_str(body).context("Failed to parse movie detail")?;
  if parsed.response == "False" {
    return Err(anyhow!(parsed.error.unwrap_or_else(|| "Movie not found".to_string())));
  }
  Ok(parsed.detail)
}

/// Where movie data comes from. `App` talks to this so tests can script responses.
pub trait MovieSource: Send + Sync {
  fn search(&self, query: String) -> BoxFuture<'static, Result<Vec<SearchResult>, SearchError>>;
  fn detail(&self, id: String) -> BoxFuture<'static, Result<MovieDetail>>;
  fn poster(&self, url: String) -> BoxFuture<'static, Result<DynamicImage>>;
}

#[derive(Clone)]
pub struct OmdbClient {
  http: Client,
  base_url: Url,
  api_key: String,
}

impl OmdbClient {
  pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
    let base_url = Url::parse(base_url).with_context(|| format!("Invalid OMDb base URL: {}", base_url))?;
    Ok(Self { http: Client::new(), base_url, api_key: api_key.into() })
  }

  fn endpoint(&self, param: &str, value: &str) -> Url {
    let mut url = self.base_url.clone();
    url.query_pairs_mut().append_pair("apikey", &self.api_key).append_pair(param, value);
    url
  }

  pub async fn search_movies(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
    let response = self.http.get(self.endpoint("s", query)).send().await.map_err(|e| {
      warn!(err = %e, "omdb: search request failed");
      SearchError::Transport
    })?;
    if !response.status().is_success() {
      warn!(status = %response.status(), "omdb: search returned non-success status");
      return Err(SearchError::Transport);
    }
    let body = response.text().await.map_err(|e| SearchError::Decode(e.to_string()))?;
    interpret_search(&body)
  }

  pub async fn movie_detail(&self, id: &str) -> Result<MovieDetail> {
    let response = self.http.get(self.endpoint("i", id)).send().await.context("Failed to reach OMDb")?;
    if !response.status().is_success() {
      return Err(anyhow!("OMDb returned {}", response.status()));
    }
    let body = response.text().await.context("Failed to read movie detail")?;
    interpret_detail(&body)
  }

  pub async fn fetch_poster(&self, url: &str) -> Result<DynamicImage> {
    let response = self.http.get(url).send().await.with_context(|| format!("Failed to fetch poster {}", url))?;
    if !response.status().is_success() {
      return Err(anyhow!("Poster request returned {}", response.status()));
    }
    let bytes = response.bytes().await.with_context(|| format!("Failed to read poster bytes from {}", url))?;
    let image = image::load_from_memory(&bytes).with_context(|| format!("Failed to decode poster (URL: {})", url))?;
    debug!(url, width = image.width(), height = image.height(), "omdb: poster decoded");
    Ok(image)
  }
}

impl MovieSource for OmdbClient {
  fn search(&self, query: String) -> BoxFuture<'static, Result<Vec<SearchResult>, SearchError>> {
    let client = self.clone();
    async move { client.search_movies(&query).await }.boxed()
  }

  fn detail(&self, id: String) -> BoxFuture<'static, Result<MovieDetail>> {
    let client = self.clone();
    async move { client.movie_detail(&id).await }.boxed()
  }

  fn poster(&self, url: String) -> BoxFuture<'static, Result<DynamicImage>> {
    let client = self.clone();
    async move { client.fetch_poster(&url).await }.boxed()
  }
}

/// `Poster` values worth downloading. OMDb uses `N/A` when there is none.
pub fn has_poster(url: &str) -> bool {
  url.starts_with("http://") || url.starts_with("https://")
}
