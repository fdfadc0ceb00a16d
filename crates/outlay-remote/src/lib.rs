// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod wire;

use anyhow::{Context, Result, anyhow, bail};
use outlay_app::{
    ExpenseId, ExpenseRecord, ExpenseUpdate, Gateway, GatewayOp, NewExpense, StoreResultExt,
    StoreUnavailable,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::wire::{Document, DocumentBody, ErrorEnvelope, ListResponse};

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_COLLECTION: &str = "expenses";
pub const DEFAULT_PAGE_SIZE: u32 = 300;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the document store lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub base_url: String,
    pub project_id: String,
    pub collection: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub page_size: u32,
}

impl RemoteSettings {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            project_id: project_id.into(),
            collection: DEFAULT_COLLECTION.to_owned(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Client for one collection of a Firestore-compatible REST endpoint.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    collection_url: Url,
    api_key: Option<String>,
    page_size: u32,
    http: HttpClient,
}

impl Client {
    pub fn new(settings: &RemoteSettings) -> Result<Self> {
        let base_url = settings.base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("remote.base_url must not be empty");
        }
        if settings.project_id.trim().is_empty() {
            bail!("remote.project_id must not be empty");
        }
        if settings.collection.trim().is_empty() || settings.collection.contains('/') {
            bail!(
                "remote.collection must be a single collection name, got {:?}",
                settings.collection
            );
        }
        if settings.page_size == 0 {
            bail!("remote.page_size must be positive");
        }

        let collection_url = Url::parse(&format!(
            "{base_url}/projects/{}/databases/(default)/documents/{}",
            settings.project_id, settings.collection
        ))
        .with_context(|| format!("remote.base_url {base_url:?} is not a valid URL"))?;

        let http = HttpClient::builder()
            .timeout(settings.timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            collection_url,
            api_key: settings.api_key.clone().filter(|key| !key.is_empty()),
            page_size: settings.page_size,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn collection_url(&self) -> &str {
        self.collection_url.as_str()
    }

    /// Every document of the collection, following page tokens until the
    /// listing is exhausted. Fails if any document cannot be decoded.
    pub fn list_documents(&self) -> Result<Vec<ExpenseRecord>> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self.collection_url.clone();
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &self.page_size.to_string());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }
            let response = self.send(self.http.get(self.with_key(url)))?;
            let page: ListResponse = response.json().context("decode document list")?;

            // One unreadable document fails the whole listing; a partial
            // snapshot would hide it from the user.
            for document in &page.documents {
                let record = wire::decode_document(document).with_context(|| {
                    format!(
                        "document {} is not a readable expense -- fix or delete it in the store",
                        document.name
                    )
                })?;
                records.push(record);
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) if page_token.as_deref() != Some(token.as_str()) => {
                    page_token = Some(token);
                }
                _ => break,
            }
        }
        debug!(count = records.len(), "listed documents");
        Ok(records)
    }

    pub fn create_document(&self, expense: &NewExpense) -> Result<ExpenseId> {
        let body = wire::encode_new(expense)?;
        let response = self.send(
            self.http
                .post(self.with_key(self.collection_url.clone()))
                .json(&body),
        )?;
        let created: Document = response.json().context("decode created document")?;
        let id = wire::document_id(&created.name)?;
        debug!(%id, "created document");
        Ok(id)
    }

    /// Patches only the fields in `update`. The store rejects the call when
    /// the document does not exist.
    pub fn patch_document(&self, id: &ExpenseId, update: &ExpenseUpdate) -> Result<()> {
        let mut url = self.document_url(id)?;
        {
            let mut query = url.query_pairs_mut();
            for field in update.field_names() {
                query.append_pair("updateMask.fieldPaths", field);
            }
            query.append_pair("currentDocument.exists", "true");
        }
        let body: DocumentBody = wire::encode_update(update)?;
        self.send(self.http.patch(self.with_key(url)).json(&body))?;
        Ok(())
    }

    pub fn delete_document(&self, id: &ExpenseId) -> Result<()> {
        let url = self.document_url(id)?;
        self.send(self.http.delete(self.with_key(url)))?;
        Ok(())
    }

    fn document_url(&self, id: &ExpenseId) -> Result<Url> {
        if id.is_empty() {
            bail!("expense id must not be empty");
        }
        let mut url = self.collection_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("remote.base_url cannot carry a document path"))?
            .push(id.as_str());
        Ok(url)
    }

    fn with_key(&self, mut url: Url) -> Url {
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        url
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(response)
    }
}

impl Gateway for Client {
    fn list_all(&mut self) -> Result<Vec<ExpenseRecord>, StoreUnavailable> {
        self.list_documents().during(GatewayOp::ListAll)
    }

    fn create(&mut self, expense: &NewExpense) -> Result<(), StoreUnavailable> {
        self.create_document(expense)
            .map(|_| ())
            .during(GatewayOp::Create)
    }

    fn update(&mut self, id: &ExpenseId, update: &ExpenseUpdate) -> Result<(), StoreUnavailable> {
        self.patch_document(id, update).during(GatewayOp::Update)
    }

    fn remove(&mut self, id: &ExpenseId) -> Result<(), StoreUnavailable> {
        self.delete_document(id).during(GatewayOp::Remove)
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!("cannot reach {base_url} -- check remote.base_url and your network ({error})")
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.message.is_empty()
    {
        if error.status.is_empty() {
            return anyhow!("server error ({}): {}", status.as_u16(), error.message);
        }
        return anyhow!(
            "server error ({} {}): {}",
            status.as_u16(),
            error.status,
            error.message
        );
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}
