//! Read-only access to campaign configuration stored in Firestore.

use dsta_google_api::FirestoreClient;
use serde_json::{json, Value};

use crate::error::CampaignToolError;
use crate::prelude::*;

pub const FIRESTORE_TOOLSET: &str = "firestore";

fn join_path(collection_path: &str, document_id: &str) -> std::result::Result<String, ToolError> {
    let collection = collection_path.trim_matches('/');
    let document_id = document_id.trim_matches('/');
    if collection.is_empty() || document_id.is_empty() || document_id.contains('/') {
        return Err(ToolError::validation(
            "collection_path and a single-segment document_id are required.",
        ));
    }
    Ok(format!("{}/{}", collection, document_id))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetDocumentInput {
    /// Collection holding the document, e.g. "GoogleAdsConfig"
    pub collection_path: String,
    /// Document ID within the collection, e.g. a customer ID
    pub document_id: String,
}

#[derive(Clone, Debug)]
pub struct GetFirestoreDocumentTool {
    client: FirestoreClient,
}

impl GetFirestoreDocumentTool {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }
}

impl Tool for GetFirestoreDocumentTool {
    type Input = GetDocumentInput;

    fn name(&self) -> &str {
        "get_firestore_document"
    }

    fn description(&self) -> &str {
        "Read one Firestore document. Returns its fields as plain JSON plus `_id`."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        let path = join_path(&input.collection_path, &input.document_id)?;
        let document = self
            .client
            .get_document(&path)
            .await
            .map_err(CampaignToolError::google("Failed to read Firestore document"))?;
        tracing::debug!(%path, "read Firestore document");
        Ok(ToolResult::Json(document.to_json()))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListDocumentsInput {
    /// Collection to list, e.g. "GoogleAdsConfig/1234567890/locations"
    pub collection_path: String,
}

#[derive(Clone, Debug)]
pub struct ListFirestoreDocumentsTool {
    client: FirestoreClient,
}

impl ListFirestoreDocumentsTool {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }
}

impl Tool for ListFirestoreDocumentsTool {
    type Input = ListDocumentsInput;

    fn name(&self) -> &str {
        "list_firestore_documents"
    }

    fn description(&self) -> &str {
        "List every document of a Firestore collection or subcollection, each as plain \
         JSON with `_id`."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        let collection = input.collection_path.trim_matches('/');
        if collection.is_empty() {
            return Err(ToolError::validation("collection_path must not be empty."));
        }
        let documents = self
            .client
            .list_documents(collection)
            .await
            .map_err(CampaignToolError::google("Failed to list Firestore documents"))?;
        let documents: Vec<Value> = documents.iter().map(|d| d.to_json()).collect();
        Ok(ToolResult::Json(json!(documents)))
    }
}

#[derive(Clone, Debug)]
pub struct FirestoreToolset {
    client: FirestoreClient,
}

impl FirestoreToolset {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }
}

impl Toolset for FirestoreToolset {
    fn name(&self) -> &str {
        FIRESTORE_TOOLSET
    }

    fn tools(&self) -> Vec<Box<dyn DynTool>> {
        box_tools![
            GetFirestoreDocumentTool::new(self.client.clone()),
            ListFirestoreDocumentsTool::new(self.client.clone()),
        ]
    }
}
