/// MCP server exposing the response store.
///
/// Exposes six tools:
/// - `list_sections`: non-empty categories with their responses, in display order
/// - `list_category`: responses in one category
/// - `get_response`: look up a response by ID
/// - `copy_response`: fetch a response's content for the clipboard
/// - `add_response`: create a response
/// - `delete_response`: remove a response
///
/// Notices raised by the store during a call are drained into that call's result.
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::backend::Backend;
use crate::model::{Category, ResponseRecord};
use crate::notify::{Notice, NoticeBoard};
use crate::store::ResponseStore;

pub type DeskStore = ResponseStore<Backend, Arc<NoticeBoard>>;

#[derive(Clone)]
pub struct ResponseDeskServer {
    store: Arc<RwLock<DeskStore>>,
    notices: Arc<NoticeBoard>,
    tool_router: ToolRouter<ResponseDeskServer>,
}

impl ResponseDeskServer {
    /// `store` must already be loaded, and must notify through `notices`.
    pub fn new(store: DeskStore, notices: Arc<NoticeBoard>) -> Self {
        debug_assert!(store.is_loaded(), "store must be loaded before serving");
        Self {
            store: Arc::new(RwLock::new(store)),
            notices,
            tool_router: Self::tool_router(),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListCategoryParams {
    /// Category key: "general", "pricing", "objections" or "advantages".
    category: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ResponseIdParams {
    id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AddResponseParams {
    title: String,
    content: String,
    /// Category key (default: "general").
    category: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct SectionView {
    key: String,
    label: String,
    icon: String,
    responses: Vec<ResponseRecord>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct SectionsResponse {
    sections: Vec<SectionView>,
    total: usize,
}

#[derive(Debug, Serialize, JsonSchema)]
struct CategoryResponse {
    category: String,
    /// Display label, absent for keys outside the known categories.
    label: Option<String>,
    responses: Vec<ResponseRecord>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct CopyResponse {
    id: String,
    content: String,
    notices: Vec<Notice>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct AddResponse {
    response: ResponseRecord,
    total: usize,
    notices: Vec<Notice>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct DeleteResponse {
    deleted: Option<ResponseRecord>,
    total: usize,
    notices: Vec<Notice>,
}

#[tool_router]
impl ResponseDeskServer {
    #[tool(description = "List every non-empty response category in display order, with its label, icon tag and responses.")]
    async fn list_sections(&self) -> Result<Json<SectionsResponse>, String> {
        let store = self.store.read().await;
        let sections = store
            .sections()
            .into_iter()
            .map(|s| SectionView {
                key: s.category.key().to_string(),
                label: s.category.label().to_string(),
                icon: s.category.icon().to_string(),
                responses: s.records.into_iter().cloned().collect(),
            })
            .collect();
        Ok(Json(SectionsResponse {
            sections,
            total: store.len(),
        }))
    }

    #[tool(description = "List the responses in one category, in the order they were added.")]
    async fn list_category(
        &self,
        Parameters(params): Parameters<ListCategoryParams>,
    ) -> Result<Json<CategoryResponse>, String> {
        let key = params.category.trim().to_string();
        if key.is_empty() {
            return Err("category must not be empty".to_string());
        }
        let store = self.store.read().await;
        let responses = store.by_category(&key).cloned().collect();
        Ok(Json(CategoryResponse {
            label: Category::from_key(&key).map(|c| c.label().to_string()),
            category: key,
            responses,
        }))
    }

    #[tool(description = "Look up a single response by its ID.")]
    async fn get_response(
        &self,
        Parameters(params): Parameters<ResponseIdParams>,
    ) -> Result<Json<ResponseRecord>, String> {
        let store = self.store.read().await;
        store
            .get(&params.id)
            .cloned()
            .map(Json)
            .ok_or_else(|| format!("unknown response id: {:?}", params.id))
    }

    #[tool(description = "Return a response's content ready to paste to a customer.")]
    async fn copy_response(
        &self,
        Parameters(params): Parameters<ResponseIdParams>,
    ) -> Result<Json<CopyResponse>, String> {
        // Write lock keeps this call's notices separate from concurrent calls.
        let store = self.store.write().await;
        let content = store.copy(&params.id).map(str::to_string);
        let notices = self.notices.drain();
        let content = content.ok_or_else(|| format!("unknown response id: {:?}", params.id))?;
        Ok(Json(CopyResponse {
            id: params.id,
            content,
            notices,
        }))
    }

    #[tool(description = "Add a response. Title and content must not be blank; category defaults to \"general\".")]
    async fn add_response(
        &self,
        Parameters(params): Parameters<AddResponseParams>,
    ) -> Result<Json<AddResponse>, String> {
        let category = params
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| Category::default().key().to_string());

        let mut store = self.store.write().await;
        let result = store.add(&params.title, &params.content, &category).await;
        let notices = self.notices.drain();
        let response = result.map_err(|e| format!("invalid response: {e}"))?;
        Ok(Json(AddResponse {
            response,
            total: store.len(),
            notices,
        }))
    }

    #[tool(description = "Delete a response by ID. Deleting an unknown ID is not an error.")]
    async fn delete_response(
        &self,
        Parameters(params): Parameters<ResponseIdParams>,
    ) -> Result<Json<DeleteResponse>, String> {
        let mut store = self.store.write().await;
        let deleted = store.delete(&params.id).await;
        Ok(Json(DeleteResponse {
            deleted,
            total: store.len(),
            notices: self.notices.drain(),
        }))
    }
}

#[tool_handler]
impl ServerHandler for ResponseDeskServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "response-desk".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Canned customer-service responses grouped into categories (general, pricing, \
objections, advantages). Use list_sections to browse, copy_response to fetch text for a reply, \
and add_response/delete_response to maintain the collection. Mutating calls return the notices \
raised while they ran, including warnings when a change could not be stored durably."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{LocalKv, LocalKvBackend};
    use crate::notify::NoticeKind;
    use desk_common::kv::{KeyValueStore, MemoryKv};

    const KEY: &str = "test:collection";

    async fn server_over(kv: MemoryKv) -> ResponseDeskServer {
        let notices = Arc::new(NoticeBoard::new());
        let backend = Backend::Local(LocalKvBackend::new(LocalKv::Memory(kv), KEY));
        let mut store = ResponseStore::new(backend, Arc::clone(&notices));
        store.load().await;
        ResponseDeskServer::new(store, notices)
    }

    async fn loaded_server() -> ResponseDeskServer {
        server_over(MemoryKv::new()).await
    }

    fn id(id: &str) -> Parameters<ResponseIdParams> {
        Parameters(ResponseIdParams { id: id.to_string() })
    }

    #[test]
    fn tools_publish_output_schemas() {
        let tools = ResponseDeskServer::tool_router().list_all();
        for name in [
            "list_sections",
            "list_category",
            "get_response",
            "copy_response",
            "add_response",
            "delete_response",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }

    #[tokio::test]
    async fn add_then_list_category() {
        let server = loaded_server().await;
        let Json(added) = server
            .add_response(Parameters(AddResponseParams {
                title: "T".to_string(),
                content: "C".to_string(),
                category: Some(" pricing ".to_string()),
            }))
            .await
            .unwrap();
        assert_eq!(added.total, 6);
        assert_eq!(added.response.category, "pricing");
        assert_eq!(added.notices.len(), 1);
        assert_eq!(added.notices[0].kind, NoticeKind::Success);

        let Json(listed) = server
            .list_category(Parameters(ListCategoryParams {
                category: "pricing".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(listed.responses.len(), 2);
        assert_eq!(listed.label.as_deref(), Some(Category::Pricing.label()));
    }

    #[tokio::test]
    async fn add_without_category_defaults_to_general() {
        let server = loaded_server().await;
        let Json(added) = server
            .add_response(Parameters(AddResponseParams {
                title: "T".to_string(),
                content: "C".to_string(),
                category: None,
            }))
            .await
            .unwrap();
        assert_eq!(added.response.category, "general");
    }

    #[tokio::test]
    async fn blank_add_is_rejected_and_notices_are_consumed() {
        let server = loaded_server().await;
        let Err(err) = server
            .add_response(Parameters(AddResponseParams {
                title: " ".to_string(),
                content: "C".to_string(),
                category: None,
            }))
            .await
        else {
            panic!("blank title accepted");
        };
        assert!(err.contains("title"));
        assert!(server.notices.drain().is_empty());

        let Json(sections) = server.list_sections().await.unwrap();
        assert_eq!(sections.total, 5);
    }

    #[tokio::test]
    async fn sections_and_delete() {
        let server = loaded_server().await;
        let Json(sections) = server.list_sections().await.unwrap();
        let keys: Vec<_> = sections.sections.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["general", "pricing", "objections", "advantages"]);
        assert_eq!(sections.sections[0].icon, "message-circle");

        let Json(deleted) = server
            .delete_response(Parameters(ResponseIdParams {
                id: "5".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(deleted.deleted.map(|r| r.id).as_deref(), Some("5"));
        assert_eq!(deleted.total, 4);

        let Json(sections) = server.list_sections().await.unwrap();
        assert_eq!(sections.sections.len(), 3);

        let Json(missing) = server
            .delete_response(Parameters(ResponseIdParams {
                id: "5".to_string(),
            }))
            .await
            .unwrap();
        assert!(missing.deleted.is_none());
        assert!(missing.notices.is_empty());
    }

    #[tokio::test]
    async fn copy_and_get() {
        let server = loaded_server().await;
        let Json(record) = server
            .get_response(Parameters(ResponseIdParams {
                id: "1".to_string(),
            }))
            .await
            .unwrap();

        let Json(copied) = server
            .copy_response(Parameters(ResponseIdParams {
                id: "1".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(copied.content, record.content);
        assert_eq!(copied.notices.len(), 1);

        assert!(server
            .copy_response(Parameters(ResponseIdParams {
                id: "404".to_string(),
            }))
            .await
            .is_err());
        assert!(server.notices.drain().is_empty());
    }

    #[tokio::test]
    async fn ids_are_matched_verbatim() {
        let kv = MemoryKv::new();
        let stored = vec![ResponseRecord {
            id: " 7 ".to_string(),
            title: "T".to_string(),
            content: "C".to_string(),
            category: "general".to_string(),
        }];
        kv.set(KEY, &serde_json::to_string(&stored).unwrap())
            .await
            .unwrap();
        let server = server_over(kv).await;

        let Json(record) = server.get_response(id(" 7 ")).await.unwrap();
        assert_eq!(record.content, "C");

        let Err(err) = server.get_response(id("7")).await else {
            panic!("trimmed id matched");
        };
        assert_eq!(err, "unknown response id: \"7\"");

        let Json(copied) = server.copy_response(id(" 7 ")).await.unwrap();
        assert_eq!(copied.id, " 7 ");
        assert!(server.copy_response(id("7")).await.is_err());

        let Json(missing) = server.delete_response(id("7")).await.unwrap();
        assert!(missing.deleted.is_none());
        let Json(deleted) = server.delete_response(id(" 7 ")).await.unwrap();
        assert_eq!(deleted.deleted.map(|r| r.id).as_deref(), Some(" 7 "));
        assert_eq!(deleted.total, 0);
    }
}
