//! Google Drive API wire types
//!
//! Request bodies and response payloads for the Drive v3 calls the
//! connector makes.

use serde::{Deserialize, Serialize};

use crate::backend::{Node, NodeId, NodeKind, FOLDER_MIME_TYPE};

/// Google Drive API file resource, trimmed to the fields we request
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,

    /// Absent when the request's `fields` did not ask for it
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(default)]
    pub parents: Vec<String>,
}

impl DriveFile {
    pub fn into_node(self) -> Node {
        let kind = self
            .mime_type
            .as_deref()
            .map(NodeKind::from_mime_type)
            .unwrap_or(NodeKind::File);

        Node {
            id: NodeId::new(self.id),
            name: self.name,
            kind,
            parent_id: self.parents.into_iter().next().map(NodeId::new),
        }
    }
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,

    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Metadata body for files.create and resumable upload initiation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadataRequest<'a> {
    pub name: &'a str,
    pub parents: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<&'a str>,
}

impl<'a> FileMetadataRequest<'a> {
    pub fn folder(name: &'a str, parent_id: &'a NodeId) -> Self {
        Self {
            name,
            parents: [parent_id.as_str()],
            mime_type: Some(FOLDER_MIME_TYPE),
        }
    }

    pub fn file(name: &'a str, parent_id: &'a NodeId) -> Self {
        Self {
            name,
            parents: [parent_id.as_str()],
            mime_type: None,
        }
    }
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_file_into_node() {
        let json = r#"{
            "id": "1xYz",
            "name": "reports",
            "mimeType": "application/vnd.google-apps.folder",
            "parents": ["0AbC"]
        }"#;

        let node = serde_json::from_str::<DriveFile>(json).unwrap().into_node();
        assert_eq!(node.id.as_str(), "1xYz");
        assert_eq!(node.name, "reports");
        assert!(node.is_folder());
        assert_eq!(node.parent_id, Some(NodeId::new("0AbC")));
    }

    #[test]
    fn test_drive_file_minimal_fields() {
        let node = serde_json::from_str::<DriveFile>(r#"{"id": "f1"}"#)
            .unwrap()
            .into_node();
        assert_eq!(node.kind, NodeKind::File);
        assert!(node.name.is_empty());
        assert!(node.parent_id.is_none());
    }

    #[test]
    fn test_files_list_without_files_key() {
        let list: FilesListResponse = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
        assert!(list.next_page_token.is_none());
    }

    #[test]
    fn test_metadata_request_serialization() {
        let parent = NodeId::root();
        let folder = serde_json::to_value(FileMetadataRequest::folder("a", &parent)).unwrap();
        assert_eq!(
            folder,
            serde_json::json!({
                "name": "a",
                "parents": ["root"],
                "mimeType": FOLDER_MIME_TYPE
            })
        );

        let file = serde_json::to_value(FileMetadataRequest::file("f.txt", &parent)).unwrap();
        assert_eq!(file, serde_json::json!({ "name": "f.txt", "parents": ["root"] }));
    }

    #[test]
    fn test_api_error_envelope() {
        let body = r#"{"error": {"code": 404, "message": "File not found: abc.", "errors": []}}"#;
        let parsed: ApiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "File not found: abc.");
    }
}
