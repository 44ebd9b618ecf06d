//! Attachments of one table.

use std::path::Path;

use tracing::debug;

use crate::{
    error::{Error, Result},
    resource::{GetOptions, Resource},
    response::Response,
    transport::{Body, Method},
};

/// Default page size when listing a table's attachments.
pub const DEFAULT_LIST_LIMIT: u64 = 100;

/// Lists, uploads and deletes attachments for a table.
///
/// Obtained from [`Resource::attachments`].
#[derive(Debug, Clone)]
pub struct Attachment {
    resource: Resource,
    table_name: String,
}

impl Attachment {
    pub(crate) fn new(resource: Resource, table_name: String) -> Self {
        Attachment {
            resource,
            table_name,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Attachments of one record, or of the whole table when `sys_id` is `None`.
    pub fn get(&self, sys_id: Option<&str>, limit: u64) -> Result<Response> {
        match sys_id {
            Some(sys_id) => self.resource.get(
                vec![("table_sys_id", sys_id), ("table_name", self.table_name.as_str())],
                GetOptions::default(),
            ),
            None => self.resource.get(
                vec![("table_name", self.table_name.as_str())],
                GetOptions::new().limit(limit),
            ),
        }
    }

    /// Attaches the file at `file_path` to record `sys_id`.
    ///
    /// `name` defaults to the file's base name. With `multipart` the file is
    /// posted as form data to `/upload`, otherwise as a raw body to `/file`.
    pub fn upload(
        &self,
        sys_id: &str,
        file_path: &Path,
        name: Option<&str>,
        multipart: bool,
    ) -> Result<Response> {
        let name = match name {
            Some(name) => name.to_string(),
            None => file_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    Error::InvalidUsage(format!(
                        "'{}' does not name a file",
                        file_path.display()
                    ))
                })?,
        };
        let data = std::fs::read(file_path)?;
        debug!(table = %self.table_name, sys_id, file = %name, size = data.len(), multipart, "uploading attachment");

        let mut resource = self.resource.clone();
        resource.parameters_mut().add_custom([
            ("table_name", self.table_name.as_str()),
            ("table_sys_id", sys_id),
            ("file_name", name.as_str()),
        ]);

        let content_type = "application/octet-stream".to_string();
        let (path, body) = if multipart {
            (
                "/upload",
                Body::Multipart {
                    file_name: name,
                    data,
                    content_type,
                },
            )
        } else {
            ("/file", Body::Bytes { data, content_type })
        };

        resource.request(Method::Post, Some(path), Vec::new(), Some(body))
    }

    /// Deletes the attachment record `sys_id`.
    pub fn delete(&self, sys_id: &str) -> Result<Response> {
        self.resource.delete(vec![("sys_id", sys_id)])
    }
}
