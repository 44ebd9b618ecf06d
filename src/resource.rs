//! REST API resources such as `/table/incident`.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::{
    attachment::Attachment,
    error::{Error, Result},
    params::{DisplayValue, ParamsBuilder, QueryInput},
    response::{Response, ResponseOptions},
    transport::{Body, HttpRequest, Method, Transport},
    url::UrlBuilder,
};

/// Per-call options for [`Resource::get`].
///
/// ```
/// use snow_client::GetOptions;
///
/// let options = GetOptions::new()
///     .limit(10)
///     .fields(["number", "short_description"])
///     .order_by(["-sys_created_on"])
///     .stream(true);
/// assert_eq!(options.limit, Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetOptions {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub fields: Vec<String>,
    /// Sort keys, `-` prefixed for descending.
    pub order_by: Vec<String>,
    pub stream: bool,
    pub display_value: Option<DisplayValue>,
    pub exclude_reference_link: Option<bool>,
    pub suppress_pagination_header: Option<bool>,
    pub view: Option<String>,
}

impl GetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn display_value(mut self, value: impl Into<DisplayValue>) -> Self {
        self.display_value = Some(value.into());
        self
    }

    pub fn exclude_reference_link(mut self, exclude: bool) -> Self {
        self.exclude_reference_link = Some(exclude);
        self
    }

    pub fn suppress_pagination_header(mut self, suppress: bool) -> Self {
        self.suppress_pagination_header = Some(suppress);
        self
    }

    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }
}

fn expect_object(payload: &Value, action: &str) -> Result<()> {
    if payload.is_object() {
        Ok(())
    } else {
        Err(Error::InvalidUsage(format!(
            "{action} payload must be a JSON object"
        )))
    }
}

/// One API endpoint below the client's base URL.
#[derive(Clone)]
pub struct Resource {
    transport: Arc<dyn Transport>,
    url: UrlBuilder,
    parameters: ParamsBuilder,
    chunk_size: usize,
    raise_on_empty: bool,
}

impl Resource {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        url: UrlBuilder,
        parameters: ParamsBuilder,
        chunk_size: usize,
        raise_on_empty: bool,
    ) -> Self {
        debug!(path = %url.full_path(), chunk_size, "resource created");
        Resource {
            transport,
            url,
            parameters,
            chunk_size,
            raise_on_empty,
        }
    }

    /// Path relative to the base URL, e.g. `/api/now/table/incident`.
    pub fn path(&self) -> String {
        self.url.full_path()
    }

    pub fn url(&self) -> &UrlBuilder {
        &self.url
    }

    /// Parameters sent with every request of this resource.
    pub fn parameters(&self) -> &ParamsBuilder {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut ParamsBuilder {
        &mut self.parameters
    }

    pub fn get_record_link(&self, sys_id: &str) -> String {
        format!("{}/{sys_id}", self.url.get_url())
    }

    fn send(&self, request: HttpRequest, stream: bool) -> Result<Response> {
        let http = self.transport.send(request)?;
        let options = ResponseOptions {
            transport: Arc::clone(&self.transport),
            stream,
            chunk_size: self.chunk_size,
            raise_on_empty: self.raise_on_empty,
        };
        Response::new(http, options, Some(self.clone()))
    }

    /// Queries the resource.
    pub fn get(&self, query: impl Into<QueryInput>, options: GetOptions) -> Result<Response> {
        let mut params = self.parameters.clone();
        params.set_query(query)?;
        if !options.order_by.is_empty() {
            params.set_order_by(&options.order_by);
        }
        if let Some(limit) = options.limit {
            params.set_limit(limit);
        }
        if let Some(offset) = options.offset {
            params.set_offset(offset);
        }
        if !options.fields.is_empty() {
            params.set_fields(&options.fields)?;
        }
        if let Some(value) = options.display_value {
            params.set_display_value(value);
        }
        if let Some(exclude) = options.exclude_reference_link {
            params.set_exclude_reference_link(exclude);
        }
        if let Some(suppress) = options.suppress_pagination_header {
            params.set_suppress_pagination_header(suppress);
        }
        if let Some(view) = options.view {
            params.set_view(view);
        }

        let request = HttpRequest::new(Method::Get, self.url.get_url()).with_params(params.as_pairs());
        self.send(request, options.stream)
    }

    /// Creates a record. `payload` must be a JSON object.
    pub fn create(&self, payload: Value) -> Result<Response> {
        expect_object(&payload, "create")?;
        let request = HttpRequest::new(Method::Post, self.url.get_url())
            .with_params(self.parameters.as_pairs())
            .with_body(Body::Json(payload));
        self.send(request, false)
    }

    /// Fetches exactly one record matching `query`, then patches it.
    pub fn update(&self, query: impl Into<QueryInput>, payload: Value) -> Result<Response> {
        expect_object(&payload, "update")?;
        let sys_id = self.resolve_sys_id(query, "update")?;
        self.update_record(&sys_id, payload)
    }

    /// Patches the record with the given `sys_id`.
    pub fn update_record(&self, sys_id: &str, payload: Value) -> Result<Response> {
        expect_object(&payload, "update")?;
        let request = HttpRequest::new(Method::Patch, self.get_record_link(sys_id))
            .with_params(self.parameters.as_pairs())
            .with_body(Body::Json(payload));
        self.send(request, false)
    }

    /// Fetches exactly one record matching `query`, then deletes it.
    pub fn delete(&self, query: impl Into<QueryInput>) -> Result<Response> {
        let sys_id = self.resolve_sys_id(query, "delete")?;
        self.delete_record(&sys_id)
    }

    pub fn delete_record(&self, sys_id: &str) -> Result<Response> {
        let request = HttpRequest::new(Method::Delete, self.get_record_link(sys_id))
            .with_params(self.parameters.as_pairs());
        self.send(request, false)
    }

    fn resolve_sys_id(&self, query: impl Into<QueryInput>, action: &str) -> Result<String> {
        let record = self.get(query, GetOptions::default())?.one()?;
        match record.get("sys_id").and_then(Value::as_str) {
            Some(sys_id) => Ok(sys_id.to_string()),
            None => Err(Error::NoResults(format!(
                "cannot {action} a non-existing record"
            ))),
        }
    }

    /// A request of any method, optionally below a validated sub-path.
    pub fn request(
        &self,
        method: Method,
        path_append: Option<&str>,
        headers: Vec<(String, String)>,
        body: Option<Body>,
    ) -> Result<Response> {
        let url = match path_append {
            Some(path) => self.url.get_appended_custom(path)?,
            None => self.url.get_url(),
        };
        let mut request = HttpRequest::new(method, url)
            .with_params(self.parameters.as_pairs())
            .with_headers(headers);
        request.body = body;
        self.send(request, false)
    }

    /// The attachment API for this table. Only valid for `/table/<name>` resources.
    pub fn attachments(&self) -> Result<Attachment> {
        let mut components = self.url.api_path().trim_matches('/').split('/');
        let table = match (components.next(), components.next()) {
            (Some("table"), Some(table)) if !table.is_empty() => table.to_string(),
            _ => {
                return Err(Error::InvalidUsage(
                    "the attachment API can only be used with the table API".to_string(),
                ));
            }
        };

        let mut resource = self.clone();
        resource.url = self.url.with_api_path("/attachment");
        Ok(Attachment::new(resource, table))
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Resource [{}]>", self.path())
    }
}
