//! The outcome of a request: record access, cardinality checks, pagination.

use std::fmt;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::{
    decoder::{ResultStream, decode_buffered},
    error::{Error, Result},
    resource::Resource,
    transport::{HttpRequest, HttpResponse, Method, Transport},
};

/// How a response is read.
#[derive(Clone)]
pub struct ResponseOptions {
    pub transport: Arc<dyn Transport>,
    /// Decode records straight off the byte stream instead of parsing the whole body first.
    pub stream: bool,
    pub chunk_size: usize,
    /// Raise [`Error::NoResults`] on empty results instead of returning an empty object.
    pub raise_on_empty: bool,
}

enum Page {
    Stream(ResultStream<Box<dyn Read + Send>>),
    Buffered(std::vec::IntoIter<Value>),
}

enum PageKind {
    Deleted,
    Empty,
    Body,
}

/// Sorts a page by method and status. Statuses outside the handled cases are errors.
fn classify(http: &HttpResponse) -> Result<PageKind> {
    match (http.method, http.status) {
        (Method::Delete, 204) => Ok(PageKind::Deleted),
        (Method::Get, 404) => Ok(PageKind::Empty),
        _ if http.is_success() => Ok(PageKind::Body),
        _ => Err(Error::Http {
            method: http.method.to_string(),
            url: http.url.clone(),
            status: http.status,
        }),
    }
}

/// A GET 202 only carries records when its body has content.
fn check_accepted(mut http: HttpResponse) -> Result<HttpResponse> {
    if http.method != Method::Get || http.status != 202 {
        return Ok(http);
    }
    let mut body = Vec::new();
    http.body.read_to_end(&mut body)?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::EmptyContent(format!("{} {}", http.method, http.url)));
    }
    http.body = Box::new(Cursor::new(body));
    Ok(http)
}

/// What [`Response::one`] settled on.
#[derive(Debug, Clone)]
enum Cardinality {
    Empty,
    Single(Value),
    Multiple,
}

/// Records returned by one request, across all of its pages.
///
/// Records are read forward only. Pages announced through a `rel="next"`
/// link are fetched when the previous page runs out.
pub struct Response {
    options: ResponseOptions,
    method: Method,
    status: u16,
    url: String,
    pending: Option<HttpResponse>,
    current: Option<Page>,
    next_link: Option<String>,
    count: usize,
    first_record: Option<Value>,
    resolved: Option<Cardinality>,
    resource: Option<Resource>,
}

impl Response {
    /// Wraps a transport response. Fails right away on statuses that carry no records.
    pub fn new(
        http: HttpResponse,
        options: ResponseOptions,
        resource: Option<Resource>,
    ) -> Result<Self> {
        let http = check_accepted(http)?;
        classify(&http)?;
        Ok(Response {
            options,
            method: http.method,
            status: http.status,
            url: http.url.clone(),
            pending: Some(http),
            current: None,
            next_link: None,
            count: 0,
            first_record: None,
            resolved: None,
            resource,
        })
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_stream(&self) -> bool {
        self.options.stream
    }

    /// Records decoded so far.
    pub fn count(&self) -> usize {
        self.count
    }

    fn open_page(&self, http: HttpResponse) -> Result<Page> {
        Ok(match classify(&http)? {
            PageKind::Deleted => {
                Page::Buffered(vec![json!({"status": "record deleted"})].into_iter())
            }
            PageKind::Empty => Page::Buffered(Vec::new().into_iter()),
            PageKind::Body if self.options.stream => {
                Page::Stream(ResultStream::new(http.body, self.options.chunk_size))
            }
            PageKind::Body => Page::Buffered(decode_buffered(http.body)?.into_iter()),
        })
    }

    fn next_record(&mut self) -> Result<Option<Value>> {
        loop {
            if let Some(page) = self.current.as_mut() {
                let item = match page {
                    Page::Stream(stream) => stream.next(),
                    Page::Buffered(records) => records.next().map(Ok),
                };
                match item {
                    Some(Ok(record)) => {
                        self.count += 1;
                        if self.count == 1 {
                            self.first_record = Some(record.clone());
                        }
                        return Ok(Some(record));
                    }
                    Some(Err(e)) => {
                        self.current = None;
                        self.next_link = None;
                        return Err(e);
                    }
                    None => self.current = None,
                }
            }

            let http = match self.pending.take() {
                Some(http) => http,
                None => match self.next_link.take() {
                    Some(url) => {
                        debug!(url = %url, "following pagination link");
                        let http = self
                            .options
                            .transport
                            .send(HttpRequest::new(Method::Get, url))?;
                        check_accepted(http)?
                    }
                    None => return Ok(None),
                },
            };
            self.next_link = http.next_link().map(str::to_string);
            self.current = Some(self.open_page(http)?);
        }
    }

    /// Iterates all remaining records, following pagination links.
    pub fn all(&mut self) -> Records<'_> {
        Records { response: self }
    }

    fn empty(&self) -> Result<Value> {
        if self.options.raise_on_empty {
            Err(Error::NoResults("no records found".to_string()))
        } else {
            Ok(Value::Object(Map::new()))
        }
    }

    fn guard_first(&self) -> Result<()> {
        if self.options.stream {
            Ok(())
        } else {
            Err(Error::InvalidUsage(
                "first() is only available when stream=true".to_string(),
            ))
        }
    }

    /// The first record. Only available on streamed responses.
    ///
    /// Once [`Response::one`] has run, this returns the record it read first.
    pub fn first(&mut self) -> Result<Value> {
        match self.first_or_none()? {
            Some(record) => Ok(record),
            None => self.empty(),
        }
    }

    pub fn first_or_none(&mut self) -> Result<Option<Value>> {
        self.guard_first()?;
        match self.resolved {
            Some(Cardinality::Empty) => Ok(None),
            Some(_) => Ok(self.first_record.clone()),
            None => self.next_record(),
        }
    }

    /// Counts every record handed out so far, not only the unread ones.
    fn resolve(&mut self) -> Result<Cardinality> {
        let first = match self.count {
            0 => self.next_record()?,
            1 => self.first_record.clone(),
            _ => return Ok(Cardinality::Multiple),
        };
        let Some(record) = first else {
            return Ok(Cardinality::Empty);
        };
        if self.next_record()?.is_some() {
            return Ok(Cardinality::Multiple);
        }
        Ok(Cardinality::Single(record))
    }

    fn take_one(&mut self) -> Result<Option<Value>> {
        let cardinality = match &self.resolved {
            Some(cardinality) => cardinality.clone(),
            None => {
                let cardinality = self.resolve()?;
                self.resolved = Some(cardinality.clone());
                cardinality
            }
        };

        match cardinality {
            Cardinality::Empty => Ok(None),
            Cardinality::Single(record) => Ok(Some(record)),
            Cardinality::Multiple => Err(Error::MultipleResults(
                "expected single-record result, got multiple".to_string(),
            )),
        }
    }

    /// Exactly one record.
    pub fn one(&mut self) -> Result<Value> {
        match self.take_one()? {
            Some(record) => Ok(record),
            None => self.empty(),
        }
    }

    /// At most one record. Still fails on more than one.
    pub fn one_or_none(&mut self) -> Result<Option<Value>> {
        self.take_one()
    }

    /// A field of the single record, see [`Response::one`].
    pub fn get(&mut self, field: &str) -> Result<Option<Value>> {
        Ok(self.one()?.get(field).cloned())
    }

    fn bound_record(&mut self, action: &str) -> Result<(Resource, String)> {
        let resource = self.resource.clone().ok_or_else(|| {
            Error::InvalidUsage(format!("cannot {action}: response is not bound to a resource"))
        })?;
        let record = self.one()?;
        match record.get("sys_id").and_then(Value::as_str) {
            Some(sys_id) => Ok((resource, sys_id.to_string())),
            None => Err(Error::NoResults(format!(
                "cannot {action} a non-existing record"
            ))),
        }
    }

    /// Updates the single record this response resolves to.
    pub fn update(&mut self, payload: Value) -> Result<Response> {
        let (resource, sys_id) = self.bound_record("update")?;
        resource.update_record(&sys_id, payload)
    }

    /// Deletes the single record this response resolves to.
    pub fn delete(&mut self) -> Result<Response> {
        let (resource, sys_id) = self.bound_record("delete")?;
        resource.delete_record(&sys_id)
    }

    /// Attaches a file to the single record this response resolves to.
    pub fn upload(&mut self, file_path: &Path) -> Result<Response> {
        let (resource, sys_id) = self.bound_record("upload to")?;
        resource.attachments()?.upload(&sys_id, file_path, None, false)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Response [{} - {}]>", self.status, self.method)
    }
}

/// Iterator returned by [`Response::all`].
pub struct Records<'a> {
    response: &'a mut Response,
}

impl Records<'_> {
    pub fn count(&self) -> usize {
        self.response.count
    }
}

impl Iterator for Records<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.response.next_record().transpose()
    }
}
