pub mod attachment;
pub mod cli;
pub mod client;
pub mod criterion;
pub mod decoder;
pub mod error;
pub mod params;
pub mod query_builder;
pub mod resource;
pub mod response;
pub mod transport;
pub mod url;

pub use attachment::Attachment;
pub use client::{Client, ClientBuilder};
pub use criterion::{Criterion, DateTimeOn, Field, Order, Table};
pub use decoder::{ResultStream, decode_buffered};
pub use error::{Error, Result};
pub use params::{DisplayValue, ParamsBuilder, QueryInput};
pub use query_builder::{BuilderState, QueryBuilder};
pub use resource::{GetOptions, Resource};
pub use response::{Records, Response, ResponseOptions};
pub use transport::{Auth, Body, HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
