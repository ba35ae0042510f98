use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// HTTP method. Variant order is the order methods are scanned in a path
/// item, and the tie-breaker when sorting operations of one url.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// The lowercase key used in a path item.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }
}

/// Where a parameter is carried. Ordering is alphabetical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Cookie,
    Header,
    Path,
    Query,
}

impl ParameterLocation {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cookie" => Some(ParameterLocation::Cookie),
            "header" => Some(ParameterLocation::Header),
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            _ => None,
        }
    }
}

/// One (path, method) pair after path-level defaults were merged in.
#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    pub url: String,
    pub tag: String,
    pub method: HttpMethod,
    pub function_name: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: Vec<Parameter>,
    pub parameters_locations: BTreeSet<ParameterLocation>,
    pub request_body: Option<RequestBody>,
    pub responses: Vec<Response>,
    pub response_formats: BTreeSet<String>,
    pub dependencies: BTreeSet<String>,
    pub deprecated: bool,
    pub servers: Option<Value>,
    pub external_docs: Option<Value>,
    pub callbacks: Option<Value>,
    pub security: Option<Value>,
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    #[serde(rename = "type")]
    pub type_token: Option<String>,
    pub deprecated: bool,
    pub description: Option<String>,
    pub style: Option<String>,
    pub explode: bool,
    pub allow_empty_value: bool,
    pub allow_reserved: bool,
    pub example: Option<Value>,
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestBody {
    pub required: bool,
    pub description: Option<String>,
    /// Media types in declared order.
    pub formats: Vec<String>,
    pub contents: Vec<Content>,
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub code: String,
    pub description: Option<String>,
    pub formats: Vec<String>,
    pub contents: Vec<Content>,
    pub headers: Option<Value>,
    pub extensions: IndexMap<String, Value>,
}

/// A single media type entry of a body or response.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub format: String,
    #[serde(rename = "type")]
    pub type_token: Option<String>,
    pub example: Option<Value>,
    pub examples: Option<Value>,
    pub encoding: Option<Value>,
    pub extensions: IndexMap<String, Value>,
}
