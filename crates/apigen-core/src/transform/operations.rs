use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::dependencies::operation_dependencies;
use super::name_normalizer::route_to_name;
use super::type_inference::TypeInference;
use crate::error::ResolveError;
use crate::ir::{
    Content, HttpMethod, Operation, Parameter, ParameterLocation, RequestBody, Response,
};

/// Tag for operations that declare none.
pub const DEFAULT_TAG: &str = "default";

/// Build one operation from a merged path/operation mapping.
pub fn build_operation(
    url: &str,
    method: HttpMethod,
    merged: &Map<String, Value>,
    inference: &TypeInference<'_>,
    location: &str,
) -> Result<Operation, ResolveError> {
    let resolver = inference.resolver();

    let tag = merged
        .get("tags")
        .and_then(Value::as_array)
        .and_then(|tags| tags.first())
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_TAG)
        .to_string();

    let function_name = match merged.get("operationId").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => route_to_name(method, url),
    };

    let mut parameters = Vec::new();
    if let Some(entries) = merged.get("parameters").and_then(Value::as_array) {
        for (i, entry) in entries.iter().enumerate() {
            let loc = format!("{location}.parameters.{i}");
            let entry = resolver.deref(entry, &loc)?;
            parameters.push(build_parameter(entry, inference, &loc)?);
        }
    }
    parameters.sort_by(|a, b| {
        b.required
            .cmp(&a.required)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.location.cmp(&b.location))
    });
    let parameters_locations = parameters.iter().map(|p| p.location).collect();

    let request_body = match merged.get("requestBody") {
        Some(body) => {
            let loc = format!("{location}.requestBody");
            let body = resolver.deref(body, &loc)?;
            Some(build_request_body(body, inference, &loc)?)
        }
        None => None,
    };

    let mut responses = Vec::new();
    match merged.get("responses") {
        None => {}
        Some(Value::Object(entries)) => {
            for (code, response) in entries {
                let loc = format!("{location}.responses.{code}");
                let response = resolver.deref(response, &loc)?;
                responses.push(build_response(code, response, inference, &loc)?);
            }
        }
        Some(_) => {
            return Err(ResolveError::MalformedSpec {
                location: format!("{location}.responses"),
                reason: "`responses` must be a mapping".to_string(),
            });
        }
    }
    responses.sort_by(|a, b| a.code.cmp(&b.code));
    let response_formats = responses
        .iter()
        .flat_map(|r| r.formats.iter().cloned())
        .collect();

    let dependencies = operation_dependencies(merged, resolver, location)?;

    Ok(Operation {
        url: url.to_string(),
        tag,
        method,
        function_name,
        summary: text(merged, "summary"),
        description: text(merged, "description"),
        parameters,
        parameters_locations,
        request_body,
        responses,
        response_formats,
        dependencies,
        deprecated: flag(merged.get("deprecated")),
        servers: merged.get("servers").cloned(),
        external_docs: merged.get("externalDocs").cloned(),
        callbacks: merged.get("callbacks").cloned(),
        security: merged.get("security").cloned(),
        extensions: extensions(merged),
    })
}

fn build_parameter(
    entry: &Value,
    inference: &TypeInference<'_>,
    location: &str,
) -> Result<Parameter, ResolveError> {
    let malformed = |reason: &str| ResolveError::MalformedSpec {
        location: location.to_string(),
        reason: reason.to_string(),
    };
    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("parameter has no `name`"))?;
    let parameter_in = entry
        .get("in")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("parameter has no `in`"))?;
    let location_kind = ParameterLocation::parse(parameter_in)
        .ok_or_else(|| malformed(&format!("unknown parameter location `{parameter_in}`")))?;
    let fields = entry.as_object();

    Ok(Parameter {
        name: name.to_string(),
        location: location_kind,
        required: flag(entry.get("required")),
        type_token: inference.schema_type(entry, location)?,
        deprecated: flag(entry.get("deprecated")),
        description: fields.and_then(|f| text(f, "description")),
        style: fields.and_then(|f| text(f, "style")),
        explode: flag(entry.get("explode")),
        allow_empty_value: flag(entry.get("allowEmptyValue")),
        allow_reserved: flag(entry.get("allowReserved")),
        example: entry.get("example").cloned(),
        extensions: fields.map(extensions).unwrap_or_default(),
    })
}

fn build_request_body(
    body: &Value,
    inference: &TypeInference<'_>,
    location: &str,
) -> Result<RequestBody, ResolveError> {
    let (formats, contents) = build_contents(body.get("content"), inference, location)?;
    let fields = body.as_object();
    Ok(RequestBody {
        required: flag(body.get("required")),
        description: fields.and_then(|f| text(f, "description")),
        formats,
        contents,
        extensions: fields.map(extensions).unwrap_or_default(),
    })
}

fn build_response(
    code: &str,
    response: &Value,
    inference: &TypeInference<'_>,
    location: &str,
) -> Result<Response, ResolveError> {
    let (formats, contents) = build_contents(response.get("content"), inference, location)?;
    let fields = response.as_object();
    Ok(Response {
        code: code.to_string(),
        description: fields.and_then(|f| text(f, "description")),
        formats,
        contents,
        headers: response.get("headers").cloned(),
        extensions: fields.map(extensions).unwrap_or_default(),
    })
}

/// Media types in declared order, and one [`Content`] per media type.
fn build_contents(
    content: Option<&Value>,
    inference: &TypeInference<'_>,
    location: &str,
) -> Result<(Vec<String>, Vec<Content>), ResolveError> {
    let Some(entries) = content.and_then(Value::as_object) else {
        return Ok((Vec::new(), Vec::new()));
    };
    let mut formats = Vec::with_capacity(entries.len());
    let mut contents = Vec::with_capacity(entries.len());
    for (format, entry) in entries {
        let loc = format!("{location}.content.{format}");
        formats.push(format.clone());
        contents.push(Content {
            format: format.clone(),
            type_token: inference.schema_type(entry, &loc)?,
            example: entry.get("example").cloned(),
            examples: entry.get("examples").cloned(),
            encoding: entry.get("encoding").cloned(),
            extensions: entry.as_object().map(extensions).unwrap_or_default(),
        });
    }
    Ok((formats, contents))
}

/// Vendor extension keys of a mapping, in declared order.
pub fn extensions(fields: &Map<String, Value>) -> IndexMap<String, Value> {
    fields
        .iter()
        .filter(|(key, _)| key.starts_with("x-"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Booleans may also be written as the string `"true"`; anything else is
/// false.
fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}
