use heck::{ToPascalCase, ToSnakeCase};

use crate::ir::HttpMethod;

/// Derive a camelCase operation name from HTTP method + path, used when an
/// operation declares no `operationId`.
///
/// Examples:
/// - `GET /pets` → `listPets`
/// - `POST /pets` → `createPets`
/// - `GET /pets/{petId}` → `getPet`
/// - `PUT /pets/{petId}` → `updatePet`
/// - `GET /pets/{petId}/visits` → `listPetsVisits`
pub fn route_to_name(method: HttpMethod, path: &str) -> String {
    let mut resource_parts: Vec<&str> = Vec::new();
    let mut ends_with_param = false;

    for seg in path.split('/').filter(|s| !s.is_empty()) {
        if seg.starts_with('{') && seg.ends_with('}') {
            ends_with_param = true;
        } else {
            resource_parts.push(seg);
            ends_with_param = false;
        }
    }

    let prefix = match method {
        HttpMethod::Get if ends_with_param => "get",
        HttpMethod::Get => "list",
        HttpMethod::Post => "create",
        HttpMethod::Put => "update",
        other => other.as_str(),
    };

    let last = resource_parts.len().saturating_sub(1);
    let mut name = prefix.to_string();
    for (i, part) in resource_parts.iter().enumerate() {
        // Only a trailing `/{id}` addresses a single item
        let word = if i == last && ends_with_param {
            singularize(part)
        } else {
            part.to_string()
        };
        name.push_str(&sanitize_identifier(&word).to_pascal_case());
    }
    name
}

/// Naive singularization: strips a trailing plural suffix.
fn singularize(word: &str) -> String {
    if word.ends_with("ies") && word.len() > 3 {
        format!("{}y", &word[..word.len() - 3])
    } else if word.ends_with("ses") || word.ends_with("xes") || word.ends_with("zes") {
        word[..word.len() - 2].to_string()
    } else if word.ends_with('s') && !word.ends_with("ss") && word.len() > 1 {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Upper-case only the first character, leaving the rest untouched.
///
/// Unlike a PascalCase conversion this keeps `gpsCoords` as `GpsCoords`
/// and `id_ref` as `Id_ref`, so synthesized names stay recognisable.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-case only the first character.
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A snake_case identifier safe to use as a file or module name.
pub fn snake_identifier(name: &str) -> String {
    let snake = sanitize_identifier(name).to_snake_case();
    match snake.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("_{snake}"),
        Some(_) => snake,
        None => "unnamed".to_string(),
    }
}

/// Replace runs of non-alphanumeric characters with a single `_`.
fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_was_separator = false;

    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if prev_was_separator && !result.is_empty() {
                result.push('_');
            }
            result.push(ch);
            prev_was_separator = false;
        } else {
            prev_was_separator = true;
        }
    }

    result
}
