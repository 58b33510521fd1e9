//! Naming resolver for schema components.
//!
//! Named records keep their own name. Anonymous records take the name of
//! their traversal context: the nearest named ancestor followed by the
//! capitalized field names leading to them, with `Item` appended for every
//! sequence level crossed. The same shape at the same context path always
//! gets the same name.

use http::Method;

/// Name given to an anonymous record with no context at all.
pub const ANONYMOUS: &str = "AnonymousStruct";

/// Uppercase the first character.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Context for a field of the record named `parent`.
pub fn field_context(parent: &str, json_name: &str) -> String {
    format!("{}{}", parent, capitalize(json_name))
}

/// Context for the elements of a sequence found under `context`.
pub fn item_context(context: &str) -> String {
    format!("{}Item", context)
}

/// Component name for a record: its own name, else the context, else
/// [`ANONYMOUS`].
pub fn record_name(own: Option<&str>, context: &str) -> String {
    match own {
        Some(name) if !name.is_empty() => name.to_string(),
        _ if !context.is_empty() => context.to_string(),
        _ => ANONYMOUS.to_string(),
    }
}

/// Context for the anonymous parts of an operation, e.g. `GET /items/:id`
/// gives `GetItemsById`.
pub fn operation_context(method: &Method, path: &str) -> String {
    let mut name = capitalize(&method.as_str().to_lowercase());
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        match segment.strip_prefix(':').or_else(|| segment.strip_prefix('*')) {
            Some(param) => {
                name.push_str("By");
                name.push_str(&pascal(param));
            }
            None => name.push_str(&pascal(segment)),
        }
    }
    name
}

fn pascal(segment: &str) -> String {
    segment
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| capitalize(&part.to_lowercase()))
        .collect()
}

/// Human summary, e.g. `Get /items/by ID`.
pub fn summary(method: &Method, path: &str) -> String {
    let readable: Vec<String> = path
        .split('/')
        .map(|segment| {
            let is_param = segment.starts_with(':')
                || segment.starts_with('*')
                || (segment.starts_with('{') && segment.ends_with('}'));
            if is_param {
                "by ID".to_string()
            } else {
                segment.to_string()
            }
        })
        .collect();
    let readable = readable.join("/");
    let verb = match *method {
        Method::GET => "Get",
        Method::POST => "Create",
        Method::PUT => "Update",
        Method::DELETE => "Delete",
        Method::PATCH => "Patch",
        _ => return format!("{} {}", method, readable),
    };
    format!("{} {}", verb, readable)
}
