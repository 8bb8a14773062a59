//! Request envelope validation.
//!
//! Checks the shape of an inbound request before any codec work happens.
//! Constraints are checked in a fixed order and the first violation wins;
//! a request is either accepted whole or rejected.
//!
//! Argument *types* are deliberately not checked here. Whether `args[1]` is
//! an int is the target operation's business, decided at dispatch time.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::codec::TaggedValue;
use crate::error::ValidationError;

/// Processing domains a request can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Image,
    Algebra,
    Text,
    Video,
}

impl Domain {
    pub const ALL: [Domain; 4] = [Domain::Image, Domain::Algebra, Domain::Text, Domain::Video];

    pub fn name(self) -> &'static str {
        match self {
            Domain::Image => "image",
            Domain::Algebra => "algebra",
            Domain::Text => "text",
            Domain::Video => "video",
        }
    }

    /// Resolve a domain name. The legacy `*_process` spellings are accepted.
    pub fn from_name(name: &str) -> Option<Domain> {
        match name {
            "image" | "image_process" => Some(Domain::Image),
            "algebra" => Some(Domain::Algebra),
            "text" | "text_process" => Some(Domain::Text),
            "video" | "video_process" => Some(Domain::Video),
            _ => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated, not yet decoded, processing request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub domain: Domain,
    pub operation: String,
    pub args: Vec<TaggedValue>,
    pub kwargs: BTreeMap<String, TaggedValue>,
}

/// Validate a raw JSON request body.
///
/// Accepted forms:
///
/// ```text
/// {"domain": "image", "operation": "resize", "parameters": {"args": [...], "kwargs": {...}}}
/// {"task": "image.resize", "parameters": {...}}
/// {"task": "tasks.process_image_resize", "parameters": {...}}
/// ```
///
/// `parameters`, `args` and `kwargs` all default to empty.
pub fn validate(raw: &Json) -> Result<RequestEnvelope, ValidationError> {
    let object = raw.as_object().ok_or(ValidationError::InvalidBody)?;

    let task = object.get("task").and_then(Json::as_str);
    let task_parts = task.and_then(|t| legacy_task(t).or_else(|| t.split_once('.')));

    let domain = resolve_domain(object, task_parts)?;
    let operation = resolve_operation(object, task, task_parts)?;

    let empty = Map::new();
    let parameters = match object.get("parameters") {
        None | Some(Json::Null) => &empty,
        Some(Json::Object(parameters)) => parameters,
        Some(_) => return Err(ValidationError::InvalidParameters),
    };

    let raw_args: &[Json] = match parameters.get("args") {
        None | Some(Json::Null) => &[],
        Some(Json::Array(items)) => items.as_slice(),
        Some(_) => return Err(ValidationError::InvalidArgs),
    };
    let raw_kwargs = match parameters.get("kwargs") {
        None | Some(Json::Null) => &empty,
        Some(Json::Object(entries)) => entries,
        Some(_) => return Err(ValidationError::InvalidKwargs),
    };

    let args = raw_args
        .iter()
        .enumerate()
        .map(|(index, item)| parse_tagged(format!("args[{index}]"), item))
        .collect::<Result<Vec<_>, _>>()?;
    let kwargs = raw_kwargs
        .iter()
        .map(|(key, item)| Ok((key.clone(), parse_tagged(format!("kwargs.{key}"), item)?)))
        .collect::<Result<BTreeMap<_, _>, ValidationError>>()?;

    Ok(RequestEnvelope {
        domain,
        operation,
        args,
        kwargs,
    })
}

/// Legacy worker task names: `tasks.algebra_<op>_x_y` and
/// `tasks.process_image_<op>`.
fn legacy_task(task: &str) -> Option<(&str, &str)> {
    let name = task.strip_prefix("tasks.")?;
    if let Some(operation) = name
        .strip_prefix("algebra_")
        .and_then(|rest| rest.strip_suffix("_x_y"))
    {
        return Some(("algebra", operation));
    }
    name.strip_prefix("process_image_")
        .map(|operation| ("image", operation))
}

fn resolve_domain(
    object: &Map<String, Json>,
    task_parts: Option<(&str, &str)>,
) -> Result<Domain, ValidationError> {
    let name = match object.get("domain") {
        Some(Json::String(name)) => name.clone(),
        Some(other) => return Err(ValidationError::UnknownDomain(other.to_string())),
        None => match task_parts {
            Some((domain, _)) => domain.to_string(),
            None => return Err(ValidationError::UnknownDomain("<missing>".to_string())),
        },
    };
    Domain::from_name(&name).ok_or(ValidationError::UnknownDomain(name))
}

fn resolve_operation(
    object: &Map<String, Json>,
    task: Option<&str>,
    task_parts: Option<(&str, &str)>,
) -> Result<String, ValidationError> {
    let operation = match object.get("operation") {
        Some(value) => value.as_str(),
        None => task_parts.map(|(_, operation)| operation).or(task),
    };
    match operation.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ValidationError::MissingOperation),
    }
}

fn parse_tagged(position: String, item: &Json) -> Result<TaggedValue, ValidationError> {
    TaggedValue::deserialize(item).map_err(|e| ValidationError::MalformedArgument {
        position,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn int(value: i64) -> Json {
        json!({"type": "int", "data": value})
    }

    #[test]
    fn legacy_task_names_resolve() {
        let add = validate(&json!({
            "task": "tasks.algebra_add_x_y",
            "parameters": {"args": [int(100), int(100)]}
        }))
        .unwrap();
        assert_eq!(add.domain, Domain::Algebra);
        assert_eq!(add.operation, "add");
        assert_eq!(add.args.len(), 2);

        let resize = validate(&json!({"task": "tasks.process_image_resize"})).unwrap();
        assert_eq!(resize.domain, Domain::Image);
        assert_eq!(resize.operation, "resize");
    }

    #[test]
    fn unrecognized_legacy_task_is_unknown_domain() {
        assert_matches!(
            validate(&json!({"task": "tasks.check_celery_broker"})),
            Err(ValidationError::UnknownDomain(name)) if name == "tasks"
        );
    }

    #[test]
    fn explicit_domain_and_operation_accepted() {
        let envelope = validate(&json!({
            "domain": "image",
            "operation": "blur",
            "parameters": {"args": [int(1)], "kwargs": {"radius": int(2)}}
        }))
        .unwrap();

        assert_eq!(envelope.domain, Domain::Image);
        assert_eq!(envelope.operation, "blur");
        assert_eq!(envelope.args.len(), 1);
        assert_eq!(envelope.kwargs["radius"].data, json!(2));
    }

    #[test]
    fn domain_can_be_implicit_in_task_name() {
        let envelope = validate(&json!({"task": "algebra.add"})).unwrap();
        assert_eq!(envelope.domain, Domain::Algebra);
        assert_eq!(envelope.operation, "add");
        assert!(envelope.args.is_empty());
        assert!(envelope.kwargs.is_empty());
    }

    #[test]
    fn legacy_domain_names_accepted() {
        let envelope = validate(&json!({"domain": "image_process", "operation": "flip"})).unwrap();
        assert_eq!(envelope.domain, Domain::Image);
    }

    #[test]
    fn non_object_body_rejected() {
        assert_eq!(validate(&json!([1, 2])), Err(ValidationError::InvalidBody));
        assert_eq!(validate(&json!("resize")), Err(ValidationError::InvalidBody));
    }

    #[test]
    fn unknown_or_missing_domain_rejected() {
        assert_matches!(
            validate(&json!({"domain": "audio", "operation": "x"})),
            Err(ValidationError::UnknownDomain(name)) if name == "audio"
        );
        assert_matches!(
            validate(&json!({"operation": "resize"})),
            Err(ValidationError::UnknownDomain(_))
        );
    }

    #[test]
    fn missing_operation_rejected() {
        assert_eq!(
            validate(&json!({"domain": "image", "parameters": {"args": []}})),
            Err(ValidationError::MissingOperation)
        );
        assert_eq!(
            validate(&json!({"domain": "image", "operation": "  "})),
            Err(ValidationError::MissingOperation)
        );
        assert_eq!(
            validate(&json!({"domain": "image", "operation": 5})),
            Err(ValidationError::MissingOperation)
        );
    }

    #[test]
    fn domain_is_checked_before_operation() {
        assert_matches!(
            validate(&json!({"domain": "nope"})),
            Err(ValidationError::UnknownDomain(_))
        );
    }

    #[test]
    fn container_shapes_checked_in_order() {
        assert_eq!(
            validate(&json!({"task": "text.upper", "parameters": [1]})),
            Err(ValidationError::InvalidParameters)
        );
        assert_eq!(
            validate(&json!({"task": "text.upper", "parameters": {"args": {}, "kwargs": []}})),
            Err(ValidationError::InvalidArgs)
        );
        assert_eq!(
            validate(&json!({"task": "text.upper", "parameters": {"args": [], "kwargs": []}})),
            Err(ValidationError::InvalidKwargs)
        );
    }

    #[test]
    fn container_errors_win_over_element_errors() {
        assert_eq!(
            validate(&json!({"task": "text.upper", "parameters": {"args": [1], "kwargs": 3}})),
            Err(ValidationError::InvalidKwargs)
        );
    }

    #[test]
    fn untagged_argument_rejected_with_position() {
        assert_matches!(
            validate(&json!({"task": "text.upper", "parameters": {"args": [int(1), 42]}})),
            Err(ValidationError::MalformedArgument { position, .. }) if position == "args[1]"
        );
        assert_matches!(
            validate(&json!({"task": "text.upper", "parameters": {"kwargs": {"x": {"data": 1}}}})),
            Err(ValidationError::MalformedArgument { position, .. }) if position == "kwargs.x"
        );
    }

    #[test]
    fn argument_types_are_not_checked() {
        let envelope = validate(&json!({
            "task": "image.resize",
            "parameters": {"args": [json!({"type": "mystery", "data": null}), int(-3)]}
        }));
        assert!(envelope.is_ok());
    }
}
