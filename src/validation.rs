//! Declarative request validation.
//!
//! Each request shape is described by a static rule table; `validate` checks
//! the raw field map against it and collects every violation instead of
//! stopping at the first. No side effects happen here.

use crate::error::FieldError;
use serde_json::Value;
use std::collections::HashMap;

/// Enumerated category values accepted for app records.
pub const APP_CATEGORIES: &[&str] = &["d-only", "d-and-d"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Contact,
    Login,
    AppCreate,
    AppEdit,
    ProjectCreate,
    ProjectEdit,
}

#[derive(Debug, Clone, Copy)]
enum Check {
    Text,
    Email,
    Url,
    Category,
    Id,
}

struct FieldRule {
    name: &'static str,
    check: Check,
}

const CONTACT_RULES: &[FieldRule] = &[
    FieldRule {
        name: "fullName",
        check: Check::Text,
    },
    FieldRule {
        name: "contact",
        check: Check::Email,
    },
    FieldRule {
        name: "message",
        check: Check::Text,
    },
];

const LOGIN_RULES: &[FieldRule] = &[
    FieldRule {
        name: "email",
        check: Check::Email,
    },
    FieldRule {
        name: "password",
        check: Check::Text,
    },
];

const APP_RULES: &[FieldRule] = &[
    FieldRule {
        name: "title",
        check: Check::Text,
    },
    FieldRule {
        name: "content",
        check: Check::Text,
    },
    FieldRule {
        name: "link",
        check: Check::Url,
    },
    FieldRule {
        name: "category",
        check: Check::Category,
    },
    FieldRule {
        name: "table",
        check: Check::Text,
    },
];

const PROJECT_RULES: &[FieldRule] = &[
    FieldRule {
        name: "title",
        check: Check::Text,
    },
    FieldRule {
        name: "content",
        check: Check::Text,
    },
    FieldRule {
        name: "link",
        check: Check::Url,
    },
    FieldRule {
        name: "table",
        check: Check::Text,
    },
];

const ID_RULE: FieldRule = FieldRule {
    name: "id",
    check: Check::Id,
};

fn rules(kind: SchemaKind) -> (&'static [FieldRule], bool) {
    match kind {
        SchemaKind::Contact => (CONTACT_RULES, false),
        SchemaKind::Login => (LOGIN_RULES, false),
        SchemaKind::AppCreate => (APP_RULES, false),
        SchemaKind::AppEdit => (APP_RULES, true),
        SchemaKind::ProjectCreate => (PROJECT_RULES, false),
        SchemaKind::ProjectEdit => (PROJECT_RULES, true),
    }
}

/// Validate `fields` against the schema for `kind`.
///
/// Returns every violated constraint, one `FieldError` per field. Unknown
/// fields are ignored; required fields must be present and non-empty.
pub fn validate(
    kind: SchemaKind,
    fields: &HashMap<String, String>,
) -> Result<(), Vec<FieldError>> {
    let (rule_set, wants_id) = rules(kind);
    let mut errors = Vec::new();

    for rule in rule_set {
        check_field(rule, fields, &mut errors);
    }
    if wants_id {
        check_field(&ID_RULE, fields, &mut errors);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn check_field(rule: &FieldRule, fields: &HashMap<String, String>, errors: &mut Vec<FieldError>) {
    let value = fields.get(rule.name).map(String::as_str).unwrap_or("");
    if value.trim().is_empty() {
        errors.push(FieldError::new(
            rule.name,
            format!("{} is required", rule.name),
        ));
        return;
    }

    match rule.check {
        Check::Text => {}
        Check::Email => {
            if !is_email(value) {
                errors.push(FieldError::new(
                    rule.name,
                    format!("{} must be a valid email address", rule.name),
                ));
            }
        }
        Check::Url => {
            if !is_http_url(value) {
                errors.push(FieldError::new(
                    rule.name,
                    format!("{} must be a valid URL", rule.name),
                ));
            }
        }
        Check::Category => {
            if !APP_CATEGORIES.contains(&value) {
                errors.push(FieldError::new(
                    rule.name,
                    format!(
                        "{} must be one of: {}",
                        rule.name,
                        APP_CATEGORIES.join(", ")
                    ),
                ));
            }
        }
        Check::Id => {
            if !matches!(value.parse::<i64>(), Ok(id) if id > 0) {
                errors.push(FieldError::new(
                    rule.name,
                    format!("{} must be a positive integer", rule.name),
                ));
            }
        }
    }
}

fn is_email(value: &str) -> bool {
    if value.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn is_http_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Flatten the top level of a JSON body into the string field map the
/// schemas operate on. Strings pass through, numbers are stringified,
/// anything else is dropped and will surface as a missing field.
pub fn value_fields(body: &Value) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    if let Some(object) = body.as_object() {
        for (key, value) in object {
            match value {
                Value::String(s) => {
                    fields.insert(key.clone(), s.clone());
                }
                Value::Number(n) => {
                    fields.insert(key.clone(), n.to_string());
                }
                _ => {}
            }
        }
    }
    fields
}
