//! Request body schemas.
//!
//! Each schema is a static list of field rules applied to the raw JSON body.
//! A successful pass yields a normalized object (trimmed, lowercased, defaults
//! filled, unknown keys dropped) that deserializes into the typed input.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use super::repo_types::DEFAULT_ROLE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Rule for one string field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    name: &'static str,
    default: Option<&'static str>,
    trim: bool,
    lowercase: bool,
    email: bool,
    min: usize,
    max: usize,
}

impl FieldRule {
    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            default: None,
            trim: false,
            lowercase: false,
            email: false,
            min: 0,
            max: usize::MAX,
        }
    }

    pub const fn optional(self, default: &'static str) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    pub const fn trimmed(self) -> Self {
        Self { trim: true, ..self }
    }

    pub const fn lowercased(self) -> Self {
        Self {
            lowercase: true,
            ..self
        }
    }

    pub const fn email(self) -> Self {
        Self { email: true, ..self }
    }

    pub const fn min(self, min: usize) -> Self {
        Self { min, ..self }
    }

    pub const fn max(self, max: usize) -> Self {
        Self { max, ..self }
    }

    fn apply(&self, raw: Option<&Value>) -> Result<Option<String>, String> {
        let raw = match raw {
            None | Some(Value::Null) => {
                return match self.default {
                    Some(d) => Ok(Some(d.to_string())),
                    None => Err("Required".into()),
                };
            }
            Some(Value::String(s)) => s,
            Some(_) => return Err("Expected string".into()),
        };

        let mut value = if self.trim { raw.trim().to_string() } else { raw.clone() };
        if self.lowercase {
            value = value.to_lowercase();
        }

        let len = value.chars().count();
        if len < self.min {
            return Err(if self.min == 1 {
                "Must not be empty".into()
            } else {
                format!("Must be at least {} characters", self.min)
            });
        }
        if len > self.max {
            return Err(format!("Must be at most {} characters", self.max));
        }
        if self.email && !is_valid_email(&value) {
            return Err("Invalid email address".into());
        }
        Ok(Some(value))
    }
}

pub struct Schema(&'static [FieldRule]);

pub const SIGN_UP: Schema = Schema(&[
    FieldRule::string("name").trimmed().min(1).max(255),
    FieldRule::string("email").trimmed().lowercased().max(255).email(),
    FieldRule::string("password").min(6).max(128),
    FieldRule::string("role").trimmed().min(1).max(50).optional(DEFAULT_ROLE),
]);

pub const SIGN_IN: Schema = Schema(&[
    FieldRule::string("email").trimmed().lowercased().max(255).email(),
    FieldRule::string("password").min(1),
]);

impl Schema {
    /// Validate every field and collect all failures.
    pub fn validate(&self, body: &Value) -> Result<Value, Vec<FieldError>> {
        let Some(obj) = body.as_object() else {
            return Err(vec![FieldError::new("body", "Expected object")]);
        };

        let mut out = Map::new();
        let mut errors = Vec::new();
        for rule in self.0 {
            match rule.apply(obj.get(rule.name)) {
                Ok(Some(v)) => {
                    out.insert(rule.name.to_string(), Value::String(v));
                }
                Ok(None) => {}
                Err(message) => errors.push(FieldError::new(rule.name, message)),
            }
        }

        if errors.is_empty() {
            Ok(Value::Object(out))
        } else {
            Err(errors)
        }
    }

    pub fn parse<T: DeserializeOwned>(&self, body: &Value) -> Result<T, Vec<FieldError>> {
        let normalized = self.validate(body)?;
        serde_json::from_value(normalized)
            .map_err(|e| vec![FieldError::new("body", e.to_string())])
    }
}
