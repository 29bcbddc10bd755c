//! Declarative resource schema: fields, filters, lookups and lifecycle rules.

use crate::case;

/// Value domain of a field. Drives type checks, normalization and the column type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldKind {
    /// Trimmed string.
    Text,
    /// Trimmed, lower-cased string that must contain `@`.
    Email,
    /// Trimmed, lower-cased string from a fixed allow-list (order is the order reported in errors).
    Enum(&'static [&'static str]),
    /// Whole number, optionally bounded (inclusive).
    Integer { min: Option<i64>, max: Option<i64> },
    Boolean,
    /// RFC 3339 instant, stored in UTC.
    Timestamp,
}

impl FieldKind {
    /// PostgreSQL column type.
    pub fn pg_type(&self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::Email | FieldKind::Enum(_) => "text",
            FieldKind::Integer { .. } => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Timestamp => "timestamptz",
        }
    }
}

/// Who may write a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Accepted on create and update.
    Writable,
    /// Set by the server on create, accepted on update.
    UpdateOnly,
    /// Only ever set by the server.
    Managed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldDefault {
    Bool(bool),
}

impl FieldDefault {
    pub fn to_value(self) -> serde_json::Value {
        match self {
            FieldDefault::Bool(b) => serde_json::Value::Bool(b),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    /// API (camelCase) name.
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub access: Access,
    pub default: Option<FieldDefault>,
    /// Message reported when another record already holds the value. `Some` marks the field unique.
    pub unique: Option<&'static str>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        FieldSpec {
            name,
            kind,
            required: false,
            access: Access::Writable,
            default: None,
            unique: None,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub const fn one_of(name: &'static str, allowed: &'static [&'static str]) -> Self {
        Self::new(name, FieldKind::Enum(allowed))
    }

    pub const fn boolean(name: &'static str, default: bool) -> Self {
        FieldSpec {
            default: Some(FieldDefault::Bool(default)),
            ..Self::new(name, FieldKind::Boolean)
        }
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, FieldKind::Timestamp)
    }

    pub const fn required(self) -> Self {
        FieldSpec { required: true, ..self }
    }

    pub const fn unique(self, message: &'static str) -> Self {
        FieldSpec {
            unique: Some(message),
            ..self
        }
    }

    pub const fn managed(self) -> Self {
        FieldSpec {
            access: Access::Managed,
            ..self
        }
    }

    pub const fn update_only(self) -> Self {
        FieldSpec {
            access: Access::UpdateOnly,
            ..self
        }
    }

    /// Optional fields accept an explicit `null` on update to clear the stored value.
    pub fn nullable(&self) -> bool {
        !self.required
    }

    pub fn column(&self) -> String {
        case::to_snake_case(self.name)
    }

    pub fn allowed_values(&self) -> Option<&'static [&'static str]> {
        match self.kind {
            FieldKind::Enum(allowed) => Some(allowed),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterKind {
    /// Validated against the target field's allow-list, compared lower-cased.
    Enum,
    /// `"true"` means true, any other string false. `default` applies when the parameter is absent.
    Bool { default: Option<bool> },
    /// Compared verbatim.
    Exact,
}

/// Maps a list query parameter onto an equality predicate.
#[derive(Clone, Copy, Debug)]
pub struct FilterSpec {
    pub param: &'static str,
    pub field: &'static str,
    pub kind: FilterKind,
}

/// Single-record lookup served at `/{resource}/{key}`.
#[derive(Clone, Copy, Debug)]
pub enum PathLookup {
    /// Key is the numeric id.
    Id,
    /// Key matches a (unique) field exactly.
    Field(&'static str),
    /// Most recent record (by `order_by`, descending) whose `field` equals the key.
    Latest {
        field: &'static str,
        order_by: &'static str,
    },
}

/// `flag` becoming true for the first time stamps `stamp` with the current time.
#[derive(Clone, Copy, Debug)]
pub struct PublishRule {
    pub flag: &'static str,
    pub stamp: &'static str,
}

#[derive(Debug)]
pub struct ResourceSchema {
    pub path: &'static str,
    pub table: &'static str,
    /// Human name used in messages ("Blog post not found").
    pub label: &'static str,
    pub fields: &'static [FieldSpec],
    pub operations: &'static [Operation],
    pub search_fields: &'static [&'static str],
    pub filters: &'static [FilterSpec],
    /// List ordering field (descending).
    pub order_by: &'static str,
    /// Stamped with the current time on insert.
    pub created_at: &'static str,
    /// Stamped with the current time on insert and on every effective update.
    pub updated_at: Option<&'static str>,
    pub publish: Option<PublishRule>,
    pub lookup: Option<PathLookup>,
}

impl ResourceSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn allows(&self, op: Operation) -> bool {
        self.operations.contains(&op)
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.unique.is_some())
    }

    pub fn not_found_message(&self) -> String {
        format!("{} not found", self.label)
    }
}
