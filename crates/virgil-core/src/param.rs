//! Channel parameters.
//!
//! A parameter is a named, typed, range-constrained value a channel exposes,
//! such as `gain` or `phantomPower`. On the wire it is a JSON object keyed
//! by the parameter name, with `dataType`, `value`, `readOnly`, and the
//! optional `unit`, `minValue`, `maxValue`, `precision`, and `enumValues`
//! fields.
//!
//! Numeric parameters that are writable must carry their full constraint
//! triple, and a constrained value must land on the grid
//! `min + k * precision` inside `[min, max]`. Constructors enforce this;
//! [`Parameter::is_valid`] re-derives it for values assembled by hand.

use serde_json::{Map, Value};

use crate::error::{CodecError, CodecResult};
use crate::json;

/// The declared type of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Float,
    /// Boolean.
    Bool,
    /// Free-form string.
    String,
    /// String restricted to a fixed candidate set.
    Enum,
}

impl DataType {
    /// Returns the wire string for this data type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Enum => "enum",
        }
    }

    /// Decodes a wire data-type string.
    pub fn from_wire(raw: &str, field: &str) -> CodecResult<Self> {
        match raw {
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "bool" => Ok(Self::Bool),
            "string" => Ok(Self::String),
            "enum" => Ok(Self::Enum),
            other => Err(CodecError::OutOfRange {
                field: field.to_string(),
                detail: format!(
                    "dataType must be one of int, float, bool, string, enum; got `{other}`"
                ),
            }),
        }
    }
}

/// A string value restricted to a fixed, ordered candidate set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// The current value.
    pub value: String,
    /// The candidate set the value must belong to.
    pub candidates: Vec<String>,
}

impl EnumValue {
    /// Creates an enum value. Validity is checked by [`Self::is_valid`].
    pub fn new(value: impl Into<String>, candidates: Vec<String>) -> Self {
        Self {
            value: value.into(),
            candidates,
        }
    }

    /// Returns `true` iff the candidate set is non-empty and contains the value.
    pub fn is_valid(&self) -> bool {
        !self.candidates.is_empty() && self.candidates.iter().any(|c| c == &self.value)
    }

    /// Compares two enum values; comparing an invalid enum is an error, not `false`.
    pub fn try_eq(&self, other: &Self) -> CodecResult<bool> {
        for side in [self, other] {
            if !side.is_valid() {
                return Err(CodecError::InvalidEnum {
                    value: side.value.clone(),
                    candidates: side.candidates.clone(),
                });
            }
        }
        Ok(self == other)
    }
}

/// Constraint triple for integer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntRange {
    /// Smallest allowed value.
    pub min: i64,
    /// Largest allowed value.
    pub max: i64,
    /// Grid step; allowed values are `min + k * precision`.
    pub precision: i64,
}

/// Constraint triple for float parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatRange {
    /// Smallest allowed value.
    pub min: f64,
    /// Largest allowed value.
    pub max: f64,
    /// Grid step; allowed values are `min + k * precision`.
    pub precision: f64,
}

/// A parameter's constraint triple, type-matched to its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamRange {
    /// Constraints for an integer parameter.
    Int(IntRange),
    /// Constraints for a float parameter.
    Float(FloatRange),
}

/// A parameter's current value, tagged by its data type.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// String value.
    Str(String),
    /// Constrained-enum value.
    Enum(EnumValue),
}

impl ParamValue {
    /// Returns the data type this value belongs to.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int(_) => DataType::Int,
            Self::Float(_) => DataType::Float,
            Self::Bool(_) => DataType::Bool,
            Self::Str(_) => DataType::String,
            Self::Enum(_) => DataType::Enum,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Int(v) => Value::from(*v),
            Self::Float(v) => Value::from(*v),
            Self::Bool(v) => Value::from(*v),
            Self::Str(v) => Value::from(v.clone()),
            Self::Enum(v) => Value::from(v.value.clone()),
        }
    }
}

/// Relative tolerance for the float grid-alignment check.
const FLOAT_ALIGN_EPSILON: f64 = 1e-9;

fn int_aligned(value: i64, range: &IntRange) -> bool {
    value >= range.min && value <= range.max && (value - range.min) % range.precision == 0
}

fn float_aligned(value: f64, range: &FloatRange) -> bool {
    if value < range.min || value > range.max {
        return false;
    }
    let steps = (value - range.min) / range.precision;
    (steps - steps.round()).abs() <= FLOAT_ALIGN_EPSILON * steps.abs().max(1.0)
}

/// A named, typed, range-constrained channel parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name; the wire key it is embedded under. Never empty.
    pub name: String,
    /// Current value, tagged by data type.
    pub value: ParamValue,
    /// Unit shorthand such as `dB` or `Hz`.
    pub unit: Option<String>,
    /// Constraint triple for numeric parameters.
    pub range: Option<ParamRange>,
    /// `true` if peers may only read this parameter.
    pub read_only: bool,
}

impl Parameter {
    /// Creates an integer parameter.
    ///
    /// Writable integer parameters must carry a range; a supplied range must
    /// have `min <= max` and `precision > 0`, and the value must sit on its
    /// grid.
    pub fn int(
        name: impl Into<String>,
        value: i64,
        read_only: bool,
        unit: Option<String>,
        range: Option<IntRange>,
    ) -> CodecResult<Self> {
        let name = name.into();
        Self::check_name(&name)?;
        if !read_only && range.is_none() {
            return Err(CodecError::OutOfRange {
                field: name,
                detail: "writable numeric parameters need minValue, maxValue, and precision"
                    .to_string(),
            });
        }
        if let Some(r) = &range {
            if r.min > r.max {
                return Err(CodecError::OutOfRange {
                    field: name,
                    detail: format!("minValue {} exceeds maxValue {}", r.min, r.max),
                });
            }
            if r.precision <= 0 {
                return Err(CodecError::OutOfRange {
                    field: name,
                    detail: format!("precision must be > 0, got {}", r.precision),
                });
            }
            if !int_aligned(value, r) {
                return Err(CodecError::OutOfRange {
                    field: name,
                    detail: format!(
                        "value {value} is not on the grid [{}, {}] step {}",
                        r.min, r.max, r.precision
                    ),
                });
            }
        }
        Ok(Self {
            name,
            value: ParamValue::Int(value),
            unit,
            range: range.map(ParamRange::Int),
            read_only,
        })
    }

    /// Creates a float parameter. Same constraint rules as [`Self::int`].
    pub fn float(
        name: impl Into<String>,
        value: f64,
        read_only: bool,
        unit: Option<String>,
        range: Option<FloatRange>,
    ) -> CodecResult<Self> {
        let name = name.into();
        Self::check_name(&name)?;
        if !read_only && range.is_none() {
            return Err(CodecError::OutOfRange {
                field: name,
                detail: "writable numeric parameters need minValue, maxValue, and precision"
                    .to_string(),
            });
        }
        if let Some(r) = &range {
            if r.min > r.max {
                return Err(CodecError::OutOfRange {
                    field: name,
                    detail: format!("minValue {} exceeds maxValue {}", r.min, r.max),
                });
            }
            if !(r.precision > 0.0) {
                return Err(CodecError::OutOfRange {
                    field: name,
                    detail: format!("precision must be > 0, got {}", r.precision),
                });
            }
            if !float_aligned(value, r) {
                return Err(CodecError::OutOfRange {
                    field: name,
                    detail: format!(
                        "value {value} is not on the grid [{}, {}] step {}",
                        r.min, r.max, r.precision
                    ),
                });
            }
        }
        Ok(Self {
            name,
            value: ParamValue::Float(value),
            unit,
            range: range.map(ParamRange::Float),
            read_only,
        })
    }

    /// Creates a boolean parameter.
    pub fn boolean(name: impl Into<String>, value: bool, read_only: bool) -> CodecResult<Self> {
        let name = name.into();
        Self::check_name(&name)?;
        Ok(Self {
            name,
            value: ParamValue::Bool(value),
            unit: None,
            range: None,
            read_only,
        })
    }

    /// Creates a string parameter.
    pub fn string(
        name: impl Into<String>,
        value: impl Into<String>,
        read_only: bool,
    ) -> CodecResult<Self> {
        let name = name.into();
        Self::check_name(&name)?;
        Ok(Self {
            name,
            value: ParamValue::Str(value.into()),
            unit: None,
            range: None,
            read_only,
        })
    }

    /// Creates a constrained-enum parameter; the value must be a valid enum.
    pub fn enumeration(
        name: impl Into<String>,
        value: EnumValue,
        read_only: bool,
    ) -> CodecResult<Self> {
        let name = name.into();
        Self::check_name(&name)?;
        if !value.is_valid() {
            return Err(CodecError::InvalidEnum {
                value: value.value,
                candidates: value.candidates,
            });
        }
        Ok(Self {
            name,
            value: ParamValue::Enum(value),
            unit: None,
            range: None,
            read_only,
        })
    }

    fn check_name(name: &str) -> CodecResult<()> {
        if name.is_empty() {
            return Err(CodecError::EmptyField { field: "name" });
        }
        Ok(())
    }

    /// Returns the declared data type of this parameter.
    pub fn data_type(&self) -> DataType {
        self.value.data_type()
    }

    /// Decodes a parameter payload embedded under `name`.
    ///
    /// Dispatches on the payload's `dataType`. `value` and `readOnly` are
    /// always required; `unit` is required for the numeric types and
    /// `enumValues` for enums. The constraint triple must be present
    /// together or not at all and type-matched to the value. Presence and
    /// type rules are re-checked here; grid alignment is a construction
    /// rule and is not.
    pub fn decode(name: &str, payload: &Value) -> CodecResult<Self> {
        Self::check_name(name)?;
        let obj = json::as_object(payload, name)?;
        let data_type = DataType::from_wire(json::str_field(obj, "dataType")?, "dataType")?;
        let read_only = json::bool_field(obj, "readOnly")?;
        let unit = json::opt_str_field(obj, "unit")?.map(str::to_string);

        if matches!(data_type, DataType::Int | DataType::Float) && unit.is_none() {
            return Err(CodecError::MissingField {
                field: "unit".to_string(),
            });
        }

        let raw_value = json::require(obj, "value")?;
        let value = match data_type {
            DataType::Int => {
                ParamValue::Int(raw_value.as_i64().ok_or_else(|| CodecError::WrongType {
                    field: "value".to_string(),
                    expected: "an integer",
                    found: json::type_name(raw_value),
                })?)
            }
            DataType::Float => ParamValue::Float(json::as_float(raw_value, "value")?),
            DataType::Bool => {
                ParamValue::Bool(raw_value.as_bool().ok_or_else(|| CodecError::WrongType {
                    field: "value".to_string(),
                    expected: "a boolean",
                    found: json::type_name(raw_value),
                })?)
            }
            DataType::String => {
                ParamValue::Str(
                    raw_value
                        .as_str()
                        .ok_or_else(|| CodecError::WrongType {
                            field: "value".to_string(),
                            expected: "a string",
                            found: json::type_name(raw_value),
                        })?
                        .to_string(),
                )
            }
            DataType::Enum => {
                let current = raw_value.as_str().ok_or_else(|| CodecError::WrongType {
                    field: "value".to_string(),
                    expected: "a string",
                    found: json::type_name(raw_value),
                })?;
                ParamValue::Enum(Self::decode_enum(obj, current)?)
            }
        };

        let range = Self::decode_range(obj, data_type)?;
        if matches!(data_type, DataType::Int | DataType::Float) && !read_only && range.is_none() {
            return Err(CodecError::OutOfRange {
                field: name.to_string(),
                detail: "writable numeric parameters need minValue, maxValue, and precision"
                    .to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            value,
            unit,
            range,
            read_only,
        })
    }

    fn decode_enum(obj: &Map<String, Value>, current: &str) -> CodecResult<EnumValue> {
        let raw = json::require(obj, "enumValues")?;
        let items = raw.as_array().ok_or_else(|| CodecError::WrongType {
            field: "enumValues".to_string(),
            expected: "an array",
            found: json::type_name(raw),
        })?;
        let mut candidates = Vec::with_capacity(items.len());
        for item in items {
            let s = item.as_str().ok_or_else(|| CodecError::WrongType {
                field: "enumValues".to_string(),
                expected: "an array of strings",
                found: json::type_name(item),
            })?;
            candidates.push(s.to_string());
        }
        let value = EnumValue::new(current, candidates);
        if !value.is_valid() {
            return Err(CodecError::InvalidEnum {
                value: value.value,
                candidates: value.candidates,
            });
        }
        Ok(value)
    }

    fn decode_range(obj: &Map<String, Value>, data_type: DataType) -> CodecResult<Option<ParamRange>> {
        let fields = ["minValue", "maxValue", "precision"];
        let present = fields.iter().filter(|f| obj.contains_key(**f)).count();
        if present == 0 {
            return Ok(None);
        }
        // Present together or not at all.
        for f in fields {
            if !obj.contains_key(f) {
                return Err(CodecError::MissingField {
                    field: f.to_string(),
                });
            }
        }

        match data_type {
            DataType::Int => {
                let read = |f: &str| -> CodecResult<i64> {
                    let v = json::require(obj, f)?;
                    v.as_i64().ok_or_else(|| CodecError::WrongType {
                        field: f.to_string(),
                        expected: "an integer",
                        found: json::type_name(v),
                    })
                };
                let range = IntRange {
                    min: read("minValue")?,
                    max: read("maxValue")?,
                    precision: read("precision")?,
                };
                Self::check_int_range(&range)?;
                Ok(Some(ParamRange::Int(range)))
            }
            DataType::Float => {
                let read = |f: &str| -> CodecResult<f64> {
                    json::as_float(json::require(obj, f)?, f)
                };
                let range = FloatRange {
                    min: read("minValue")?,
                    max: read("maxValue")?,
                    precision: read("precision")?,
                };
                Self::check_float_range(&range)?;
                Ok(Some(ParamRange::Float(range)))
            }
            _ => Err(CodecError::WrongType {
                field: "minValue".to_string(),
                expected: "absent for non-numeric parameters",
                found: "a constraint triple",
            }),
        }
    }

    fn check_int_range(range: &IntRange) -> CodecResult<()> {
        if range.min > range.max {
            return Err(CodecError::OutOfRange {
                field: "minValue".to_string(),
                detail: format!("minValue {} exceeds maxValue {}", range.min, range.max),
            });
        }
        if range.precision <= 0 {
            return Err(CodecError::OutOfRange {
                field: "precision".to_string(),
                detail: format!("precision must be > 0, got {}", range.precision),
            });
        }
        Ok(())
    }

    fn check_float_range(range: &FloatRange) -> CodecResult<()> {
        if range.min > range.max {
            return Err(CodecError::OutOfRange {
                field: "minValue".to_string(),
                detail: format!("minValue {} exceeds maxValue {}", range.min, range.max),
            });
        }
        if !(range.precision > 0.0) {
            return Err(CodecError::OutOfRange {
                field: "precision".to_string(),
                detail: format!("precision must be > 0, got {}", range.precision),
            });
        }
        Ok(())
    }

    /// Encodes this parameter's payload (without its name key).
    ///
    /// Optional fields are written only when present. Fails on an empty
    /// name as a defensive re-check for hand-assembled values.
    pub fn encode(&self) -> CodecResult<Value> {
        Self::check_name(&self.name)?;
        let mut obj = Map::new();
        obj.insert(
            "dataType".to_string(),
            Value::from(self.data_type().as_str()),
        );
        obj.insert("value".to_string(), self.value.to_json());
        obj.insert("readOnly".to_string(), Value::from(self.read_only));
        if let Some(unit) = &self.unit {
            obj.insert("unit".to_string(), Value::from(unit.clone()));
        }
        match &self.range {
            Some(ParamRange::Int(r)) => {
                obj.insert("minValue".to_string(), Value::from(r.min));
                obj.insert("maxValue".to_string(), Value::from(r.max));
                obj.insert("precision".to_string(), Value::from(r.precision));
            }
            Some(ParamRange::Float(r)) => {
                obj.insert("minValue".to_string(), Value::from(r.min));
                obj.insert("maxValue".to_string(), Value::from(r.max));
                obj.insert("precision".to_string(), Value::from(r.precision));
            }
            None => {}
        }
        if let ParamValue::Enum(e) = &self.value {
            obj.insert(
                "enumValues".to_string(),
                Value::Array(e.candidates.iter().cloned().map(Value::from).collect()),
            );
        }
        Ok(Value::Object(obj))
    }

    /// Inserts this parameter into `obj` under its own name.
    pub fn append_to(&self, obj: &mut Map<String, Value>) -> CodecResult<()> {
        let payload = self.encode()?;
        obj.insert(self.name.clone(), payload);
        Ok(())
    }

    /// Pure validator re-deriving every construction rule.
    ///
    /// Checks the non-empty name, the range/value type match, the writable
    /// numeric constraint requirement, the `min <= max` / `precision > 0`
    /// rules, grid alignment, and enum validity.
    pub fn is_valid(&self) -> bool {
        if self.name.is_empty() {
            return false;
        }
        match (&self.value, &self.range) {
            (ParamValue::Int(v), Some(ParamRange::Int(r))) => {
                r.min <= r.max && r.precision > 0 && int_aligned(*v, r)
            }
            (ParamValue::Int(_), Some(ParamRange::Float(_))) => false,
            (ParamValue::Int(_), None) => self.read_only,
            (ParamValue::Float(v), Some(ParamRange::Float(r))) => {
                r.min <= r.max && r.precision > 0.0 && float_aligned(*v, r)
            }
            (ParamValue::Float(_), Some(ParamRange::Int(_))) => false,
            (ParamValue::Float(_), None) => self.read_only,
            (ParamValue::Enum(e), None) => e.is_valid(),
            (ParamValue::Bool(_), None) | (ParamValue::Str(_), None) => true,
            // Non-numeric values never carry a constraint triple.
            (_, Some(_)) => false,
        }
    }
}
