//! Customer record schema: the 19 input fields, their domains and form defaults

use crate::error::SchemaError;
use std::fmt;

/// Number of input fields in a customer record
pub const FIELD_COUNT: usize = 19;

const GENDER: &[&str] = &["Female", "Male"];
const YES_NO: &[&str] = &["Yes", "No"];
const MULTIPLE_LINES: &[&str] = &["No phone service", "No", "Yes"];
const INTERNET_SERVICE: &[&str] = &["DSL", "Fiber optic", "No"];
const ADD_ON: &[&str] = &["No", "Yes", "No internet service"];
const CONTRACT: &[&str] = &["Month-to-month", "One year", "Two year"];
const PAYMENT_METHOD: &[&str] = &[
    "Electronic check",
    "Mailed check",
    "Bank transfer (automatic)",
    "Credit card (automatic)",
];

/// A named input column of the customer record, in dataset column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Gender,
    SeniorCitizen,
    Partner,
    Dependents,
    Tenure,
    PhoneService,
    MultipleLines,
    InternetService,
    OnlineSecurity,
    OnlineBackup,
    DeviceProtection,
    TechSupport,
    StreamingTv,
    StreamingMovies,
    Contract,
    PaperlessBilling,
    PaymentMethod,
    MonthlyCharges,
    TotalCharges,
}

/// How a field's raw text is validated and stored
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// One of a fixed set of labels
    Categorical(&'static [&'static str]),
    /// 0/1 indicator
    Flag,
    /// Non-negative whole number
    Count,
    /// Non-negative finite amount
    Amount,
}

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Gender,
        Field::SeniorCitizen,
        Field::Partner,
        Field::Dependents,
        Field::Tenure,
        Field::PhoneService,
        Field::MultipleLines,
        Field::InternetService,
        Field::OnlineSecurity,
        Field::OnlineBackup,
        Field::DeviceProtection,
        Field::TechSupport,
        Field::StreamingTv,
        Field::StreamingMovies,
        Field::Contract,
        Field::PaperlessBilling,
        Field::PaymentMethod,
        Field::MonthlyCharges,
        Field::TotalCharges,
    ];

    /// Column name as it appears in the dataset and in exported files
    pub fn name(self) -> &'static str {
        match self {
            Field::Gender => "gender",
            Field::SeniorCitizen => "SeniorCitizen",
            Field::Partner => "Partner",
            Field::Dependents => "Dependents",
            Field::Tenure => "tenure",
            Field::PhoneService => "PhoneService",
            Field::MultipleLines => "MultipleLines",
            Field::InternetService => "InternetService",
            Field::OnlineSecurity => "OnlineSecurity",
            Field::OnlineBackup => "OnlineBackup",
            Field::DeviceProtection => "DeviceProtection",
            Field::TechSupport => "TechSupport",
            Field::StreamingTv => "StreamingTV",
            Field::StreamingMovies => "StreamingMovies",
            Field::Contract => "Contract",
            Field::PaperlessBilling => "PaperlessBilling",
            Field::PaymentMethod => "PaymentMethod",
            Field::MonthlyCharges => "MonthlyCharges",
            Field::TotalCharges => "TotalCharges",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.name() == name)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Gender => FieldKind::Categorical(GENDER),
            Field::Partner | Field::Dependents | Field::PhoneService | Field::PaperlessBilling => {
                FieldKind::Categorical(YES_NO)
            }
            Field::MultipleLines => FieldKind::Categorical(MULTIPLE_LINES),
            Field::InternetService => FieldKind::Categorical(INTERNET_SERVICE),
            Field::OnlineSecurity
            | Field::OnlineBackup
            | Field::DeviceProtection
            | Field::TechSupport
            | Field::StreamingTv
            | Field::StreamingMovies => FieldKind::Categorical(ADD_ON),
            Field::Contract => FieldKind::Categorical(CONTRACT),
            Field::PaymentMethod => FieldKind::Categorical(PAYMENT_METHOD),
            Field::SeniorCitizen => FieldKind::Flag,
            Field::Tenure => FieldKind::Count,
            Field::MonthlyCharges | Field::TotalCharges => FieldKind::Amount,
        }
    }

    /// Allowed labels for categorical fields, `None` for numeric ones
    pub fn domain(self) -> Option<&'static [&'static str]> {
        match self.kind() {
            FieldKind::Categorical(domain) => Some(domain),
            _ => None,
        }
    }

    /// Validate raw user text into a typed value
    pub fn parse(self, raw: &str) -> Result<Value, SchemaError> {
        let text = raw.trim();
        let invalid = |reason: &'static str| SchemaError::InvalidNumber {
            field: self.name(),
            value: text.to_string(),
            reason,
        };

        match self.kind() {
            FieldKind::Categorical(domain) => domain
                .iter()
                .find(|label| **label == text)
                .map(|label| Value::Category(*label))
                .ok_or_else(|| SchemaError::OutOfDomain {
                    field: self.name(),
                    value: text.to_string(),
                    allowed: domain,
                }),
            FieldKind::Flag => match text.parse::<u32>() {
                Ok(flag @ (0 | 1)) => Ok(Value::Integer(flag)),
                _ => Err(invalid("expected 0 or 1")),
            },
            FieldKind::Count => text
                .parse::<u32>()
                .map(Value::Integer)
                .map_err(|_| invalid("expected a non-negative whole number")),
            FieldKind::Amount => {
                let amount: f64 = text.parse().map_err(|_| invalid("expected a number"))?;
                if !amount.is_finite() {
                    return Err(invalid("must be finite"));
                }
                if amount < 0.0 {
                    return Err(invalid("must not be negative"));
                }
                Ok(Value::Real(amount))
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated field value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Category(&'static str),
    Integer(u32),
    Real(f64),
}

impl Value {
    pub fn as_category(&self) -> Option<&'static str> {
        match self {
            Value::Category(label) => Some(*label),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Category(_) => None,
            Value::Integer(n) => Some(f64::from(*n)),
            Value::Real(x) => Some(*x),
        }
    }
}

/// Values pre-selected by the input form, in `Field::ALL` order
pub const FORM_DEFAULTS: [(Field, &str); FIELD_COUNT] = [
    (Field::Gender, "Female"),
    (Field::SeniorCitizen, "0"),
    (Field::Partner, "Yes"),
    (Field::Dependents, "Yes"),
    (Field::Tenure, "12"),
    (Field::PhoneService, "Yes"),
    (Field::MultipleLines, "No phone service"),
    (Field::InternetService, "DSL"),
    (Field::OnlineSecurity, "No"),
    (Field::OnlineBackup, "No"),
    (Field::DeviceProtection, "No"),
    (Field::TechSupport, "No"),
    (Field::StreamingTv, "No"),
    (Field::StreamingMovies, "No"),
    (Field::Contract, "Month-to-month"),
    (Field::PaperlessBilling, "Yes"),
    (Field::PaymentMethod, "Electronic check"),
    (Field::MonthlyCharges, "70.0"),
    (Field::TotalCharges, "500.0"),
];

/// A fully validated customer record. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    values: [Value; FIELD_COUNT],
}

impl CustomerRecord {
    /// Build a record from `(column name, raw value)` pairs.
    ///
    /// Every one of the 19 fields must be present exactly once.
    pub fn from_fields<I, K, V>(fields: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut slots: [Option<Value>; FIELD_COUNT] = [None; FIELD_COUNT];

        for (name, raw) in fields {
            let field = lookup(name.as_ref())?;
            let slot = &mut slots[field.index()];
            if slot.is_some() {
                return Err(SchemaError::DuplicateField(field.name()));
            }
            *slot = Some(field.parse(raw.as_ref())?);
        }

        let mut values = [Value::Integer(0); FIELD_COUNT];
        for field in Field::ALL {
            values[field.index()] =
                slots[field.index()].ok_or(SchemaError::MissingField(field.name()))?;
        }

        Ok(Self { values })
    }

    /// Build a record from partial form input; unspecified fields take
    /// their `FORM_DEFAULTS` value.
    pub fn from_form<I, K, V>(overrides: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut form: Vec<String> = FORM_DEFAULTS.iter().map(|(_, v)| v.to_string()).collect();
        let mut seen = [false; FIELD_COUNT];

        for (name, raw) in overrides {
            let field = lookup(name.as_ref())?;
            if std::mem::replace(&mut seen[field.index()], true) {
                return Err(SchemaError::DuplicateField(field.name()));
            }
            form[field.index()] = raw.as_ref().to_string();
        }

        Self::from_fields(
            Field::ALL
                .iter()
                .map(|field| (field.name(), form[field.index()].as_str())),
        )
    }

    pub fn get(&self, field: Field) -> Value {
        self.values[field.index()]
    }

    /// Iterate over fields in column order
    pub fn iter(&self) -> impl Iterator<Item = (Field, Value)> + '_ {
        Field::ALL.iter().map(move |&field| (field, self.get(field)))
    }

    pub fn tenure(&self) -> u32 {
        match self.get(Field::Tenure) {
            Value::Integer(months) => months,
            _ => 0,
        }
    }

    pub fn monthly_charges(&self) -> f64 {
        self.get(Field::MonthlyCharges).as_f64().unwrap_or_default()
    }
}

fn lookup(name: &str) -> Result<Field, SchemaError> {
    let name = name.trim();
    Field::from_name(name).ok_or_else(|| SchemaError::UnknownField(name.to_string()))
}
