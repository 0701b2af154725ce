use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One of the 13 clinical inputs, in canonical feature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Age,
    Sex,
    Cp,
    Trestbps,
    Chol,
    Fbs,
    Restecg,
    Thalach,
    Exang,
    Oldpeak,
    Slope,
    Ca,
    Thal,
}

/// Validation rule attached to a field. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldRule {
    Integer { min: i64, max: i64 },
    Float { min: f64, max: f64 },
    Choice { allowed: &'static [&'static str] },
}

const BINARY: &[&str] = &["0", "1"];
const TERNARY: &[&str] = &["0", "1", "2"];
const QUATERNARY: &[&str] = &["0", "1", "2", "3"];

impl Field {
    pub const ALL: [Field; 13] = [
        Field::Age,
        Field::Sex,
        Field::Cp,
        Field::Trestbps,
        Field::Chol,
        Field::Fbs,
        Field::Restecg,
        Field::Thalach,
        Field::Exang,
        Field::Oldpeak,
        Field::Slope,
        Field::Ca,
        Field::Thal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Age => "age",
            Field::Sex => "sex",
            Field::Cp => "cp",
            Field::Trestbps => "trestbps",
            Field::Chol => "chol",
            Field::Fbs => "fbs",
            Field::Restecg => "restecg",
            Field::Thalach => "thalach",
            Field::Exang => "exang",
            Field::Oldpeak => "oldpeak",
            Field::Slope => "slope",
            Field::Ca => "ca",
            Field::Thal => "thal",
        }
    }

    /// Form label shown next to the input.
    pub fn label(self) -> &'static str {
        match self {
            Field::Age => "Usia (tahun)",
            Field::Sex => "Jenis Kelamin",
            Field::Cp => "Jenis Nyeri Dada",
            Field::Trestbps => "Tekanan Darah Istirahat (mmHg)",
            Field::Chol => "Kolesterol Serum (mg/dl)",
            Field::Fbs => "Gula Darah Puasa > 120 mg/dl",
            Field::Restecg => "Hasil EKG Istirahat",
            Field::Thalach => "Detak Jantung Maksimum (bpm)",
            Field::Exang => "Angina Akibat Latihan",
            Field::Oldpeak => "Depresi ST (oldpeak)",
            Field::Slope => "Kemiringan Segmen ST",
            Field::Ca => "Jumlah Pembuluh Darah Utama",
            Field::Thal => "Thalassemia",
        }
    }

    pub fn rule(self) -> FieldRule {
        match self {
            Field::Age => FieldRule::Integer { min: 1, max: 120 },
            Field::Trestbps => FieldRule::Integer { min: 50, max: 300 },
            Field::Chol => FieldRule::Integer { min: 100, max: 600 },
            Field::Thalach => FieldRule::Integer { min: 60, max: 220 },
            Field::Oldpeak => FieldRule::Float { min: 0.0, max: 10.0 },
            Field::Sex | Field::Fbs | Field::Exang => FieldRule::Choice { allowed: BINARY },
            Field::Restecg | Field::Slope | Field::Thal => FieldRule::Choice { allowed: TERNARY },
            Field::Cp | Field::Ca => FieldRule::Choice {
                allowed: QUATERNARY,
            },
        }
    }

    /// Message for a value that is not a number. Choice fields never produce one.
    pub fn type_message(self) -> &'static str {
        match self {
            Field::Age => "Usia harus berupa angka",
            Field::Trestbps => "Tekanan darah harus berupa angka",
            Field::Chol => "Kolesterol harus berupa angka",
            Field::Thalach => "Detak jantung harus berupa angka",
            Field::Oldpeak => "Depresi ST harus berupa angka",
            _ => self.range_message(),
        }
    }

    /// Message for an out-of-range number or a value outside the allowed set.
    pub fn range_message(self) -> &'static str {
        match self {
            Field::Age => "Usia harus antara 1-120 tahun",
            Field::Sex => "Jenis kelamin harus 0 (Perempuan) atau 1 (Laki-laki)",
            Field::Cp => "Jenis nyeri dada harus 0-3",
            Field::Trestbps => "Tekanan darah harus antara 50-300 mmHg",
            Field::Chol => "Kolesterol harus antara 100-600 mg/dl",
            Field::Fbs => "Gula darah puasa harus 0 (<=120 mg/dl) atau 1 (>120 mg/dl)",
            Field::Restecg => "Resting ECG harus 0-2",
            Field::Thalach => "Detak jantung harus antara 60-220 bpm",
            Field::Exang => "Angina induksi latihan harus 0 (Tidak) atau 1 (Ya)",
            Field::Oldpeak => "Depresi ST harus antara 0-10",
            Field::Slope => "Kemiringan segmen ST harus 0-2",
            Field::Ca => "Jumlah pembuluh darah utama harus 0-3",
            Field::Thal => "Thalassemia harus 0-2",
        }
    }

    pub fn required_message(self) -> String {
        format!("Field {} harus diisi", self.name())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| format!("unknown field: {}", s))
    }
}

/// Raw client submission. Keys that are not field names are kept but ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    pub values: BTreeMap<String, String>,
}

impl InputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.values.insert(field.name().to_string(), value.into());
        self
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(field.name()).map(String::as_str)
    }

    /// Trimmed, non-blank values keyed by field name, used to pre-fill the form.
    pub fn echo(&self) -> BTreeMap<String, String> {
        Field::ALL
            .into_iter()
            .filter_map(|field| {
                let value = self.get(field)?.trim();
                (!value.is_empty()).then(|| (field.name().to_string(), value.to_string()))
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for InputRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// All 13 fields, each trimmed and known to satisfy its rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    values: BTreeMap<Field, String>,
}

impl ValidatedRecord {
    pub(crate) fn from_checked(values: BTreeMap<Field, String>) -> Self {
        debug_assert_eq!(values.len(), Field::ALL.len());
        Self { values }
    }

    pub fn get(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.values.iter().map(|(field, value)| (*field, value.as_str()))
    }

    pub fn echo(&self) -> BTreeMap<String, String> {
        self.iter()
            .map(|(field, value)| (field.name().to_string(), value.to_string()))
            .collect()
    }
}

/// Field-scoped (or `general`) messages. Non-empty blocks inference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorSet {
    messages: BTreeMap<String, String>,
}

impl ErrorSet {
    pub const GENERAL_KEY: &'static str = "general";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn general(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors
            .messages
            .insert(Self::GENERAL_KEY.to_string(), message.into());
        errors
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.messages.insert(field.name().to_string(), message.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    pub fn field(&self, field: Field) -> Option<&str> {
        self.get(field.name())
    }

    pub fn general_message(&self) -> Option<&str> {
        self.get(Self::GENERAL_KEY)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.messages.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLabel {
    NotAtRisk,
    AtRisk,
}

impl RiskLabel {
    pub fn from_class(class: u8) -> Option<Self> {
        match class {
            0 => Some(RiskLabel::NotAtRisk),
            1 => Some(RiskLabel::AtRisk),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            RiskLabel::NotAtRisk => 0,
            RiskLabel::AtRisk => 1,
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            RiskLabel::AtRisk => "Berisiko (1)",
            RiskLabel::NotAtRisk => "Tidak Berisiko (0)",
        }
    }
}

/// Outcome of one inference call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: RiskLabel,
    /// Max-class probability, absent when the model has no probability output.
    pub probability: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_and_names() {
        let names: Vec<&str> = Field::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang",
                "oldpeak", "slope", "ca", "thal"
            ]
        );
        assert_eq!("oldpeak".parse::<Field>(), Ok(Field::Oldpeak));
        assert!("target".parse::<Field>().is_err());
    }

    #[test]
    fn test_echo_trims_and_skips_blank_values() {
        let input = InputRecord::new()
            .with(Field::Age, " 45 ")
            .with(Field::Sex, "   ")
            .with(Field::Cp, "2");

        let echo = input.echo();
        assert_eq!(echo.get("age").map(String::as_str), Some("45"));
        assert_eq!(echo.get("cp").map(String::as_str), Some("2"));
        assert!(!echo.contains_key("sex"));
    }

    #[test]
    fn test_error_set_general() {
        let errors = ErrorSet::general("Terjadi kesalahan: boom");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.general_message(), Some("Terjadi kesalahan: boom"));
    }

    #[test]
    fn test_risk_label_text() {
        assert_eq!(RiskLabel::from_class(1).map(RiskLabel::text), Some("Berisiko (1)"));
        assert_eq!(
            RiskLabel::from_class(0).map(RiskLabel::text),
            Some("Tidak Berisiko (0)")
        );
        assert_eq!(RiskLabel::from_class(2), None);
    }
}
