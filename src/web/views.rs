//! HTML pages for the form and the result.

use crate::domain::model::{ErrorSet, Field, FieldRule, Prediction};
use std::collections::BTreeMap;
use std::fmt::Write;

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"id\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        body
    )
}

fn input_for(field: Field, value: &str) -> String {
    let name = field.name();
    match field.rule() {
        FieldRule::Integer { min, max } => format!(
            "<input type=\"number\" id=\"{name}\" name=\"{name}\" min=\"{min}\" max=\"{max}\" step=\"1\" value=\"{}\" required>",
            escape_html(value)
        ),
        FieldRule::Float { min, max } => format!(
            "<input type=\"number\" id=\"{name}\" name=\"{name}\" min=\"{min}\" max=\"{max}\" step=\"0.1\" value=\"{}\" required>",
            escape_html(value)
        ),
        FieldRule::Choice { allowed } => {
            let mut select = format!("<select id=\"{name}\" name=\"{name}\" required>");
            select.push_str("<option value=\"\">-- pilih --</option>");
            for option in allowed {
                let selected = if *option == value { " selected" } else { "" };
                let _ = write!(select, "<option value=\"{option}\"{selected}>{option}</option>");
            }
            select.push_str("</select>");
            select
        }
    }
}

/// The input form, optionally with errors and pre-filled values.
pub fn render_form(errors: Option<&ErrorSet>, inputs: &BTreeMap<String, String>) -> String {
    let mut body = String::from("<h1>Prediksi Risiko Penyakit Jantung</h1>\n");

    if let Some(general) = errors.and_then(ErrorSet::general_message) {
        let _ = writeln!(
            body,
            "<div class=\"alert error\" id=\"error-general\">{}</div>",
            escape_html(general)
        );
    }

    body.push_str("<form id=\"heartForm\" method=\"post\" action=\"/predict\">\n");
    for field in Field::ALL {
        let value = inputs.get(field.name()).map(String::as_str).unwrap_or_default();
        let _ = writeln!(
            body,
            "<div class=\"form-group\">\n<label for=\"{}\">{}</label>\n{}",
            field.name(),
            escape_html(field.label()),
            input_for(field, value)
        );
        if let Some(message) = errors.and_then(|e| e.field(field)) {
            let _ = writeln!(
                body,
                "<span class=\"field-error\" id=\"error-{}\">{}</span>",
                field.name(),
                escape_html(message)
            );
        }
        body.push_str("</div>\n");
    }
    body.push_str("<button type=\"submit\">Prediksi</button>\n</form>\n");

    page("Prediksi Risiko Penyakit Jantung", &body)
}

pub fn format_probability(probability: Option<f64>) -> String {
    match probability {
        Some(p) => format!("{:.2}%", p * 100.0),
        None => "-".to_string(),
    }
}

pub fn render_result(prediction: &Prediction, inputs: &BTreeMap<String, String>) -> String {
    let mut body = String::from("<h1>Hasil Prediksi</h1>\n");
    let _ = writeln!(
        body,
        "<p class=\"result\" id=\"result\">{}</p>\n<p class=\"proba\" id=\"proba\">Probabilitas: {}</p>",
        prediction.label.text(),
        format_probability(prediction.probability)
    );

    body.push_str("<table class=\"inputs\">\n");
    for field in Field::ALL {
        if let Some(value) = inputs.get(field.name()) {
            let _ = writeln!(
                body,
                "<tr><th>{}</th><td id=\"input-{}\">{}</td></tr>",
                escape_html(field.label()),
                field.name(),
                escape_html(value)
            );
        }
    }
    body.push_str("</table>\n<a href=\"/\">Kembali</a>\n");

    page("Hasil Prediksi", &body)
}
