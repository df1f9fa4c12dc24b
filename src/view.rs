//! HTML for the form page and its results area.

use crate::error::PredictionAssemblyFailure;
use crate::form::{FieldKind, FieldSpec, FormSchema};
use crate::pipeline::PredictionReport;
use crate::record::{CarSpec, RawRecord, RawValue};

/// What to show under the form.
pub enum Outcome<'a> {
    Success(&'a PredictionReport),
    Failure(&'a PredictionAssemblyFailure),
    /// Submission refused before assembly (out-of-range input).
    Rejected(String),
}

/// `$12,345.67`; negative values as `-$12.00`.
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, frac)
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2em auto;padding:0 1em}\
.grid{display:grid;grid-template-columns:repeat(3,1fr);gap:1em}\
label{display:block;font-size:.9em}input,select{width:100%}\
table{border-collapse:collapse;margin:1em 0}td,th{border:1px solid #ccc;padding:.2em .6em;text-align:left}\
.ok{background:#e6f4ea;padding:1em}.err{background:#fce8e6;padding:1em}.warn{color:#b06000}";

/// Render the whole page: form pre-filled from `spec`, then the outcome.
pub fn render_page(schema: &FormSchema, spec: &CarSpec, outcome: Option<Outcome<'_>>) -> String {
    let record = spec.to_record(schema.reference_year);
    let mut html = String::new();
    html.push_str(&format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>DV Prediction</title>\
         <style>{}</style></head><body><h1>🚗 Premium Car Price Predictor</h1>",
        STYLE
    ));

    html.push_str("<form method=\"post\" action=\"/predict\"><div class=\"grid\">");
    for field in &schema.fields {
        render_field(&mut html, field, record.get(field.column));
    }
    html.push_str("</div><p><button type=\"submit\">Predict Price</button></p></form>");

    html.push_str("<h2>Your Car Specifications</h2>");
    render_record(&mut html, &record);

    match outcome {
        Some(Outcome::Success(report)) => render_success(&mut html, report),
        Some(Outcome::Failure(failure)) => render_failure(&mut html, failure),
        Some(Outcome::Rejected(msg)) => {
            html.push_str(&format!("<div class=\"err\">Invalid input: {}</div>", escape(&msg)));
        }
        None => {}
    }

    html.push_str("</body></html>");
    html
}

fn render_field(html: &mut String, field: &FieldSpec, value: Option<&RawValue>) {
    let value = value.unwrap_or(&field.default).to_string();
    html.push_str(&format!(
        "<div><label for=\"{name}\">{label}</label>",
        name = field.name,
        label = escape(field.label)
    ));
    match &field.kind {
        FieldKind::Select { choices } => {
            html.push_str(&format!("<select id=\"{0}\" name=\"{0}\">", field.name));
            for choice in choices {
                let selected = if *choice == value { " selected" } else { "" };
                html.push_str(&format!(
                    "<option value=\"{0}\"{1}>{0}</option>",
                    escape(choice),
                    selected
                ));
            }
            html.push_str("</select>");
        }
        FieldKind::Text => {
            html.push_str(&format!(
                "<input type=\"text\" id=\"{0}\" name=\"{0}\" value=\"{1}\">",
                field.name,
                escape(&value)
            ));
        }
        FieldKind::Slider { min, max } => {
            html.push_str(&format!(
                "<input type=\"range\" id=\"{0}\" name=\"{0}\" min=\"{1}\" max=\"{2}\" step=\"1\" value=\"{3}\" \
                 oninput=\"this.nextElementSibling.value=this.value\"><output>{3}</output>",
                field.name, min, max, value
            ));
        }
        FieldKind::Integer { min, max } => {
            let max = max.map(|m| format!(" max=\"{}\"", m)).unwrap_or_default();
            html.push_str(&format!(
                "<input type=\"number\" id=\"{0}\" name=\"{0}\" min=\"{1}\"{2} step=\"1\" value=\"{3}\">",
                field.name, min, max, value
            ));
        }
        FieldKind::Float { min, max, step } => {
            html.push_str(&format!(
                "<input type=\"number\" id=\"{0}\" name=\"{0}\" min=\"{1}\" max=\"{2}\" step=\"{3}\" value=\"{4}\">",
                field.name, min, max, step, value
            ));
        }
    }
    html.push_str("</div>");
}

fn render_record(html: &mut String, record: &RawRecord) {
    html.push_str("<table><tr><th>Field</th><th>Value</th></tr>");
    for (name, value) in record.iter() {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            escape(name),
            escape(&value.to_string())
        ));
    }
    html.push_str("</table>");
}

fn render_list(html: &mut String, title: &str, items: Option<&[String]>) {
    let body = match items {
        Some(items) => escape(&format!("{:?}", items)),
        None => "Not available".to_string(),
    };
    html.push_str(&format!("<p>{}: <code>{}</code></p>", title, body));
}

fn render_success(html: &mut String, report: &PredictionReport) {
    html.push_str("<h3>Final Features Being Sent to Model:</h3><table><tr>");
    for name in &report.encoded.features {
        html.push_str(&format!("<th>{}</th>", escape(name)));
    }
    html.push_str("</tr><tr>");
    for v in &report.encoded.values {
        html.push_str(&format!("<td>{}</td>", v));
    }
    html.push_str("</tr></table>");

    if !report.unknown_categories.is_empty() {
        html.push_str(&format!(
            "<p class=\"warn\">Unseen categories encoded as -1: {}</p>",
            escape(&report.unknown_categories.join(", "))
        ));
    }
    html.push_str(&format!(
        "<div class=\"ok\">Estimated Price: {}</div>",
        format_currency(report.price)
    ));
}

fn render_failure(html: &mut String, failure: &PredictionAssemblyFailure) {
    html.push_str(&format!("<div class=\"err\">{}</div>", escape(&failure.to_string())));
    html.push_str("<h3>Debug Info:</h3>");
    render_list(html, "Input features", Some(failure.input_features.as_slice()));
    render_list(html, "Model expects", Some(failure.model_features.as_slice()));
    render_list(html, "Encoded features", failure.encoded_features.as_deref());
}
