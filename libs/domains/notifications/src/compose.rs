//! Contact-form notification body.

use crate::models::ContactForm;
use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Subject and both bodies of a composed email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Renders a contact-form submission into the notification sent to the site owner.
///
/// Company and service rows only appear when present. Every interpolated value is
/// HTML-escaped in the HTML body; the text body carries the values as-is.
pub fn compose_contact_form_message(
    form: &ContactForm,
    submitted_at: DateTime<Utc>,
) -> ComposedMessage {
    let company = form.company();
    let service = form.service();
    let submitted = submitted_at.format(TIMESTAMP_FORMAT).to_string();

    let subject = match company {
        Some(company) => format!("New Contact Form: {} from {}", form.name, company),
        None => format!("New Contact Form: {}", form.name),
    };

    ComposedMessage {
        subject,
        html: render_html(form, company, service, &submitted),
        text: render_text(form, company, service, &submitted),
    }
}

const LABEL_CELL: &str =
    r#"<td style="padding: 10px; border-bottom: 1px solid #eee; font-weight: bold; width: 120px;">"#;
const VALUE_CELL: &str = r#"<td style="padding: 10px; border-bottom: 1px solid #eee;">"#;

fn table_row(html: &mut String, label: &str, value: &str) {
    let _ = write!(
        html,
        "\n      <tr>{LABEL_CELL}{label}:</td>{VALUE_CELL}{value}</td></tr>"
    );
}

fn render_html(
    form: &ContactForm,
    company: Option<&str>,
    service: Option<&str>,
    submitted: &str,
) -> String {
    let email = encode_text(&form.email);
    let mailto = encode_double_quoted_attribute(&form.email);

    let mut html = String::with_capacity(2048);
    html.push_str(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h2 style="color: #333; border-bottom: 2px solid #0066cc; padding-bottom: 10px;">New Contact Form Submission</h2>
  <table style="width: 100%; border-collapse: collapse; margin-top: 20px;">"#,
    );

    table_row(&mut html, "Name", &encode_text(&form.name));
    table_row(
        &mut html,
        "Email",
        &format!(r#"<a href="mailto:{mailto}">{email}</a>"#),
    );
    if let Some(company) = company {
        table_row(&mut html, "Company", &encode_text(company));
    }
    if let Some(service) = service {
        table_row(&mut html, "Service", &encode_text(service));
    }

    let _ = write!(
        html,
        r#"
  </table>
  <div style="margin-top: 20px;">
    <h3 style="color: #333;">Message:</h3>
    <div style="background: #f9f9f9; padding: 15px; border-radius: 5px; white-space: pre-wrap;">{message}</div>
  </div>
  <div style="margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; color: #666; font-size: 12px;">
    <p>This message was sent from the website contact form.</p>
    <p>Submitted at: {submitted}</p>
  </div>
</div>
"#,
        message = encode_text(&form.message),
    );

    html
}

fn render_text(
    form: &ContactForm,
    company: Option<&str>,
    service: Option<&str>,
    submitted: &str,
) -> String {
    let mut text = String::with_capacity(512);
    text.push_str("New Contact Form Submission\n");
    text.push_str("----------------------------\n");
    let _ = writeln!(text, "Name: {}", form.name);
    let _ = writeln!(text, "Email: {}", form.email);
    if let Some(company) = company {
        let _ = writeln!(text, "Company: {company}");
    }
    if let Some(service) = service {
        let _ = writeln!(text, "Service: {service}");
    }
    let _ = write!(
        text,
        "\nMessage:\n{}\n\n---\nSubmitted at: {}\n",
        form.message, submitted
    );
    text
}
