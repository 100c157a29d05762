//! Receipt rendering with embedded Tera templates

use rust_embed::Embed;
use serde::Serialize;
use tera::Tera;
use thiserror::Error;

use crate::entities::registration::Confirmation;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const RECEIPT: &str = "receipt.txt.tera";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("template rendering error: {0}")]
    RenderError(String),
}

#[derive(Debug, Serialize)]
struct ReceiptLine<'a> {
    name: &'a str,
    dni: &'a str,
    age: u32,
    size: Option<&'static str>,
}

/// Renders confirmation receipts
pub struct ReceiptGenerator {
    tera: Tera,
}

impl ReceiptGenerator {
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        for name in EmbeddedTemplates::iter() {
            let Some(file) = EmbeddedTemplates::get(&name) else {
                continue;
            };
            let text = std::str::from_utf8(&file.data)
                .map_err(|e| TemplateError::RenderError(format!("{name}: {e}")))?;
            tera.add_raw_template(&name, text)
                .map_err(|e| TemplateError::RenderError(e.to_string()))?;
        }

        if !tera.get_template_names().any(|n| n == RECEIPT) {
            return Err(TemplateError::NotFound(RECEIPT.to_string()));
        }
        Ok(Self { tera })
    }

    pub fn render(&self, confirmation: &Confirmation) -> Result<String, TemplateError> {
        let registration = &confirmation.registration;
        let participants: Vec<ReceiptLine> = registration
            .participants
            .iter()
            .map(|p| ReceiptLine {
                name: &p.name,
                dni: p.dni.as_str(),
                age: p.age,
                size: p.size.map(|s| s.as_str()),
            })
            .collect();

        let mut context = tera::Context::new();
        context.insert("reference", &confirmation.reference);
        context.insert(
            "confirmed_at",
            &confirmation.confirmed_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        );
        context.insert("message", &confirmation.message);
        context.insert("activity", &registration.activity);
        context.insert("date", &registration.date.format("%A %d/%m/%Y").to_string());
        context.insert("time", &registration.time.to_string());
        context.insert("email", &registration.email);
        context.insert("participants", &participants);

        self.tera
            .render(RECEIPT, &context)
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }
}
