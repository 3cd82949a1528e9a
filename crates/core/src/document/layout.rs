//! Styled block layout for generated case documents.

use chrono::DateTime;
use serde_json::Value;

use crate::portal::{
    display_value, CaseActivity, CaseDetails, INSTANCE_DETAILS_FIELD, TOOTH_NUMBERS_FIELD,
};

const TITLE_SIZE: f32 = 24.0;
const SUBTITLE_SIZE: f32 = 20.0;
const HEADING_SIZE: f32 = 16.0;
const SUBHEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 12.0;
const CAPTION_SIZE: f32 = 10.0;

/// Activity type that never appears in a comment thread.
const SYSTEM_UPDATE: &str = "system_update";

/// Text colour of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColor {
    Black,
    Red,
    Blue,
    Gray,
}

impl TextColor {
    /// RGB components in `0.0..=1.0`.
    pub fn rgb(self) -> (f32, f32, f32) {
        match self {
            TextColor::Black => (0.0, 0.0, 0.0),
            TextColor::Red => (0.8, 0.0, 0.0),
            TextColor::Blue => (0.0, 0.0, 0.8),
            TextColor::Gray => (0.5, 0.5, 0.5),
        }
    }
}

/// One unit of document content, laid out top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A paragraph; embedded newlines start new lines.
    Text {
        text: String,
        size: f32,
        color: TextColor,
    },
    /// Vertical space of one body line.
    Gap,
}

/// A renderer-agnostic document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    title: String,
    blocks: Vec<Block>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Text of every block, in order, for inspection.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Text { text, .. } => Some(text.as_str()),
            Block::Gap => None,
        })
    }

    pub fn text(&mut self, text: impl Into<String>, size: f32) -> &mut Self {
        self.colored(text, size, TextColor::Black)
    }

    pub fn colored(&mut self, text: impl Into<String>, size: f32, color: TextColor) -> &mut Self {
        self.blocks.push(Block::Text {
            text: text.into(),
            size,
            color,
        });
        self
    }

    pub fn gap(&mut self) -> &mut Self {
        self.blocks.push(Block::Gap);
        self
    }

    /// Summary of a case's structured details.
    pub fn case_details(case_id: &str, details: &CaseDetails) -> Self {
        let mut doc = Document::new(format!("Case Details for TS-{}", case_id));
        doc.text(format!("Case Details for TS-{}", case_id), TITLE_SIZE)
            .gap();

        if let Some(priority) = &details.case_priority {
            doc.text(format!("Case Priority {}", priority), SUBTITLE_SIZE)
                .gap();
        }

        doc.text(format!("Patient name - {}", details.patient_name), HEADING_SIZE)
            .gap()
            .gap();

        for (service, fields) in details.services() {
            doc.text(convert_key(service), HEADING_SIZE);

            for (key, value) in fields {
                match value {
                    Value::Array(instances) if key == INSTANCE_DETAILS_FIELD => {
                        doc.gap()
                            .text(format!("{}: ", convert_key(key)), SUBHEADING_SIZE);
                        for (idx, instance) in instances.iter().enumerate() {
                            doc.text(instance_block(idx + 1, instance), BODY_SIZE).gap();
                        }
                    }
                    _ => {
                        doc.text(
                            format!("{}: {}", convert_key(key), display_value(value)),
                            BODY_SIZE,
                        );
                    }
                }
            }
            doc.gap();
        }

        doc.gap().text("Misc. details", HEADING_SIZE);

        if let Some(note) = details.additional_note.as_deref().filter(|n| !n.is_empty()) {
            doc.text(format!("Additional Notes: {}", note), BODY_SIZE).gap();
        }
        if let Some(splinted) = details.splinted_crowns.as_deref().filter(|s| !s.is_empty()) {
            doc.text(format!("Splinted Crowns: {}", splinted), BODY_SIZE)
                .gap();
        }

        doc
    }

    /// Comment thread of a redesign request.
    pub fn comments(redesign_id: &str, priority: &str, activities: &[CaseActivity]) -> Self {
        let mut doc = Document::new(format!("Comments for TS-{}", redesign_id));
        doc.text(format!("Comments for TS-{}", redesign_id), TITLE_SIZE)
            .gap()
            .text(format!("Case Redesign Priority {}", priority), SUBTITLE_SIZE)
            .gap()
            .gap();

        for activity in activities {
            if activity.kind.eq_ignore_ascii_case(SYSTEM_UPDATE) {
                continue;
            }

            let (author, color) = author_style(&activity.kind);
            doc.colored(
                format!("{} :   {}", author, activity.content),
                BODY_SIZE,
                color,
            )
            .colored(format_timestamp(activity.timestamp), CAPTION_SIZE, TextColor::Gray)
            .gap();
        }

        doc
    }
}

/// Humanises a camelCase key: `crownAndBridge` becomes `Crown And Bridge`.
pub fn convert_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push(' ');
        }
        out.push(c);
    }

    let mut chars = out.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => out,
    }
}

fn instance_block(number: usize, instance: &Value) -> String {
    let mut lines = vec![format!("Instance {}", number)];

    if let Some(fields) = instance.as_object() {
        for (key, value) in fields {
            let line = match value {
                Value::Array(teeth) if key == TOOTH_NUMBERS_FIELD => format!(
                    "Tooth Numbers: {}",
                    teeth.iter().map(display_value).collect::<Vec<_>>().join(",")
                ),
                _ => format!("{}: {}", convert_key(key), display_value(value)),
            };
            lines.push(line);
        }
    }

    lines.join("\n")
}

/// Author label and colour for an activity type.
fn author_style(kind: &str) -> (&'static str, TextColor) {
    match kind.trim().to_lowercase().as_str() {
        "redesign_update" => ("REDESIGN UPDATE", TextColor::Red),
        "admin_comment" | "super admin_comment" | "crm_comment" => {
            ("TOOTHSKETCH TEAM", TextColor::Black)
        }
        "user_comment" | "side admin_comment" => ("CLIENT", TextColor::Blue),
        _ => ("UNKNOWN", TextColor::Black),
    }
}

fn format_timestamp(unix_secs: i64) -> String {
    DateTime::from_timestamp(unix_secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| unix_secs.to_string())
}
