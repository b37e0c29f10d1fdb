// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Normalizes model output into the structured advisory format
//!
//! The generation prompt asks for a five-section layout but models drift.
//! This pass restructures free-form answers into the section template;
//! already-structured text passes through unchanged, so applying it twice is
//! a no-op.

use regex::Regex;
use std::sync::OnceLock;

const SECTION_COUNT: usize = 5;

static SECTION_CUES: OnceLock<[Regex; SECTION_COUNT]> = OnceLock::new();

/// Keyword cues marking a transition into each section, checked in order
fn section_cues() -> &'static [Regex; SECTION_COUNT] {
    SECTION_CUES.get_or_init(|| {
        [
            Regex::new(r"(?i)definition|meaning|what is|refers to").unwrap(),
            Regex::new(r"(?i)applies|when|used for|applicable").unwrap(),
            Regex::new(r"(?i)rule|condition|limitation|section|requirement").unwrap(),
            Regex::new(r"(?i)example|instance|scenario|case").unwrap(),
            Regex::new(r"(?i)takeaway|summary|conclusion|key point").unwrap(),
        ]
    })
}

/// Ensure the response follows the five-section structured format
///
/// If already formatted, returns the input as-is. Otherwise restructures the
/// answer by routing lines to sections on keyword cues and appends the
/// original text for reference.
pub fn format_advisory_response(raw: &str) -> String {
    if raw.contains("**🔹 Meaning") && raw.contains("**🔹 Key Takeaway") {
        return raw.to_string();
    }

    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut sections: [Vec<&str>; SECTION_COUNT] = Default::default();
    let mut current = 0;

    for &line in &lines {
        match section_cues().iter().position(|cue| cue.is_match(line)) {
            // A cue line switches the target section and is consumed
            Some(idx) => current = idx,
            None => sections[current].push(line),
        }
    }

    let [definition, applies, rules, example, takeaway] = sections;

    let mut formatted = String::from("**🔹 Meaning / Definition**\n");
    if definition.is_empty() {
        formatted.push_str(&format!(
            "• {}\n",
            lines.first().copied().unwrap_or("Information not available")
        ));
    } else {
        for item in definition.iter().take(3) {
            formatted.push_str(&format!("• {}\n", item));
        }
    }

    formatted.push_str("\n**🔹 When it Applies**\n");
    if applies.is_empty() {
        formatted.push_str("• Refer to context provided in GST documents\n");
    } else {
        for item in applies.iter().take(4) {
            formatted.push_str(&format!("• {}\n", item));
        }
    }

    formatted.push_str("\n**🔹 Rules / Conditions**\n");
    if rules.is_empty() {
        formatted.push_str("• See detailed information above\n");
    } else {
        for item in rules.iter().take(5) {
            formatted.push_str(&format!("• {}\n", item));
        }
    }

    formatted.push_str("\n**🔹 Example**\n");
    if example.is_empty() {
        formatted.push_str("• Practical application depends on specific business scenario\n");
    } else {
        for item in example.iter().take(4) {
            formatted.push_str(&format!("• {}\n", item));
        }
    }

    formatted.push_str("\n**🔹 Key Takeaway**\n");
    if let Some(item) = takeaway.first() {
        formatted.push_str(&format!("• {}\n", item));
    } else if let Some(line) = lines.last() {
        formatted.push_str(&format!("• {}\n", line));
    } else {
        formatted.push_str("• Refer to GST Act for complete details\n");
    }

    formatted.push_str(&format!("\n---\n**Detailed Information:**\n{}", raw));
    formatted
}
