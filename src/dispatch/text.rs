use std::fmt::Write as _;

use super::{DocumentRenderer, DunningDocument};
use crate::errors::ControlError;

/// Plain-text dunning document renderer, one block per (partner,
/// policy) group with a row per reminder line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl TextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for TextRenderer {
    fn render(&self, document: &DunningDocument) -> Result<String, ControlError> {
        let mut out = String::new();
        writeln!(
            out,
            "Credit Control Summary - {} ({})",
            document.partner_name, document.policy_name
        )
        .map_err(|err| ControlError::Render(err.to_string()))?;
        for entry in &document.entries {
            writeln!(
                out,
                "  {}  due {}  {:>10.2}  [{}]",
                entry.invoice_number, entry.date_due, entry.amount_due, entry.level_name
            )
            .map_err(|err| ControlError::Render(err.to_string()))?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DocumentEntry;
    use chrono::NaiveDate;

    #[test]
    fn renders_header_and_rows() {
        let document = DunningDocument {
            partner_name: "Acme".into(),
            policy_name: "3 time policy".into(),
            entries: vec![DocumentEntry {
                invoice_number: "INV-7".into(),
                date_due: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                amount_due: 125.5,
                level_name: "First reminder".into(),
            }],
        };
        let rendered = TextRenderer::new().render(&document).unwrap();
        assert!(rendered.contains("Acme"));
        assert!(rendered.contains("INV-7"));
        assert!(rendered.contains("125.50"));
    }
}
