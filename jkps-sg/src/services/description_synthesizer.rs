//! Description Synthesizer
//!
//! Renders the localized description block for one merged record. The
//! template renderer is a pure function and the default `DescriptionService`;
//! an injected service is tried first and falls back to the template on error
//! or blank output.

use crate::models::{Locale, MergedRecord};
use crate::types::{DescriptionService, PipelineError};
use std::sync::Arc;
use tracing::warn;

/// Per-locale line labels
struct Labels {
    color: &'static str,
    size: &'static str,
    material: &'static str,
    care: &'static str,
    drop: &'static str,
    kalip: &'static str,
    dominant_color: &'static str,
}

const EN: Labels = Labels {
    color: "Color",
    size: "Size",
    material: "Material",
    care: "Care",
    drop: "Drop",
    kalip: "Kalip",
    dominant_color: "Dominant Color",
};

const TR: Labels = Labels {
    color: "Renk",
    size: "Beden",
    material: "Materyal",
    care: "Bakım",
    drop: "Drop",
    kalip: "Kalip",
    dominant_color: "Ana Renk",
};

fn labels(locale: Locale) -> &'static Labels {
    match locale {
        Locale::En => &EN,
        Locale::Tr => &TR,
    }
}

/// Render the description template
///
/// Absent fields render as `N/A`; lines are joined with `\n`.
pub fn synthesize_description(record: &MergedRecord, locale: Locale, dominant_color: &str) -> String {
    let l = labels(locale);
    let f = |key: &str| record.field_or_sentinel(key);

    [
        format!("{} - {}", f("name"), f("description")),
        format!("{}: {}", l.color, f("color")),
        format!("{}: {}", l.size, f("size")),
        format!("{}: {}", l.material, f("composition")),
        format!("{}: {}", l.care, f("care")),
        format!("{}: {}", l.drop, f("drop")),
        format!("{}: {}", l.kalip, f("kalip")),
        format!("{}: {}", l.dominant_color, dominant_color),
    ]
    .join("\n")
}

/// Template-based description service
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateDescriptionService;

#[async_trait::async_trait]
impl DescriptionService for TemplateDescriptionService {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn describe(
        &self,
        record: &MergedRecord,
        locale: Locale,
        dominant_color: &str,
    ) -> Result<String, PipelineError> {
        Ok(synthesize_description(record, locale, dominant_color))
    }
}

/// Description synthesis with an optional external service in front
#[derive(Clone, Default)]
pub struct DescriptionSynthesizer {
    external: Option<Arc<dyn DescriptionService>>,
}

impl DescriptionSynthesizer {
    pub fn new(external: Option<Arc<dyn DescriptionService>>) -> Self {
        Self { external }
    }

    /// Description text; always succeeds
    pub async fn describe(&self, record: &MergedRecord, locale: Locale, dominant_color: &str) -> String {
        if let Some(service) = &self.external {
            match service.describe(record, locale, dominant_color).await {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => warn!(
                    product_id = %record.id,
                    service = service.name(),
                    "Blank description from service, using template"
                ),
                Err(e) => warn!(
                    product_id = %record.id,
                    service = service.name(),
                    error = %e,
                    "Description service failed, using template"
                ),
            }
        }
        synthesize_description(record, locale, dominant_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LabelField, LabelRecord, ProductId, NOT_AVAILABLE};

    fn shirt() -> MergedRecord {
        let id = ProductId::parse("JK100").unwrap();
        let mut label = LabelRecord::new(id.clone(), "");
        label.set(LabelField::Color, "Blue");
        label.set(LabelField::Size, "M");

        let mut fields: crate::models::FieldMap =
            [("id", "JK100"), ("name", "Shirt")].into_iter().collect();
        fields.overlay(&label.to_fields());
        MergedRecord { id, fields }
    }

    #[test]
    fn test_english_template() {
        let text = synthesize_description(&shirt(), Locale::En, NOT_AVAILABLE);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            vec![
                "Shirt - N/A",
                "Color: Blue",
                "Size: M",
                "Material: N/A",
                "Care: N/A",
                "Drop: N/A",
                "Kalip: N/A",
                "Dominant Color: N/A",
            ]
        );
    }

    #[test]
    fn test_turkish_template() {
        let text = synthesize_description(&shirt(), Locale::Tr, "rgb(1, 2, 3)");

        assert!(text.contains("Renk: Blue"));
        assert!(text.contains("Beden: M"));
        assert!(text.contains("Materyal: N/A"));
        assert!(text.contains("Bakım: N/A"));
        assert!(text.contains("Kalip: N/A"));
        assert!(!text.contains("Kalıp"));
        assert!(text.ends_with("Ana Renk: rgb(1, 2, 3)"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let record = shirt();
        assert_eq!(
            synthesize_description(&record, Locale::En, "rgb(9, 9, 9)"),
            synthesize_description(&record, Locale::En, "rgb(9, 9, 9)")
        );
    }

    struct Scripted(Result<String, ()>);

    #[async_trait::async_trait]
    impl DescriptionService for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn describe(
            &self,
            _record: &MergedRecord,
            _locale: Locale,
            _dominant_color: &str,
        ) -> Result<String, PipelineError> {
            self.0
                .clone()
                .map_err(|_| PipelineError::Service("down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_external_service_used_when_available() {
        let synth = DescriptionSynthesizer::new(Some(Arc::new(Scripted(Ok("Nice shirt".into())))));
        assert_eq!(synth.describe(&shirt(), Locale::En, "N/A").await, "Nice shirt");
    }

    #[tokio::test]
    async fn test_external_failure_or_blank_falls_back() {
        let expected = synthesize_description(&shirt(), Locale::En, "N/A");

        let failing = DescriptionSynthesizer::new(Some(Arc::new(Scripted(Err(())))));
        assert_eq!(failing.describe(&shirt(), Locale::En, "N/A").await, expected);

        let blank = DescriptionSynthesizer::new(Some(Arc::new(Scripted(Ok("  ".into())))));
        assert_eq!(blank.describe(&shirt(), Locale::En, "N/A").await, expected);
    }

    #[tokio::test]
    async fn test_template_service() {
        let text = TemplateDescriptionService
            .describe(&shirt(), Locale::En, "N/A")
            .await
            .unwrap();
        assert!(text.contains("Color: Blue"));
    }
}
