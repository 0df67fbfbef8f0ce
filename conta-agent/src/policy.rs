//! Per-turn response directives and generation parameters.
//!
//! The policy maps the rule tags of a message to the instructions sent
//! with the generation request (domain disclosure, answer shape) and to
//! the sampling parameters (temperature, token budget by request shape).

use conta_core::GenerationConfig;

use crate::rules::RuleTag;

/// Temperature for shaped or grounded answers.
const PRECISION_TEMPERATURE: f32 = 0.3;

/// Temperature for unshaped small talk.
const CHAT_TEMPERATURE: f32 = 0.7;

/// Token budget for extraction-style asks (a value, a short list).
const EXTRACTION_TOKEN_BUDGET: u32 = 256;

/// Token budget for guidance-style asks (procedures, recommendations).
const GUIDANCE_TOKEN_BUDGET: u32 = 1024;

/// Token budget when neither shape applies.
const DEFAULT_TOKEN_BUDGET: u32 = 768;

/// Instruction appended when the message is off the accounting domain.
const OFF_TOPIC_DIRECTIVE: &str = "El mensaje no trata de contabilidad. Indica brevemente que \
    eres un asistente de IA enfocado en contabilidad y responde en un máximo de 4 líneas.";

/// Instruction for how-to/procedure requests.
const HOW_TO_DIRECTIVE: &str = "Responde con viñetas organizadas en cuatro secciones: \
    Requisitos, Pasos, Plazos y Consejos.";

/// Instruction for what-is/definition requests.
const WHAT_IS_DIRECTIVE: &str = "Primera línea: una definición breve. Después agrega de 3 a 5 \
    viñetas etiquetadas (por ejemplo: Concepto, Uso, Ejemplo).";

/// Build the per-turn instruction list from the message's rule tags.
pub fn directives_for(tags: &[RuleTag]) -> Vec<String> {
    let mut directives = Vec::new();

    if !tags.contains(&RuleTag::Accounting) {
        directives.push(OFF_TOPIC_DIRECTIVE.to_string());
    }
    if tags.contains(&RuleTag::HowTo) {
        directives.push(HOW_TO_DIRECTIVE.to_string());
    } else if tags.contains(&RuleTag::WhatIs) {
        directives.push(WHAT_IS_DIRECTIVE.to_string());
    }

    directives
}

/// Choose sampling parameters by request shape.
///
/// Extraction asks get the small budget, guidance asks the large one;
/// shaped or extraction requests run at the precision temperature.
pub fn generation_for(tags: &[RuleTag]) -> GenerationConfig {
    let max_output_tokens = if tags.contains(&RuleTag::Extraction) {
        EXTRACTION_TOKEN_BUDGET
    } else if tags.contains(&RuleTag::Guidance) {
        GUIDANCE_TOKEN_BUDGET
    } else {
        DEFAULT_TOKEN_BUDGET
    };

    let shaped = tags.contains(&RuleTag::HowTo)
        || tags.contains(&RuleTag::WhatIs)
        || tags.contains(&RuleTag::Extraction);
    let temperature = if shaped { PRECISION_TEMPERATURE } else { CHAT_TEMPERATURE };

    GenerationConfig::default()
        .with_temperature(temperature)
        .with_max_output_tokens(max_output_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_topic_messages_get_the_disclosure_directive() {
        let directives = directives_for(&[]);
        assert_eq!(directives.len(), 1);
        assert!(directives[0].contains("asistente de IA"));

        let on_topic = directives_for(&[RuleTag::Accounting]);
        assert!(on_topic.is_empty());
    }

    #[test]
    fn how_to_wins_over_what_is() {
        let directives = directives_for(&[RuleTag::Accounting, RuleTag::HowTo, RuleTag::WhatIs]);
        assert_eq!(directives.len(), 1);
        assert!(directives[0].contains("Requisitos"));
    }

    #[test]
    fn token_budget_follows_request_shape() {
        let extraction = generation_for(&[RuleTag::Accounting, RuleTag::Extraction]);
        assert_eq!(extraction.max_output_tokens, Some(256));
        assert_eq!(extraction.temperature, Some(0.3));

        let guidance = generation_for(&[RuleTag::Accounting, RuleTag::Guidance]);
        assert_eq!(guidance.max_output_tokens, Some(1024));

        let plain = generation_for(&[RuleTag::Accounting]);
        assert_eq!(plain.max_output_tokens, Some(768));
        assert_eq!(plain.temperature, Some(0.7));
    }
}
