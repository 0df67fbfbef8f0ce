//! Data-driven classification rules for the policy engine.
//!
//! One table of `(tag, pattern)` rows, compiled once. Patterns match
//! against normalized text (lowercased, diacritics stripped), so they are
//! written unaccented. Keeping the rules as data means each row is
//! independently testable and extensible without touching the turn
//! pipeline.

use std::sync::LazyLock;

use regex::Regex;

/// Classification tags the rule table can assign to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTag {
    /// A standalone greeting.
    Greeting,
    /// Accounting-domain vocabulary is present.
    Accounting,
    /// A "how do I ..." procedure request.
    HowTo,
    /// A "what is ..." definition request.
    WhatIs,
    /// An extraction-style ask (a specific value or list).
    Extraction,
    /// A guidance-style ask (steps, recommendations).
    Guidance,
}

static RULES: LazyLock<Vec<(RuleTag, Regex)>> = LazyLock::new(|| {
    [
        (
            RuleTag::Greeting,
            r"(?:^|[\s¡¿(])(hola|hello|hi|buenas|buenos dias|buenas tardes|buenas noches|oye|que tal)(?:$|[\s!.,;:?¡¿)])",
        ),
        (
            RuleTag::Accounting,
            r"\b(facturas?|iva|impuestos?|deducci(on|ones)|declaraci(on|ones)|contabilidad|contable|balances?|ingresos?|gastos?|nominas?|retenci(on|ones)|saldos?|cuentas?|estado de cuenta|recibos?|comprobantes?|presupuestos?|folios?|fiscal|sat|rfc)\b",
        ),
        (
            RuleTag::HowTo,
            r"\b(como (se )?(hago|hacer|presento|presentar|declaro|declarar|calculo|calcular|registro|registrar|facturo|facturar|pago|pagar|deduzco|deducir)|how to|pasos para)\b",
        ),
        (
            RuleTag::WhatIs,
            r"\b(que es|que son|que significa|explicame|explica|define|definicion de)\b",
        ),
        (
            RuleTag::Extraction,
            r"\b(extrae|extraer|dame (el|la|los|las)|dime (el|la|cuanto)|cual es (el|la)|cuanto (es|son|debo)|lista (los|las)|suma de)\b",
        ),
        (
            RuleTag::Guidance,
            r"\b(como|pasos|guia|recomienda|recomendacion|ayudame a|que debo|conviene)\b",
        ),
    ]
    .into_iter()
    .map(|(tag, pattern)| (tag, Regex::new(pattern).expect("rule pattern is valid")))
    .collect()
});

/// Every tag whose pattern matches the normalized text.
pub fn classify(normalized: &str) -> Vec<RuleTag> {
    RULES
        .iter()
        .filter(|(_, regex)| regex.is_match(normalized))
        .map(|(tag, _)| *tag)
        .collect()
}

/// Whether the normalized text carries the given tag.
pub fn has_tag(normalized: &str, tag: RuleTag) -> bool {
    RULES
        .iter()
        .any(|(t, regex)| *t == tag && regex.is_match(normalized))
}
