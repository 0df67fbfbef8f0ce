//! Intent routing: map free text to UI actions without touching the model.
//!
//! A pure function over normalized text. History triggers win outright;
//! upload triggers only fire together with an action verb, so "tengo una
//! factura" chats while "sube esta factura" opens the upload panel.

use serde::{Deserialize, Serialize};

/// UI actions the router can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentAction {
    /// Open the expense/image upload panel.
    ExpenseUpload,
    /// Open the income/document upload panel.
    DocumentUpload,
    /// Open the uploaded-documents history view.
    History,
}

impl IntentAction {
    /// The tab/panel id the UI layer navigates to.
    pub fn panel_id(self) -> &'static str {
        match self {
            IntentAction::ExpenseUpload => "upload",
            IntentAction::DocumentUpload => "upload2",
            IntentAction::History => "historial",
        }
    }

    /// The human-readable panel label.
    pub fn panel_label(self) -> &'static str {
        match self {
            IntentAction::ExpenseUpload => "Subir Imagenes",
            IntentAction::DocumentUpload => "Subir Documentos",
            IntentAction::History => "Historial",
        }
    }
}

/// A resolved intent: the action tag plus a guidance string for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResolution {
    pub action: IntentAction,
    pub guide: String,
}

const EXPENSE_KEYWORDS: &[&str] =
    &["factura", "facturas", "imagen", "imagenes", "foto", "fotos", "gasto", "gastos"];

const DOCUMENT_KEYWORDS: &[&str] =
    &["documento", "documentos", "doc", "docs", "pdf", "ingreso", "ingresos"];

const HISTORY_KEYWORDS: &[&str] =
    &["historial", "ver documentos", "documentos subidos", "ya se subieron", "subidos"];

const ACTION_VERBS: &[&str] = &["subir", "sube", "cargar", "carga", "adjuntar", "adjunta", "analizar", "analiza", "procesar", "procesa"];

/// Lowercase, strip diacritics, and trim.
///
/// The fold covers the Spanish range the keyword tables use, so "imágenes"
/// and "imagenes" normalize identically.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(fold_diacritic)
        .collect::<String>()
        .trim()
        .to_string()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        other => other,
    }
}

fn includes_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Resolve a UI intent from a user message, if any.
///
/// Precedence: history wins outright; then expense/image upload; then
/// document/income upload; otherwise no action. Upload intents require an
/// action verb in the message.
pub fn detect_intent(message: &str) -> Option<IntentResolution> {
    let text = normalize(message);

    if includes_any(&text, HISTORY_KEYWORDS) {
        return Some(IntentResolution {
            action: IntentAction::History,
            guide: "Abriendo la sección de documentos ya subidos. Sigue las indicaciones en \
                    pantalla para revisar el historial."
                .to_string(),
        });
    }

    let mentions_upload = includes_any(&text, ACTION_VERBS);

    if mentions_upload && includes_any(&text, EXPENSE_KEYWORDS) {
        return Some(IntentResolution {
            action: IntentAction::ExpenseUpload,
            guide: "Listo. Abriendo la sección para subir gastos (imágenes/facturas).".to_string(),
        });
    }

    if mentions_upload && includes_any(&text, DOCUMENT_KEYWORDS) {
        return Some(IntentResolution {
            action: IntentAction::DocumentUpload,
            guide: "Listo. Abriendo la sección para subir ingresos (documentos/PDF).".to_string(),
        });
    }

    None
}
