//! User-facing strings
use phf::phf_map;
use serde::{Deserialize, Serialize};

/// Language options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    French,
}

impl Language {
    /// Parse language from string
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "fr" | "french" | "francais" | "français" => Self::French,
            _ => Self::English,
        }
    }

    /// Get language code string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::French => "fr",
        }
    }
}

/// English messages
pub static MESSAGES_EN: phf::Map<&'static str, &'static str> = phf_map! {
    "title" => "Potato Disease Prediction",
    "instructions" => "Select an image of a potato leaf to check for diseases",
    "take_photo" => "Take Photo",
    "gallery" => "Gallery",
    "clear" => "Clear",
    "predicting" => "Predicting...",
    "prediction_failed" => "Prediction failed",
    "analyzing" => "Analyzing image...",
    "diagnosis" => "Diagnosis",
    "confidence" => "Confidence",
    "camera_permission_required" => "Permission to access camera is required!",
    "library_permission_required" => "Permission to access library is required!",
    "select_failed" => "Failed to select image",
    "busy" => "A prediction is already running",
    "selected_image" => "Image",
};

/// French messages
pub static MESSAGES_FR: phf::Map<&'static str, &'static str> = phf_map! {
    "title" => "Détection des maladies de la pomme de terre",
    "instructions" => "Sélectionnez une image de feuille de pomme de terre pour détecter les maladies",
    "take_photo" => "Prendre une photo",
    "gallery" => "Galerie",
    "clear" => "Effacer",
    "predicting" => "Prédiction en cours...",
    "prediction_failed" => "Échec de la prédiction",
    "analyzing" => "Analyse de l'image...",
    "diagnosis" => "Diagnostic",
    "confidence" => "Confiance",
    "camera_permission_required" => "L'accès à l'appareil photo est requis !",
    "library_permission_required" => "L'accès à la galerie est requis !",
    "select_failed" => "Impossible de sélectionner l'image",
    "busy" => "Une prédiction est déjà en cours",
    "selected_image" => "Image",
};

/// Get UI messages dictionary by language
pub fn get_messages(lang: Language) -> &'static phf::Map<&'static str, &'static str> {
    match lang {
        Language::English => &MESSAGES_EN,
        Language::French => &MESSAGES_FR,
    }
}

/// Get a single UI message by key and language
/// Returns the message if found, otherwise returns the key as a fallback
pub fn get_message<'a>(key: &'a str, lang: Language) -> &'a str {
    let messages = get_messages(lang);
    match messages.get(key) {
        Some(msg) => msg,
        None => key,
    }
}
