//! Localization for user-facing copy.
//!
//! All strings shown to a user go through a [`Translator`]. Message ids are
//! the English text itself, so a missing translation falls back to readable
//! English rather than a key.
//!
//! ```
//! use newsdesk_core::i18n::{Catalog, Translator};
//!
//! let fr = Catalog::builtin("fr");
//! assert_eq!(fr.gettext("Passwords do not match"), "Les mots de passe ne correspondent pas");
//! assert_eq!(fr.gettext("No translation for this"), "No translation for this");
//! ```

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::NewsdeskError;

/// Languages the site ships copy for.
pub const SUPPORTED_LANGUAGES: [&str; 3] = ["en", "ar", "fr"];

/// Looks up localized copy. This is the `t(key)` of every form.
pub trait Translator: Send + Sync {
    /// Translates `msgid`, returning it unchanged when no translation exists.
    fn gettext(&self, msgid: &str) -> String;

    /// Translates `msgid` and substitutes `{n}` with `n`.
    fn gettext_n(&self, msgid: &str, n: u64) -> String {
        self.gettext(msgid).replace("{n}", &n.to_string())
    }

    /// The active language code.
    fn language(&self) -> &str;
}

/// A translation catalog for a single language.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    language: String,
    messages: HashMap<String, String>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    messages: HashMap<String, String>,
}

impl Catalog {
    /// Creates an empty catalog. Every lookup returns its msgid.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            messages: HashMap::new(),
        }
    }

    /// The catalog shipped with newsdesk for `language`.
    ///
    /// Unknown languages (and `en`) get an empty catalog.
    pub fn builtin(language: &str) -> Self {
        let entries: &[(&str, &str)] = match language {
            "fr" => FRENCH,
            "ar" => ARABIC,
            _ => &[],
        };
        let mut catalog = Self::new(language);
        catalog.register(entries.iter().copied());
        catalog
    }

    /// Loads a catalog from JSON of the form `{"messages": {"msgid": "translated"}}`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the JSON is malformed.
    pub fn from_json(language: &str, json: &str) -> Result<Self, NewsdeskError> {
        let file: CatalogFile = serde_json::from_str(json).map_err(|e| {
            NewsdeskError::Configuration(format!("Invalid catalog for '{language}': {e}"))
        })?;
        Ok(Self {
            language: language.to_string(),
            messages: file.messages,
        })
    }

    /// Adds (or overwrites) translations.
    pub fn register<'a>(&mut self, entries: impl IntoIterator<Item = (&'a str, &'a str)>) {
        for (msgid, translated) in entries {
            self.messages.insert(msgid.to_string(), translated.to_string());
        }
    }

    /// Number of translated messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if no message is translated.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether the language is written right-to-left.
    pub fn is_rtl(&self) -> bool {
        self.language == "ar"
    }
}

impl Translator for Catalog {
    fn gettext(&self, msgid: &str) -> String {
        self.messages
            .get(msgid)
            .cloned()
            .unwrap_or_else(|| msgid.to_string())
    }

    fn language(&self) -> &str {
        &self.language
    }
}

const FRENCH: &[(&str, &str)] = &[
    ("This field is required", "Ce champ est obligatoire"),
    ("Invalid email address", "Adresse e-mail invalide"),
    ("Invalid phone number", "Numéro de téléphone invalide"),
    ("Invalid value", "Valeur invalide"),
    ("Please select a valid option", "Veuillez sélectionner une option valide"),
    ("Institution name is required", "Le nom de l'institution est obligatoire"),
    ("Sector is required", "Le secteur est obligatoire"),
    ("Please select a sector", "Veuillez sélectionner un secteur"),
    ("Please select a service type", "Veuillez sélectionner un type de service"),
    ("Description must be at least 10 characters", "La description doit contenir au moins 10 caractères"),
    ("Details must be at least 10 characters", "Les détails doivent contenir au moins 10 caractères"),
    ("Please select at least one ad type", "Veuillez sélectionner au moins un type d'annonce"),
    ("Please enter a valid email address", "Veuillez saisir une adresse e-mail valide"),
    ("Please enter a valid phone number", "Veuillez saisir un numéro de téléphone valide"),
    ("Email is required", "L'e-mail est obligatoire"),
    ("Password is required", "Le mot de passe est obligatoire"),
    ("Full name is required", "Le nom complet est obligatoire"),
    ("Name must be at least 2 characters", "Le nom doit contenir au moins 2 caractères"),
    ("Password must be at least 8 characters", "Le mot de passe doit contenir au moins 8 caractères"),
    ("Passwords do not match", "Les mots de passe ne correspondent pas"),
    ("You must agree to the terms of service", "Vous devez accepter les conditions d'utilisation"),
    ("You must agree to the terms and conditions", "Vous devez accepter les conditions générales"),
    ("Title is required", "Le titre est obligatoire"),
    ("Message is required", "Le message est obligatoire"),
    ("Please select at least one user", "Veuillez sélectionner au moins un utilisateur"),
    ("Failed to submit request. Please try again.", "Échec de l'envoi de la demande. Veuillez réessayer."),
    ("Error sending notification", "Erreur lors de l'envoi de la notification"),
    ("Failed to update profile", "Échec de la mise à jour du profil"),
    ("Invalid email or password", "E-mail ou mot de passe invalide"),
    ("This email is already registered", "Cet e-mail est déjà enregistré"),
    ("Network error. Please check your connection.", "Erreur réseau. Veuillez vérifier votre connexion."),
    ("An unexpected error occurred. Please try again.", "Une erreur inattendue s'est produite. Veuillez réessayer."),
    ("Just now", "À l'instant"),
    ("{n} min ago", "il y a {n} min"),
    ("{n} hours ago", "il y a {n} heures"),
    ("{n} days ago", "il y a {n} jours"),
    ("Must be at least {n} characters", "Doit contenir au moins {n} caractères"),
    ("Please select at least {n} item(s)", "Veuillez sélectionner au moins {n} élément(s)"),
];

const ARABIC: &[(&str, &str)] = &[
    ("This field is required", "هذا الحقل مطلوب"),
    ("Invalid email address", "عنوان بريد إلكتروني غير صالح"),
    ("Invalid phone number", "رقم هاتف غير صالح"),
    ("Invalid value", "قيمة غير صالحة"),
    ("Please select a valid option", "يرجى اختيار خيار صالح"),
    ("Institution name is required", "اسم المؤسسة مطلوب"),
    ("Sector is required", "القطاع مطلوب"),
    ("Please select a sector", "يرجى اختيار القطاع"),
    ("Please select a service type", "يرجى اختيار نوع الخدمة"),
    ("Description must be at least 10 characters", "يجب أن يحتوي الوصف على 10 أحرف على الأقل"),
    ("Details must be at least 10 characters", "يجب أن تحتوي التفاصيل على 10 أحرف على الأقل"),
    ("Please select at least one ad type", "يرجى اختيار نوع إعلان واحد على الأقل"),
    ("Please enter a valid email address", "يرجى إدخال بريد إلكتروني صالح"),
    ("Please enter a valid phone number", "يرجى إدخال رقم هاتف صالح"),
    ("Email is required", "البريد الإلكتروني مطلوب"),
    ("Password is required", "كلمة المرور مطلوبة"),
    ("Full name is required", "الاسم الكامل مطلوب"),
    ("Name must be at least 2 characters", "يجب أن يحتوي الاسم على حرفين على الأقل"),
    ("Password must be at least 8 characters", "يجب أن تحتوي كلمة المرور على 8 أحرف على الأقل"),
    ("Passwords do not match", "كلمات المرور غير متطابقة"),
    ("You must agree to the terms of service", "يجب الموافقة على شروط الخدمة"),
    ("You must agree to the terms and conditions", "يجب الموافقة على الشروط والأحكام"),
    ("Title is required", "العنوان مطلوب"),
    ("Message is required", "الرسالة مطلوبة"),
    ("Please select at least one user", "يرجى اختيار مستخدم واحد على الأقل"),
    ("Failed to submit request. Please try again.", "فشل إرسال الطلب. يرجى المحاولة مرة أخرى."),
    ("Error sending notification", "خطأ في إرسال الإشعار"),
    ("Failed to update profile", "فشل تحديث الملف الشخصي"),
    ("Invalid email or password", "البريد الإلكتروني أو كلمة المرور غير صحيحة"),
    ("This email is already registered", "هذا البريد الإلكتروني مسجل بالفعل"),
    ("Network error. Please check your connection.", "خطأ في الشبكة. يرجى التحقق من اتصالك."),
    ("An unexpected error occurred. Please try again.", "حدث خطأ غير متوقع. يرجى المحاولة مرة أخرى."),
    ("Just now", "الآن"),
    ("{n} min ago", "منذ {n} دقيقة"),
    ("{n} hours ago", "منذ {n} ساعات"),
    ("{n} days ago", "منذ {n} أيام"),
    ("Must be at least {n} characters", "يجب أن يحتوي على {n} أحرف على الأقل"),
    ("Please select at least {n} item(s)", "يرجى اختيار {n} عنصر على الأقل"),
];
