//! Static fr/en message catalog behind the `Translator` port.
//!
//! Region subtags are ignored (`en-US` reads the `en` table). Unknown
//! languages fall back to French, unknown keys come back unchanged.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use domains::traits::Translator;

pub const FALLBACK_LANG: &str = "fr";

type Table = HashMap<&'static str, &'static str>;

static FR: Lazy<Table> = Lazy::new(|| {
    HashMap::from([
        ("BoardNotFound", "Tableau introuvable"),
        ("ListNotFound", "Liste introuvable"),
        ("CardNotFound", "Carte introuvable"),
        ("CommentNotFound", "Commentaire introuvable"),
        ("ChecklistNotFound", "Checklist introuvable"),
        ("ChecklistItemNotFound", "Élément de checklist introuvable"),
        ("BackgroundNotFound", "Fond d'écran introuvable"),
        ("UserNotFound", "Utilisateur introuvable"),
        ("Forbidden", "Accès refusé"),
        ("BackgroundUsedInBoard", "Ce fond d'écran est utilisé par un tableau"),
        ("InvalidCredentials", "Identifiants invalides"),
        ("NotAuthorized", "Non autorisé"),
        ("InvalidPayload", "Données invalides"),
        ("InvalidJson", "JSON invalide"),
        ("IdNotMatching", "L'identifiant de l'URL et celui du corps doivent correspondre"),
        ("UnknownSibling", "Élément inconnu dans l'ordre demandé"),
        ("InternalError", "Erreur interne du serveur"),
    ])
});

static EN: Lazy<Table> = Lazy::new(|| {
    HashMap::from([
        ("BoardNotFound", "Board not found"),
        ("ListNotFound", "List not found"),
        ("CardNotFound", "Card not found"),
        ("CommentNotFound", "Comment not found"),
        ("ChecklistNotFound", "Checklist not found"),
        ("ChecklistItemNotFound", "Checklist item not found"),
        ("BackgroundNotFound", "Background not found"),
        ("UserNotFound", "User not found"),
        ("Forbidden", "Forbidden"),
        ("BackgroundUsedInBoard", "This background is used by a board"),
        ("InvalidCredentials", "Invalid credentials"),
        ("NotAuthorized", "Not authorized"),
        ("InvalidPayload", "Invalid payload"),
        ("InvalidJson", "Invalid JSON"),
        ("IdNotMatching", "ID in URL and body must match"),
        ("UnknownSibling", "Unknown item in the requested order"),
        ("InternalError", "Internal server error"),
    ])
});

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

impl StaticCatalog {
    fn table(lang: &str) -> &'static Table {
        let primary = lang.split(['-', '_']).next().unwrap_or(FALLBACK_LANG);
        if primary.eq_ignore_ascii_case("en") {
            &EN
        } else {
            &FR
        }
    }
}

impl Translator for StaticCatalog {
    fn translate(&self, lang: &str, key: &str) -> String {
        Self::table(lang).get(key).map_or_else(|| key.to_string(), |msg| (*msg).to_string())
    }
}
