//! Language detection and per-language canned text.

use verdant_core::types::RequestContext;

/// Language code returned when Cyrillic text is found.
pub const CYRILLIC_LANGUAGE: &str = "ru";

/// Detect the user's language.
///
/// Scans the current message, then history newest first, for Cyrillic
/// characters. Falls back to the context's declared language, then to
/// `default_language`.
pub fn detect_language(context: &RequestContext, default_language: &str) -> String {
    let texts = std::iter::once(context.user_message.as_str())
        .chain(context.history.iter().rev().map(|m| m.content.as_str()));

    for text in texts {
        if contains_cyrillic(text) {
            return CYRILLIC_LANGUAGE.to_string();
        }
    }

    context
        .user_language
        .as_deref()
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unwrap_or(default_language)
        .to_string()
}

fn contains_cyrillic(text: &str) -> bool {
    text.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c))
}

/// Prompt used when nothing usable is left of the user's request.
pub fn generic_prompt(language: &str) -> &'static str {
    match language {
        CYRILLIC_LANGUAGE => "Красивый ландшафтный дизайн сада с растениями и дорожками",
        _ => "Beautiful landscape garden design with plants and paths",
    }
}

/// Reply sent when every generation attempt failed.
pub fn consultation_redirect(language: &str) -> &'static str {
    match language {
        CYRILLIC_LANGUAGE => {
            "Сейчас не получилось создать изображение. Опишите словами, что вы хотели бы увидеть, \
             и я предложу концепцию дизайна в текстовом виде."
        }
        _ => {
            "I couldn't create the image right now. Could you describe in words what you'd like \
             to see? I can suggest a design concept in text instead."
        }
    }
}

/// Caption used when the backend returns images without text.
pub fn generation_caption(language: &str) -> &'static str {
    match language {
        CYRILLIC_LANGUAGE => "Вот сгенерированный вариант дизайна.",
        _ => "Here is the generated design.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdant_core::types::ConversationMessage;

    #[test]
    fn test_current_message_wins() {
        let ctx = RequestContext::new("Нарисуй сад");
        assert_eq!(detect_language(&ctx, "en"), "ru");
    }

    #[test]
    fn test_history_is_scanned() {
        let ctx = RequestContext::new("ok, draw it")
            .with_history(vec![ConversationMessage::user("Хочу пруд")]);
        assert_eq!(detect_language(&ctx, "en"), "ru");
    }

    #[test]
    fn test_declared_language_then_default() {
        let ctx = RequestContext::new("draw a pond").with_language("de");
        assert_eq!(detect_language(&ctx, "en"), "de");
        assert_eq!(detect_language(&RequestContext::new("draw"), "en"), "en");
    }
}
