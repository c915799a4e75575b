use crate::domain::item::{truncate_chars, MAX_TEXT_CHARS};

const SYSTEM_INSTRUCTION: &str = "Analyze if this tweet explicitly recommends buying cryptocurrency. \
Respond ONLY with 'YES' or 'NO'.";

/// Llama-3 instruct template asking for a single YES/NO token.
pub fn build_prompt(text: &str) -> String {
    format!(
        "<|begin_of_text|>\
<|start_header_id|>system<|end_header_id|>{SYSTEM_INSTRUCTION}<|eot_id|>\
<|start_header_id|>user<|end_header_id|>{}<|eot_id|>\
<|start_header_id|>assistant<|end_header_id|>",
        truncate_chars(text, MAX_TEXT_CHARS)
    )
}

/// Reduces the model's generated text to a decision: exactly `YES` after trimming.
pub fn is_affirmative(generated: &str) -> bool {
    generated.trim().to_uppercase() == "YES"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_text_between_user_and_assistant_headers() {
        let p = build_prompt("Buy $XYZ now!!");
        assert!(p.starts_with("<|begin_of_text|><|start_header_id|>system<|end_header_id|>Analyze"));
        assert!(p.contains("<|start_header_id|>user<|end_header_id|>Buy $XYZ now!!<|eot_id|>"));
        assert!(p.ends_with("<|start_header_id|>assistant<|end_header_id|>"));
    }

    #[test]
    fn prompt_caps_text() {
        let p = build_prompt(&"a".repeat(2_000));
        assert_eq!(p.matches('a').count() - build_prompt("").matches('a').count(), MAX_TEXT_CHARS);
    }

    #[test]
    fn only_exact_yes_is_affirmative() {
        assert!(is_affirmative(" yes "));
        assert!(is_affirmative("YES\n"));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("YES."));
        assert!(!is_affirmative("yes, buy"));
        assert!(!is_affirmative(""));
    }
}
