//! Negative-intent detection for the options stage.
//!
//! An option turn containing any vocabulary term (after trimming and
//! lowercasing) closes the stage. Matching is by substring, so "nothing
//! more" and "더 없어요" both match; so does any word that merely contains a
//! term, e.g. "snow" contains "no".

/// Terms meaning "none", "no" or "nothing further".
pub const NEGATIVE_INTENT_TERMS: &[&str] = &[
    "없어",
    "없음",
    "없습니다",
    "없다",
    "아니요",
    "아니오",
    "아니",
    "됐어",
    "그만",
    "none",
    "nothing",
    "nope",
    "no",
];

/// The first vocabulary term found in `text`, if any.
pub fn negative_intent_term(text: &str) -> Option<&'static str> {
    let normalized = text.trim().to_lowercase();
    NEGATIVE_INTENT_TERMS
        .iter()
        .copied()
        .find(|term| normalized.contains(term))
}
