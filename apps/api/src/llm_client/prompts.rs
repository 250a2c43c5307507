// Shared prompt constants.
// Each stage that calls the oracle keeps its own prompts.rs alongside it.
// Only fragments shared between stages live here.

/// Common instruction appended to every résumé-writing prompt.
pub const TRUTHFULNESS_INSTRUCTION: &str = "\
    CRITICAL: Every claim must be supported by the candidate's own résumé text \
    provided in the context. Do NOT invent employers, titles, dates, metrics, \
    certifications or technologies. Keywords under `hands_on` may be stated as \
    direct experience. Keywords under `familiar` may only be described as \
    exposure or working knowledge. Keywords under `banned_terms` must NOT \
    appear anywhere in the output, in any casing or spelling. This is a hard rule.";
