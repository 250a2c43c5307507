// All oracle prompt constants for the Tailoring module.
// Reuses cross-cutting fragments from llm_client::prompts.
//
// Templates carry instructions only. Structured data travels in
// `OracleRequest::context` and is never spliced into these strings.

/// System prompt for résumé tailoring: enforces JSON-only output.
pub const TAILOR_SYSTEM: &str = "You are an expert résumé writer tailoring a candidate's \
    existing résumé to a specific job without inventing experience. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Tailoring instruction template.
/// Replace: {truthfulness_instruction}, {role_label}, {job_title}
pub const TAILOR_PROMPT_TEMPLATE: &str = r#"{truthfulness_instruction}

Rewrite the candidate's résumé for the role "{job_title}" ({role_label}).

The CONTEXT below contains:
- `resume_text`: the candidate's original résumé, the ONLY source of facts
- `keywords.hands_on`: keywords the résumé directly evidences; use them where they fit
- `keywords.familiar`: keywords with adjacent evidence only; describe as working knowledge
- `banned_terms`: words that must not appear anywhere in your output
- `weighting_hints`: themes to emphasise (`prefer`) and to play down (`deprioritize`)
- `requirements`: the posting's stated requirements

Return a JSON object with this EXACT schema (no extra fields):
{
  "summary": "2-4 sentence professional summary",
  "experience": [
    {
      "title": "Job title exactly as in the résumé",
      "company": "Employer exactly as in the résumé",
      "duration": "Dates exactly as in the résumé",
      "achievements": ["One achievement per string, no bullet characters"]
    }
  ],
  "skills": ["One skill per string"]
}

HARD RULES:
1. Keep every employer, title and date exactly as the résumé states them
2. Never add a metric, certification or technology the résumé does not contain
3. No tables, columns, decorative symbols or custom section headers
4. Plain text only inside every string"#;

/// Appended on the single re-request after a truthfulness violation.
/// Replace: {offending_terms}
pub const VIOLATION_RETRY_TEMPLATE: &str = r#"

YOUR PREVIOUS RESPONSE WAS REJECTED.
It contained these banned terms: {offending_terms}.
The candidate's résumé gives NO evidence for them. Remove every occurrence,
including synonyms, abbreviations and partial words. Do not replace them with
a claim of experience. If a sentence only makes sense with a banned term,
delete the sentence."#;

/// System prompt for gap interview questions.
pub const GAP_QUESTION_SYSTEM: &str = "You are an experienced technical interviewer \
    preparing a candidate for an interview. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Gap question instruction template.
/// Replace: {keyword}
pub const GAP_QUESTION_PROMPT_TEMPLATE: &str = r#"The job requires "{keyword}" but the candidate's résumé shows no experience with it.

Write ONE interview question an interviewer is likely to ask to probe this gap,
using the job and candidate details in the CONTEXT below.

Return a JSON object with this EXACT schema:
{
  "question": "The interview question",
  "rationale": "One or two sentences on why this gap matters for the role"
}"#;
