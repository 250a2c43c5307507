//! Micro edits: deterministic cleanups applied to generated content, plus
//! suggestions the user may choose to act on.
//!
//! Applied edits never introduce an omitted keyword: any edit whose new text
//! contains a banned form is dropped.

use std::collections::HashSet;

use crate::analysis::taxonomy::Taxonomy;
use crate::tailoring::models::{MicroEdit, MicroEditKind, ResumeBody};
use crate::tailoring::truthfulness::{contains_banned, BannedTerm, TruthAssignment, TruthLevel};

const BULLET_GLYPHS: &[char] = &['•', '▪', '◦', '‣', '●', '■', '►', '➢', '–', '-', '*'];
const SUMMARY_MAX_WORDS: usize = 60;

pub struct MicroEditOutcome {
    pub body: ResumeBody,
    pub applied: Vec<MicroEdit>,
    pub suggested: Vec<MicroEdit>,
}

pub fn apply_micro_edits(
    mut body: ResumeBody,
    assignments: &[TruthAssignment],
    banned: &[BannedTerm],
    taxonomy: &Taxonomy,
) -> MicroEditOutcome {
    let mut applied = Vec::new();

    trim_whitespace(&mut body, &mut applied);
    strip_bullet_glyphs(&mut body, &mut applied);
    canonicalize_skill_casing(&mut body, taxonomy, banned, &mut applied);
    remove_duplicate_skills(&mut body, taxonomy, &mut applied);
    add_missing_hands_on_skills(&mut body, assignments, banned, taxonomy, &mut applied);

    let suggested = suggest_edits(&body, assignments, taxonomy);

    MicroEditOutcome {
        body,
        applied,
        suggested,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Applied edits
// ────────────────────────────────────────────────────────────────────────────

fn trim_whitespace(body: &mut ResumeBody, applied: &mut Vec<MicroEdit>) {
    let mut trim = |target: String, field: &mut String| {
        let trimmed = field.trim();
        if trimmed.len() != field.len() {
            let after = trimmed.to_string();
            applied.push(edit(MicroEditKind::Whitespace, target, field, &after));
            *field = after;
        }
    };

    trim("summary".to_string(), &mut body.summary);
    for (i, entry) in body.experience.iter_mut().enumerate() {
        trim(format!("experience[{i}].title"), &mut entry.title);
        trim(format!("experience[{i}].company"), &mut entry.company);
        trim(format!("experience[{i}].duration"), &mut entry.duration);
        for (j, achievement) in entry.achievements.iter_mut().enumerate() {
            trim(format!("experience[{i}].achievements[{j}]"), achievement);
        }
    }
    for (i, skill) in body.skills.iter_mut().enumerate() {
        trim(format!("skills[{i}]"), skill);
    }
}

fn strip_bullet_glyphs(body: &mut ResumeBody, applied: &mut Vec<MicroEdit>) {
    for (i, entry) in body.experience.iter_mut().enumerate() {
        for (j, achievement) in entry.achievements.iter_mut().enumerate() {
            let Some(stripped) = strip_bullet(achievement) else {
                continue;
            };
            let after = stripped.to_string();
            applied.push(edit(
                MicroEditKind::BulletGlyph,
                format!("experience[{i}].achievements[{j}]"),
                achievement,
                &after,
            ));
            *achievement = after;
        }
    }
}

/// Text after a leading bullet glyph, if there is one.
fn strip_bullet(text: &str) -> Option<&str> {
    let mut chars = text.char_indices();
    let (_, first) = chars.next()?;
    let (rest_at, second) = chars.next()?;
    if BULLET_GLYPHS.contains(&first) && second.is_whitespace() {
        Some(text[rest_at..].trim_start())
    } else {
        None
    }
}

/// "postgresql" → "PostgreSQL". Case-only changes; aliases stay as written.
fn canonicalize_skill_casing(
    body: &mut ResumeBody,
    taxonomy: &Taxonomy,
    banned: &[BannedTerm],
    applied: &mut Vec<MicroEdit>,
) {
    for (i, skill) in body.skills.iter_mut().enumerate() {
        let current = skill.as_str();
        let Some(def) = taxonomy.lookup(current) else {
            continue;
        };
        let Some(form) = def
            .surface_forms()
            .find(|f| f.eq_ignore_ascii_case(current) && *f != current)
        else {
            continue;
        };
        if contains_banned(form, banned) {
            continue;
        }
        applied.push(edit(MicroEditKind::CanonicalCasing, format!("skills[{i}]"), skill, form));
        *skill = form.to_string();
    }
}

fn remove_duplicate_skills(body: &mut ResumeBody, taxonomy: &Taxonomy, applied: &mut Vec<MicroEdit>) {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(body.skills.len());
    for (i, skill) in body.skills.drain(..).enumerate() {
        if skill.is_empty() || !seen.insert(taxonomy.canonicalize(&skill).to_lowercase()) {
            applied.push(MicroEdit {
                kind: MicroEditKind::DuplicateSkill,
                target: format!("skills[{i}]"),
                before: Some(skill),
                after: None,
                note: "Removed duplicate or empty skill".to_string(),
            });
            continue;
        }
        kept.push(skill);
    }
    body.skills = kept;
}

fn add_missing_hands_on_skills(
    body: &mut ResumeBody,
    assignments: &[TruthAssignment],
    banned: &[BannedTerm],
    taxonomy: &Taxonomy,
    applied: &mut Vec<MicroEdit>,
) {
    let text = body.full_text();
    for assignment in assignments.iter().filter(|a| a.level == TruthLevel::HandsOn) {
        if taxonomy.mentions(&text, &assignment.keyword) || contains_banned(&assignment.keyword, banned) {
            continue;
        }
        applied.push(MicroEdit {
            kind: MicroEditKind::AddSkill,
            target: format!("skills[{}]", body.skills.len()),
            before: None,
            after: Some(assignment.keyword.clone()),
            note: "Added a keyword the résumé already evidences".to_string(),
        });
        body.skills.push(assignment.keyword.clone());
    }
}

fn edit(kind: MicroEditKind, target: String, before: &str, after: &str) -> MicroEdit {
    let note = match kind {
        MicroEditKind::Whitespace => "Trimmed surrounding whitespace",
        MicroEditKind::BulletGlyph => "Removed bullet glyph",
        MicroEditKind::CanonicalCasing => "Normalized keyword casing",
        _ => "",
    };
    MicroEdit {
        kind,
        target,
        before: Some(before.to_string()),
        after: Some(after.to_string()),
        note: note.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Suggestions
// ────────────────────────────────────────────────────────────────────────────

fn suggest_edits(
    body: &ResumeBody,
    assignments: &[TruthAssignment],
    taxonomy: &Taxonomy,
) -> Vec<MicroEdit> {
    let mut suggested = Vec::new();
    let text = body.full_text();

    for assignment in assignments.iter().filter(|a| a.level == TruthLevel::Familiar) {
        if taxonomy.mentions(&text, &assignment.keyword) {
            continue;
        }
        suggested.push(MicroEdit {
            kind: MicroEditKind::UseFamiliarKeyword,
            target: "summary".to_string(),
            before: None,
            after: None,
            note: format!(
                "Your résumé shows related experience. If accurate, mention working knowledge of {}.",
                assignment.keyword
            ),
        });
    }

    for (i, entry) in body.experience.iter().enumerate() {
        for (j, achievement) in entry.achievements.iter().enumerate() {
            if achievement.is_empty() || achievement.chars().any(|c| c.is_ascii_digit()) {
                continue;
            }
            suggested.push(MicroEdit {
                kind: MicroEditKind::QuantifyAchievement,
                target: format!("experience[{i}].achievements[{j}]"),
                before: Some(achievement.clone()),
                after: None,
                note: "Add a number (scale, time saved, percentage) if you can support it.".to_string(),
            });
        }
    }

    let summary_words = body.summary.split_whitespace().count();
    if summary_words > SUMMARY_MAX_WORDS {
        suggested.push(MicroEdit {
            kind: MicroEditKind::ShortenSummary,
            target: "summary".to_string(),
            before: None,
            after: None,
            note: format!(
                "Summary is {summary_words} words; aim for {SUMMARY_MAX_WORDS} or fewer."
            ),
        });
    }

    suggested
}
