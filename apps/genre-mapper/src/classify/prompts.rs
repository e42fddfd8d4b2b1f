// Prompt contract for genre classification.
// Placeholders are `{name}`; they are substituted in a single pass so text
// coming from the taxonomy or the story can never be re-expanded.

use crate::taxonomy::TaxonomyIndex;

/// Classification prompt template.
/// Replace: {taxonomy_json}, {valid_list}, {tags}, {blurb}
pub const CLASSIFY_PROMPT_TEMPLATE: &str = r#"You are a content categorization expert.
Map the story to our taxonomy using these rules:

1. CONTEXT WINS: Prioritize the story blurb over tags.
2. HONESTY: Return "[UNMAPPED]" ONLY for non-fiction instructional content (how-to guides, recipes, tutorials). Fiction stories that discuss science or technology should still be mapped to appropriate fiction genres.
3. HIERARCHY: Only use sub-genres from the valid list below.

TAXONOMY:
{taxonomy_json}

VALID LIST:
{valid_list}

IMPORTANT DISTINCTIONS:
- "How to build a telescope" = [UNMAPPED] (instructional)
- "A story exploring the physics of FTL travel" = Hard Sci-Fi (fiction with technical elements)
- "Mix flour and sugar" = [UNMAPPED] (recipe)

INPUT:
Tags: {tags}
Blurb: "{blurb}"

Respond ONLY in valid JSON format, with exactly these two fields:
{"mapped_category": "SubGenreName or [UNMAPPED]", "reasoning": "Explanation"}"#;

/// Builds the classification prompt for one story. Pure: the same index, tags
/// and blurb always produce the same string.
pub fn build_prompt(index: &TaxonomyIndex, tags: &[String], blurb: &str) -> String {
    let valid_list = index.leaves().join(", ");
    let tags = format_tags(tags);

    render(
        CLASSIFY_PROMPT_TEMPLATE,
        &[
            ("taxonomy_json", index.document_json()),
            ("valid_list", &valid_list),
            ("tags", &tags),
            ("blurb", blurb),
        ],
    )
}

/// Tags as a bracketed, quoted list. Tag text is kept verbatim.
fn format_tags(tags: &[String]) -> String {
    let quoted: Vec<String> = tags.iter().map(|t| format!("\"{t}\"")).collect();
    format!("[{}]", quoted.join(", "))
}

/// Single-pass `{key}` substitution. Unknown keys and stray braces are copied
/// through unchanged.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match replacement {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
