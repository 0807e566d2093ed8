//! Built-in note templates.
//!
//! Installed into an empty template directory by
//! [`TemplateEngine::install_defaults`](super::TemplateEngine::install_defaults).

/// `(name, text)` pairs of the built-in templates.
pub const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("base_note", BASE_NOTE),
    ("daily_note", DAILY_NOTE),
    ("idea_note", IDEA_NOTE),
    ("meeting_note", MEETING_NOTE),
    ("task_note", TASK_NOTE),
];

/// Parent layout for notes that only override a few sections.
const BASE_NOTE: &str = r#"---
type: {{block "type"}}note{{/block}}
created: {{date_iso}}
tags:
  - "{{block "tag"}}note{{/block}}"{{#each ai_tags}}
  - "{{@item}}"{{/each}}
ai_processed: {{ai_processed}}
{{block "meta"}}{{/block}}
---

# {{block "title"}}{{#if ai_summary}}{{truncate(ai_summary, 50)}}{{else}}Untitled note{{/if}}{{/block}}

{{block "body"}}{{#if content}}
{{content}}
{{else}}
Write the note here.
{{/if}}{{/block}}

{{block "footer"}}Captured from #{{channel_name}} by {{default(author_name, "unknown")}} on {{date_format(current_date, "%Y-%m-%d %H:%M")}}{{/block}}
"#;

const DAILY_NOTE: &str = r#"---
type: daily
date: {{date_ymd}}
tags:
  - "daily"
  - "{{date_format(current_date, "%Y-%m")}}"
---

# {{date_format(current_date, "%A, %B %d %Y")}} - Daily Note

## Activity Log

{{#if ai_processed}}
### Processed message
- **Summary**: {{ai_summary}}
- **Category**: {{ai_category}}
- **Tags**: {{tag_list(ai_tags)}}
{{/if}}

## Daily Tasks
{{#each ai_key_points}}
- [ ] {{@item}}{{/each}}

## Stats

- **Processing time**: {{number_format(processing_time)}}ms
- **Messages**: 1
- **AI processing**: {{#if ai_processed}}done{{else}}pending{{/if}}

## Reflection

Write today's reflection here.
"#;

const IDEA_NOTE: &str = r#"---
type: idea
created: {{date_iso}}
tags:
  - "idea"{{#if ai_category}}
  - "{{ai_category}}"{{/if}}{{#each ai_tags}}
  - "{{@item}}"{{/each}}
ai_processed: {{ai_processed}}
{{#if ai_processed}}
ai_confidence: {{ai_confidence}}
{{/if}}
---

# {{#if ai_summary}}{{truncate(ai_summary, 50)}}{{else}}New idea{{/if}}

## Overview

{{#if content}}
{{content}}
{{else}}
Describe the idea here.
{{/if}}

{{#if ai_processed}}
## AI Analysis

**Summary**: {{ai_summary}}

{{#if ai_key_points}}
### Key points
{{#each ai_key_points}}
- {{@item}}{{/each}}
{{/if}}

**Category**: {{ai_category}} (confidence: {{number_format(ai_confidence, "percent")}})

{{#if ai_reasoning}}
**Reasoning**: {{ai_reasoning}}
{{/if}}
{{/if}}

## Next Actions

- [ ] Flesh out the idea
- [ ] Check feasibility
- [ ] Collect related material

## Tags

{{tag_list(ai_tags)}}

## Created

{{date_format(current_date, "%Y-%m-%d %H:%M")}}
"#;

const MEETING_NOTE: &str = r#"---
type: meeting
date: {{date_ymd}}
tags:
  - "meeting"{{#if ai_category}}
  - "{{ai_category}}"{{/if}}
ai_processed: {{ai_processed}}
participants: []
---

# Meeting Notes - {{date_format(current_date, "%Y-%m-%d")}}

## Details

- **When**: {{date_format(current_date, "%Y-%m-%d %H:%M")}}
- **Participants**:
- **Location**:

## Agenda

{{#if ai_key_points}}{{#each ai_key_points}}
1. {{@item}}{{/each}}
{{else}}
1. Agenda item
{{/if}}

## Discussion

{{#if content}}
{{content}}
{{else}}
Record the discussion here.
{{/if}}

{{#if ai_processed}}
## AI Summary

{{ai_summary}}

**Category**: {{ai_category}} ({{number_format(ai_confidence, "percent")}})
{{/if}}

## Action Items

- [ ] Follow up
"#;

const TASK_NOTE: &str = r#"{{extends "base_note"}}
{{block "type"}}task{{/block}}
{{block "tag"}}task{{/block}}
{{block "meta"}}status: todo
due: ""{{/block}}
{{block "title"}}Task: {{#if ai_summary}}{{truncate(ai_summary, 60)}}{{else}}{{truncate(content, 60)}}{{/if}}{{/block}}
{{block "body"}}## Description

{{default(content, "Describe the task here.")}}
{{#if ai_key_points}}
## Steps
{{#each ai_key_points}}
- [ ] {{@item}}{{/each}}
{{/if}}

## Status

- [ ] Not started{{/block}}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::parse;

    #[test]
    fn test_defaults_parse() {
        for (name, text) in DEFAULT_TEMPLATES {
            assert!(parse(text).is_ok(), "{name} does not parse");
        }
    }

    #[test]
    fn test_default_names_are_valid() {
        for (name, _) in DEFAULT_TEMPLATES {
            assert!(crate::storage::validate_template_name(name).is_ok());
        }
    }
}
