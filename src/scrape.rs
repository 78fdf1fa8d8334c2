//! Form-field scraping
//!
//! The collection logic runs inside the remote browser's document context,
//! shipped across the CDP boundary as a serialized closure with no access
//! to gateway state. Everything that does not need the live DOM - required
//! flags derived from label text, option deduplication - is done here in
//! Rust so the heuristics stay pure and testable.

use serde::{Deserialize, Serialize};

/// Text pattern signaling that an application form has rendered. Matched
/// case-insensitively against the page body during the best-effort wait.
pub const FORM_READY_PATTERN: &str = "apply|application|submit|required";

/// Serialized in-page closure collecting visible form controls.
///
/// Returns `{fields: [...], groups: [...]}` with raw per-element data;
/// label resolution walks `for=`/id pairs, enclosing labels, then the
/// nearest preceding heading or legend.
pub const COLLECT_FORM_FIELDS_JS: &str = r#"
(() => {
    const visible = (el) => {
        const style = window.getComputedStyle(el);
        if (style.display === 'none' || style.visibility === 'hidden') return false;
        return (el.type || '').toLowerCase() !== 'hidden';
    };

    const labelFor = (el) => {
        if (el.id) {
            const tagged = document.querySelector('label[for="' + CSS.escape(el.id) + '"]');
            if (tagged) return tagged.innerText.trim();
        }
        const wrapping = el.closest('label');
        if (wrapping) return wrapping.innerText.trim();
        let node = el.parentElement;
        while (node) {
            const heading = node.querySelector('h1,h2,h3,h4,h5,h6,legend');
            if (heading) return heading.innerText.trim();
            node = node.parentElement;
        }
        return '';
    };

    const controlKind = (el) => {
        const tag = el.tagName.toLowerCase();
        if (tag === 'select' || tag === 'textarea') return tag;
        return (el.type || 'text').toLowerCase();
    };

    const fields = [];
    for (const el of document.querySelectorAll('input, select, textarea')) {
        if (!visible(el)) continue;
        fields.push({
            control: controlKind(el),
            type: (el.type || '').toLowerCase(),
            label: labelFor(el),
            name: el.name || '',
            placeholder: el.placeholder || '',
            explicit_required: el.hasAttribute('required'),
            aria_required: el.getAttribute('aria-required') === 'true',
        });
    }

    const groups = new Map();
    for (const el of document.querySelectorAll('input[type=radio], input[type=checkbox]')) {
        if (!visible(el)) continue;
        const key = el.name || el.id || labelFor(el) || 'ungrouped';
        if (!groups.has(key)) {
            groups.set(key, {
                control: controlKind(el),
                group: key,
                label: labelFor(el),
                explicit_required: false,
                aria_required: false,
                options: [],
            });
        }
        const group = groups.get(key);
        group.explicit_required = group.explicit_required || el.hasAttribute('required');
        group.aria_required = group.aria_required || el.getAttribute('aria-required') === 'true';
        const wrapping = el.closest('label');
        group.options.push(wrapping ? wrapping.innerText.trim() : (el.value || ''));
    }

    return { fields, groups: Array.from(groups.values()) };
})()
"#;

/// Raw per-element record produced in-page, before heuristics resolve.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawField {
    #[serde(default)]
    pub control: String,
    #[serde(default, rename = "type")]
    pub control_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub explicit_required: bool,
    #[serde(default)]
    pub aria_required: bool,
}

/// Raw radio/checkbox group produced in-page.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGroup {
    #[serde(default)]
    pub control: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub explicit_required: bool,
    #[serde(default)]
    pub aria_required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

/// Everything the in-page closure returns.
#[derive(Debug, Default, Deserialize)]
pub struct ScrapeResult {
    #[serde(default)]
    pub fields: Vec<RawField>,
    #[serde(default)]
    pub groups: Vec<RawGroup>,
}

/// Resolved field descriptor exposed in the extraction report.
#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub control: String,
    #[serde(rename = "type")]
    pub control_type: String,
    pub label: String,
    pub name: String,
    pub placeholder: String,
    pub required: bool,
}

/// Resolved radio/checkbox group descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct FieldGroup {
    pub control: String,
    pub group: String,
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub required: bool,
}

/// A resolved label marks its field required when it trails an asterisk.
pub fn label_marks_required(label: &str) -> bool {
    let trimmed = label.trim_end();
    trimmed.ends_with('*') || trimmed.ends_with('\u{2731}')
}

/// Order-preserving deduplication of option labels.
pub fn dedup_preserving(options: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(options.len());
    for option in options {
        if !seen.contains(&option) {
            seen.push(option);
        }
    }
    seen
}

/// Combine the in-page flags with the label heuristic.
pub fn resolve_field(raw: RawField) -> FormField {
    let required = raw.explicit_required || raw.aria_required || label_marks_required(&raw.label);
    FormField {
        control: raw.control,
        control_type: raw.control_type,
        label: raw.label,
        name: raw.name,
        placeholder: raw.placeholder,
        required,
    }
}

/// Combine the in-page group flags, deduplicating options in order.
pub fn resolve_group(raw: RawGroup) -> FieldGroup {
    let required = raw.explicit_required || raw.aria_required || label_marks_required(&raw.label);
    FieldGroup {
        control: raw.control,
        group: raw.group,
        label: raw.label,
        options: dedup_preserving(raw.options),
        required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_field(label: &str) -> RawField {
        RawField {
            control: "text".into(),
            control_type: "text".into(),
            label: label.into(),
            name: "field".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_label_asterisk_marks_required() {
        assert!(label_marks_required("Full name *"));
        assert!(label_marks_required("Email*"));
        assert!(label_marks_required("Phone \u{2731}"));
        assert!(!label_marks_required("Full name"));
        assert!(!label_marks_required("*Leading star"));
    }

    #[test]
    fn test_dedup_preserves_order() {
        let options = vec![
            "Yes".to_string(),
            "No".to_string(),
            "Yes".to_string(),
            "Maybe".to_string(),
            "No".to_string(),
        ];
        assert_eq!(dedup_preserving(options), vec!["Yes", "No", "Maybe"]);
    }

    #[test]
    fn test_resolve_field_required_sources() {
        assert!(!resolve_field(raw_field("Plain")).required);
        assert!(resolve_field(raw_field("Starred *")).required);

        let mut explicit = raw_field("Plain");
        explicit.explicit_required = true;
        assert!(resolve_field(explicit).required);

        let mut aria = raw_field("Plain");
        aria.aria_required = true;
        assert!(resolve_field(aria).required);
    }

    #[test]
    fn test_resolve_group_dedups_and_flags() {
        let raw = RawGroup {
            control: "radio".into(),
            group: "remote".into(),
            label: "Remote? *".into(),
            explicit_required: false,
            aria_required: false,
            options: vec!["Yes".into(), "No".into(), "Yes".into()],
        };
        let group = resolve_group(raw);
        assert_eq!(group.options, vec!["Yes", "No"]);
        assert!(group.required);
    }

    #[test]
    fn test_empty_options_omitted_from_json() {
        let group = FieldGroup {
            control: "checkbox".into(),
            group: "ungrouped".into(),
            label: String::new(),
            options: Vec::new(),
            required: false,
        };
        let json = serde_json::to_value(&group).unwrap();
        assert!(json.get("options").is_none());
    }

    #[test]
    fn test_scrape_result_tolerates_missing_keys() {
        let result: ScrapeResult = serde_json::from_str("{}").unwrap();
        assert!(result.fields.is_empty());
        assert!(result.groups.is_empty());

        let result: ScrapeResult =
            serde_json::from_str(r#"{"fields": [{"control": "select"}]}"#).unwrap();
        assert_eq!(result.fields[0].control, "select");
    }
}
