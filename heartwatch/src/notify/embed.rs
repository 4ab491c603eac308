//! Find-or-append of the status field.

use serde_json::Value;

use crate::models::{Embed, EmbedField};

pub const STATUS_FIELD_NAME: &str = "Status";
pub const DISCONNECTED_VALUE: &str = "🔴 **Disconnected**";

/// Return a copy of `embed` showing the disconnected status.
///
/// The first field whose name is a string containing "status" (any case) gets the
/// disconnected value and is made inline. Without one, a `Status` field is
/// appended. No other field is touched or reordered.
pub fn mark_disconnected(embed: &Embed) -> Embed {
    let mut patched = embed.clone();

    match patched
        .fields
        .iter_mut()
        .find(|field| {
            field
                .name_str()
                .is_some_and(|name| name.to_lowercase().contains("status"))
        }) {
        Some(field) => {
            field.value = Value::from(DISCONNECTED_VALUE);
            field.inline = true;
        }
        None => patched
            .fields
            .push(EmbedField::new(STATUS_FIELD_NAME, DISCONNECTED_VALUE, true)),
    }

    patched
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn embed(fields: Vec<EmbedField>) -> Embed {
        Embed {
            title: Some("Server".into()),
            fields,
            ..Embed::default()
        }
    }

    #[test]
    fn test_overwrites_existing_status_field() {
        let original = embed(vec![
            EmbedField::new("Player", "alice", false),
            EmbedField::new("Status", "🟢 Connected", false),
            EmbedField::new("Place", "1234", true),
        ]);

        let patched = mark_disconnected(&original);

        assert_eq!(patched.fields.len(), 3);
        assert_eq!(patched.fields[0], original.fields[0]);
        assert_eq!(patched.fields[1].name, "Status");
        assert_eq!(patched.fields[1].value, DISCONNECTED_VALUE);
        assert!(patched.fields[1].inline);
        assert_eq!(patched.fields[2], original.fields[2]);
        assert_eq!(patched.title, original.title);
    }

    #[test]
    fn test_matches_name_case_insensitively_as_substring() {
        let original = embed(vec![EmbedField::new("🔌 Connection STATUS", "up", false)]);
        let patched = mark_disconnected(&original);
        assert_eq!(patched.fields.len(), 1);
        assert_eq!(patched.fields[0].name, "🔌 Connection STATUS");
        assert_eq!(patched.fields[0].value, DISCONNECTED_VALUE);
    }

    #[test]
    fn test_only_first_status_field_changes() {
        let original = embed(vec![
            EmbedField::new("Status", "a", true),
            EmbedField::new("Status history", "b", false),
        ]);
        let patched = mark_disconnected(&original);
        assert_eq!(patched.fields[0].value, DISCONNECTED_VALUE);
        assert_eq!(patched.fields[1], original.fields[1]);
    }

    #[test]
    fn test_appends_when_missing() {
        let original = embed(vec![
            EmbedField::new("Player", "alice", true),
            EmbedField::new("Job", "abc", true),
        ]);

        let patched = mark_disconnected(&original);

        assert_eq!(patched.fields.len(), 3);
        assert_eq!(&patched.fields[..2], &original.fields[..]);
        assert_eq!(
            patched.fields[2],
            EmbedField::new(STATUS_FIELD_NAME, DISCONNECTED_VALUE, true)
        );
    }

    #[test]
    fn test_skips_non_string_names() {
        let mut original = embed(vec![EmbedField::new("Players", "", true)]);
        original.fields[0].value = json!(5);
        original.fields.push(EmbedField {
            name: Value::Null,
            value: json!("status-like but unnamed"),
            ..EmbedField::default()
        });
        original.fields.push(EmbedField {
            name: json!(7),
            value: json!(8),
            ..EmbedField::default()
        });

        let patched = mark_disconnected(&original);

        assert_eq!(patched.fields.len(), 4);
        assert_eq!(&patched.fields[..3], &original.fields[..]);
        assert_eq!(patched.fields[3].name, STATUS_FIELD_NAME);
    }

    #[test]
    fn test_numeric_status_value_is_replaced() {
        let mut original = embed(vec![EmbedField::new("Status", "", false)]);
        original.fields[0].value = json!(1);

        let patched = mark_disconnected(&original);
        assert_eq!(patched.fields[0].value, DISCONNECTED_VALUE);
        assert!(patched.fields[0].inline);
    }

    #[test]
    fn test_appends_to_empty_embed() {
        let patched = mark_disconnected(&Embed::default());
        assert_eq!(patched.fields.len(), 1);
        assert_eq!(patched.fields[0].name, STATUS_FIELD_NAME);
    }

    #[test]
    fn test_repeated_patch_is_stable() {
        let once = mark_disconnected(&embed(vec![EmbedField::new("Player", "alice", true)]));
        let twice = mark_disconnected(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_original_is_untouched() {
        let original = embed(vec![EmbedField::new("Status", "🟢 Connected", false)]);
        let snapshot = original.clone();
        let _ = mark_disconnected(&original);
        assert_eq!(original, snapshot);
    }
}
