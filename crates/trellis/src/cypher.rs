//! Helpers for composing statement text fragments.

use trellis_core::Label;

/// Quote a label for inclusion in statement text.
pub(crate) fn quote(label: &Label) -> String {
    format!("`{}`", label.as_str())
}

/// Join labels into a `` `A`:`B` `` fragment (no leading colon).
pub(crate) fn label_fragment<'a>(labels: impl IntoIterator<Item = &'a Label>) -> String {
    labels.into_iter().map(|label| quote(label)).collect::<Vec<_>>().join(":")
}

/// Join labels into a `` :`A`:`B` `` fragment, or an empty string when there
/// are no labels.
pub(crate) fn label_prefix<'a>(labels: impl IntoIterator<Item = &'a Label>) -> String {
    let fragment = label_fragment(labels);
    if fragment.is_empty() {
        fragment
    } else {
        format!(":{fragment}")
    }
}
