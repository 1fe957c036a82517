//! Built-in batch translated when the CLI runs

use crate::core::models::{Batch, Entry};

/// The UI strings the CLI submits
pub fn sample_batch() -> Batch {
    Batch::new(vec![
        Entry::new("title", "Confirm").with_context("Title of the confirm action dialog"),
        Entry::new("cancel", "Cancel").with_context("Label on the cancel button in a modal dialog"),
        Entry::new("welcome_msg", "Welcome to our site!")
            .with_context("Greeting shown on the home page"),
        Entry::new("error_404", "Page not found.")
            .with_context("Message shown when a page is not found"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_batch_is_submittable() {
        let batch = sample_batch();
        assert_eq!(batch.len(), 4);
        assert!(batch.validate_for_submission().is_ok());
        assert_eq!(batch.untranslated_ids().len(), 4);
    }
}
