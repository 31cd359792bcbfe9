// FollowDiff - app/session.rs
//
// The collaborator-facing surface: one analysis session owning the
// reconciler. Presentation code talks to this and nothing else; the
// canonical username sets are never exposed directly.
//
// Imports are pure until committed. A failed import returns its error and
// leaves the prior set for that side untouched; a successful one replaces
// the side wholesale and recomputes once both sides are present.

use crate::core::export::{self, ExportFormat, ExportOptions};
use crate::core::importer::{self, ImportConfig};
use crate::core::model::{
    ImportNotice, ImportOutcome, ImportReport, Side, SortDirection, Statistics, Username,
};
use crate::core::reconcile::Reconciler;
use crate::util::error::{ExportError, ReconcileError, Result};

/// One in-memory analysis session.
#[derive(Debug, Default)]
pub struct Session {
    reconciler: Reconciler,
    import_config: ImportConfig,
}

impl Session {
    pub fn new(import_config: ImportConfig) -> Self {
        Self {
            reconciler: Reconciler::new(),
            import_config,
        }
    }

    pub fn import_config(&self) -> &ImportConfig {
        &self.import_config
    }

    /// Import the text of a followers file.
    pub fn import_followers(&mut self, file_name: &str, text: &str) -> Result<ImportReport> {
        self.import(Side::Followers, file_name, text)
    }

    /// Import the text of a following file.
    pub fn import_following(&mut self, file_name: &str, text: &str) -> Result<ImportReport> {
        self.import(Side::Following, file_name, text)
    }

    /// Import `text` for `side`, committing only on success.
    pub fn import(&mut self, side: Side, file_name: &str, text: &str) -> Result<ImportReport> {
        let outcome =
            importer::import_text(file_name, text, &self.import_config).inspect_err(|e| {
                tracing::warn!(side = %side, error = %e, "Import failed, keeping previous data");
            })?;
        Ok(self.commit(side, outcome))
    }

    /// Commit an outcome produced elsewhere (e.g. by the background import
    /// manager). Replaces the side and recomputes if both sides are loaded.
    pub fn commit(&mut self, side: Side, outcome: ImportOutcome) -> ImportReport {
        let notice = outcome.is_empty().then(|| ImportNotice::Empty {
            file: outcome.file.clone(),
        });
        if let Some(ref n) = notice {
            tracing::info!(side = %side, notice = %n, "Import produced no accounts");
        }

        let report = ImportReport {
            side,
            file: outcome.file,
            usernames: outcome.usernames.len(),
            records: outcome.records,
            skipped_records: outcome.skipped_records,
            notice,
        };

        self.reconciler.set_side(side, outcome.usernames);
        if self.reconciler.is_ready() {
            if let Err(e) = self.reconciler.recompute() {
                tracing::error!(error = %e, "Recompute failed with both sides loaded");
            }
        }

        tracing::info!(
            side = %side,
            file = %report.file,
            usernames = report.usernames,
            skipped = report.skipped_records,
            "Import committed"
        );
        report
    }

    pub fn is_loaded(&self, side: Side) -> bool {
        self.reconciler.is_loaded(side)
    }

    /// True once both sides are loaded and the list is available.
    pub fn is_ready(&self) -> bool {
        self.reconciler.is_ready()
    }

    /// `Ok` once both sides are loaded, otherwise the first missing side.
    pub fn require_ready(&self) -> std::result::Result<(), ReconcileError> {
        match Side::all().iter().find(|side| !self.is_loaded(**side)) {
            Some(side) => Err(ReconcileError::SideNotLoaded { side: side.label() }),
            None => Ok(()),
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.reconciler.statistics()
    }

    /// Current non-followers in the requested order, narrowed by `search`.
    ///
    /// Changing the order re-sorts the canonical list in place; searching
    /// never alters it. Empty until both sides are loaded.
    pub fn non_followers(&mut self, sort_ascending: bool, search: &str) -> Vec<Username> {
        self.reconciler
            .set_sort_direction(SortDirection::from_ascending(sort_ascending));
        self.reconciler.filter(search).into_iter().cloned().collect()
    }

    /// Export the whole non-follower list in its current order.
    pub fn export_as(
        &self,
        format: ExportFormat,
        options: ExportOptions,
    ) -> std::result::Result<String, ExportError> {
        let list = self.reconciler.non_followers().unwrap_or_default();
        export::export(list, format, options)
    }

    /// Export only the entries matching `search`, in current order.
    pub fn export_matching(
        &self,
        search: &str,
        format: ExportFormat,
        options: ExportOptions,
    ) -> std::result::Result<String, ExportError> {
        export::export(self.reconciler.filter(search), format, options)
    }

    /// Forget both sides.
    pub fn reset(&mut self) {
        self.reconciler.reset();
        tracing::debug!("Session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::error::{FollowDiffError, ImportError};

    fn records(names: &[&str]) -> String {
        let items: Vec<String> = names
            .iter()
            .map(|n| format!(r#"{{"string_list_data":[{{"value":"{n}"}}]}}"#))
            .collect();
        format!("[{}]", items.join(","))
    }

    fn strs(list: &[Username]) -> Vec<&str> {
        list.iter().map(|u| u.as_str()).collect()
    }

    #[test]
    fn test_end_to_end_difference() {
        let mut session = Session::default();
        session
            .import_followers("followers.json", &records(&["x", "y"]))
            .unwrap();
        session
            .import_following("following.json", &records(&["x", "y", "z"]))
            .unwrap();

        assert_eq!(strs(&session.non_followers(true, "")), vec!["z"]);
        assert_eq!(
            session.statistics(),
            Statistics {
                follower_count: 2,
                following_count: 3,
                non_follower_count: 1,
            }
        );
    }

    #[test]
    fn test_list_empty_until_both_sides_loaded() {
        let mut session = Session::default();
        session
            .import_following("following.json", &records(&["a"]))
            .unwrap();
        assert!(!session.is_ready());
        assert!(session.non_followers(true, "").is_empty());
        assert_eq!(session.export_as(ExportFormat::Text, ExportOptions::default()).unwrap(), "");
        assert_eq!(
            session.require_ready(),
            Err(ReconcileError::SideNotLoaded { side: "followers" })
        );

        session
            .import_followers("followers.json", &records(&["b"]))
            .unwrap();
        assert_eq!(session.require_ready(), Ok(()));
    }

    #[test]
    fn test_invalid_json_keeps_previous_set() {
        let mut session = Session::default();
        session
            .import_followers("followers.json", &records(&["amy"]))
            .unwrap();
        session
            .import_following("following.json", &records(&["amy", "bob"]))
            .unwrap();

        let err = session.import_followers("broken.json", "{not json").unwrap_err();
        assert!(
            matches!(err, FollowDiffError::Import(ImportError::Parse { ref file, .. }) if file == "broken.json"),
            "got {err:?}"
        );
        assert_eq!(session.statistics().follower_count, 1);
        assert_eq!(strs(&session.non_followers(true, "")), vec!["bob"]);
    }

    #[test]
    fn test_unrecognized_format_keeps_previous_set() {
        let mut session = Session::default();
        session
            .import_following("following.json", &records(&["amy"]))
            .unwrap();
        let err = session
            .import_following("other.json", r#"{"meta": 1}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            FollowDiffError::Import(ImportError::UnrecognizedFormat { .. })
        ));
        assert_eq!(session.statistics().following_count, 1);
    }

    #[test]
    fn test_empty_file_is_a_notice_not_an_error() {
        let mut session = Session::default();
        let report = session.import_followers("followers.json", "[]").unwrap();
        assert_eq!(
            report.notice,
            Some(ImportNotice::Empty {
                file: "followers.json".to_string()
            })
        );
        assert!(session.is_loaded(Side::Followers));

        session
            .import_following("following.json", &records(&["b", "a"]))
            .unwrap();
        assert_eq!(strs(&session.non_followers(true, "")), vec!["a", "b"]);
    }

    #[test]
    fn test_reimport_replaces_side() {
        let mut session = Session::default();
        session
            .import_followers("f1.json", &records(&["old"]))
            .unwrap();
        session
            .import_following("g.json", &records(&["old", "new"]))
            .unwrap();
        assert_eq!(strs(&session.non_followers(true, "")), vec!["new"]);

        session
            .import_followers("f2.json", &records(&["new"]))
            .unwrap();
        assert_eq!(strs(&session.non_followers(true, "")), vec!["old"]);
    }

    #[test]
    fn test_sort_and_search() {
        let mut session = Session::default();
        session.import_followers("f.json", "[]").unwrap();
        session
            .import_following("g.json", &records(&["bob", "Amy", "bobby", "carl"]))
            .unwrap();

        assert_eq!(
            strs(&session.non_followers(false, "")),
            vec!["carl", "bobby", "bob", "amy"]
        );
        assert_eq!(strs(&session.non_followers(false, "BO")), vec!["bobby", "bob"]);
        assert_eq!(strs(&session.non_followers(true, "bo")), vec!["bob", "bobby"]);
        // Searching did not shrink the canonical list.
        assert_eq!(session.statistics().non_follower_count, 4);
    }

    #[test]
    fn test_export_follows_current_order() {
        let mut session = Session::default();
        session.import_followers("f.json", "[]").unwrap();
        session
            .import_following("g.json", &records(&["bob", "amy"]))
            .unwrap();
        session.non_followers(true, "");

        let options = ExportOptions::default();
        assert_eq!(session.export_as(ExportFormat::Text, options).unwrap(), "@amy\n@bob");
        assert_eq!(
            session.export_as(ExportFormat::Csv, options).unwrap(),
            "Username\n@amy\n@bob"
        );
        let json: Vec<String> =
            serde_json::from_str(&session.export_as(ExportFormat::Json, options).unwrap())
                .unwrap();
        assert_eq!(json, vec!["@amy", "@bob"]);

        assert_eq!(
            session
                .export_matching("am", ExportFormat::Text, options)
                .unwrap(),
            "@amy"
        );
    }
}
