use std::rc::Rc;

use crate::error::{HarnessError, HarnessResult};
use crate::traits::{KeyValueStore, Notifier, RecordStore};
use crate::types::SubmissionRow;

pub const DEFAULT_VOTE_FLAG_KEY: &str = "aster-competition-voted";

/// Gallery listing plus the one-vote-per-client gate
///
/// The gate is a local flag only; the record store does not enforce it.
pub struct Gallery {
    records: Rc<dyn RecordStore>,
    flags: Rc<dyn KeyValueStore>,
    notifier: Rc<dyn Notifier>,
    table: String,
    flag_key: String,
    rows: Vec<SubmissionRow>,
}

impl Gallery {
    pub fn new(
        records: Rc<dyn RecordStore>,
        flags: Rc<dyn KeyValueStore>,
        notifier: Rc<dyn Notifier>,
        table: impl Into<String>,
        flag_key: impl Into<String>,
    ) -> Self {
        Self {
            records,
            flags,
            notifier,
            table: table.into(),
            flag_key: flag_key.into(),
            rows: Vec::new(),
        }
    }

    /// Rows from the last successful refresh, in store order
    pub fn rows(&self) -> &[SubmissionRow] {
        &self.rows
    }

    /// Rows ordered by votes, most first
    pub fn ranked(&self) -> Vec<&SubmissionRow> {
        let mut ranked: Vec<_> = self.rows.iter().collect();
        ranked.sort_by(|a, b| b.vote.cmp(&a.vote).then_with(|| a.user.cmp(&b.user)));
        ranked
    }

    pub fn has_voted(&self) -> bool {
        self.flags
            .get(&self.flag_key)
            .is_some_and(|value| !value.is_empty())
    }

    /// Reload `user, video_url, vote`; a failure keeps the previous rows
    pub async fn refresh(&mut self) -> HarnessResult<&[SubmissionRow]> {
        let rows = self
            .records
            .select(&self.table)
            .await
            .map_err(HarnessError::Fetch)?;
        log::debug!("gallery loaded {} submissions", rows.len());
        self.rows = rows;
        Ok(&self.rows)
    }

    /// Cast this client's vote for `user_id`
    ///
    /// Rejected locally, before any store call, when the flag is already set.
    pub async fn vote(&mut self, user_id: &str) -> HarnessResult<()> {
        if self.has_voted() {
            self.notifier.alert("You have already cast your vote!");
            return Err(HarnessError::AlreadyVoted);
        }

        if let Err(e) = self.records.increment_votes(&self.table, user_id).await {
            log::error!("vote for '{}' failed: {}", user_id, e);
            self.notifier.alert("An error occurred while casting your vote.");
            return Err(HarnessError::Vote(e));
        }

        if let Err(e) = self.flags.set(&self.flag_key, "true") {
            log::warn!("vote recorded but flag could not be saved: {}", e);
        }
        for row in self.rows.iter_mut().filter(|r| r.user == user_id) {
            row.vote += 1;
        }
        log::info!("vote cast for '{}'", user_id);
        Ok(())
    }
}
