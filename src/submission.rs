use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capture::Clip;
use crate::error::{HarnessError, HarnessResult};
use crate::reconciler::Harness;
use crate::traits::{BlobStore, FrameScheduler, Mount, Navigator, Notifier, RecordStore};
use crate::types::{SubmissionRecord, SUBMISSIONS_TABLE};

pub const DEFAULT_BLOB_PREFIX: &str = "public";
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionSettings {
    pub table: String,
    pub blob_prefix: String,
    pub redirect_delay_ms: u64,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            table: SUBMISSIONS_TABLE.to_string(),
            blob_prefix: DEFAULT_BLOB_PREFIX.to_string(),
            redirect_delay_ms: DEFAULT_REDIRECT_DELAY_MS,
        }
    }
}

impl SubmissionSettings {
    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }
}

/// Submission flow states
///
/// A failure while recording, uploading or persisting alerts the user and
/// lands in `Idle`; the flow is never resumed from the failing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Confirming,
    CollectingIdentity,
    Recording,
    Uploading,
    Persisting,
    Success,
}

/// Blob path of a clip: `{prefix}/{date}/{id}.{extension}`
pub fn blob_path(prefix: &str, date: NaiveDate, id: Uuid, extension: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let file = format!("{}/{}.{}", date.format("%Y-%m-%d"), id, extension);
    if prefix.is_empty() {
        file
    } else {
        format!("{prefix}/{file}")
    }
}

#[derive(Clone)]
struct Shared {
    state: Rc<Cell<SubmissionState>>,
    author: Rc<RefCell<Option<String>>>,
    last_error: Rc<RefCell<Option<String>>>,
    notifier: Rc<dyn Notifier>,
}

impl Shared {
    fn set(&self, next: SubmissionState) {
        let previous = self.state.replace(next);
        if previous != next {
            log::debug!("submission {:?} -> {:?}", previous, next);
        }
    }

    /// Alert, discard what was collected and return to `Idle`
    fn fail(&self, error: HarnessError) -> HarnessError {
        log::warn!("submission failed in {:?}: {}", self.state.get(), error);
        self.notifier.alert(&error.to_string());
        *self.last_error.borrow_mut() = Some(error.to_string());
        self.author.borrow_mut().take();
        self.set(SubmissionState::Idle);
        error
    }
}

/// Submission Pipeline - confirm, identify, record, upload, persist
pub struct SubmissionPipeline {
    shared: Shared,
    blobs: Rc<dyn BlobStore>,
    records: Rc<dyn RecordStore>,
    navigator: Rc<dyn Navigator>,
    settings: SubmissionSettings,
}

impl SubmissionPipeline {
    pub fn new(
        blobs: Rc<dyn BlobStore>,
        records: Rc<dyn RecordStore>,
        notifier: Rc<dyn Notifier>,
        navigator: Rc<dyn Navigator>,
        settings: SubmissionSettings,
    ) -> Self {
        Self {
            shared: Shared {
                state: Rc::new(Cell::new(SubmissionState::Idle)),
                author: Rc::new(RefCell::new(None)),
                last_error: Rc::new(RefCell::new(None)),
                notifier,
            },
            blobs,
            records,
            navigator,
            settings,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.shared.state.get()
    }

    pub fn author(&self) -> Option<String> {
        self.shared.author.borrow().clone()
    }

    /// Message of the most recent failure, if any
    pub fn last_error(&self) -> Option<String> {
        self.shared.last_error.borrow().clone()
    }

    fn expect_state(&self, expected: &[SubmissionState], action: &str) -> HarnessResult<()> {
        let state = self.state();
        if expected.contains(&state) {
            Ok(())
        } else {
            Err(HarnessError::transition(format!("cannot {action} while {state:?}")))
        }
    }

    /// Ask the user to confirm their submission
    pub fn open(&self) -> HarnessResult<()> {
        self.expect_state(&[SubmissionState::Idle, SubmissionState::Success], "open submission")?;
        self.shared.last_error.borrow_mut().take();
        self.shared.set(SubmissionState::Confirming);
        Ok(())
    }

    pub fn confirm(&self) -> HarnessResult<()> {
        self.expect_state(&[SubmissionState::Confirming], "confirm")?;
        self.shared.set(SubmissionState::CollectingIdentity);
        Ok(())
    }

    /// Back out before recording starts
    pub fn cancel(&self) -> HarnessResult<()> {
        self.expect_state(
            &[SubmissionState::Confirming, SubmissionState::CollectingIdentity],
            "cancel",
        )?;
        self.shared.set(SubmissionState::Idle);
        Ok(())
    }

    /// Take the author's name and start recording the live surface
    ///
    /// An empty name shows a validation message and changes nothing.
    pub fn provide_identity<M: Mount, S: FrameScheduler>(
        &self,
        author: &str,
        harness: &mut Harness<M, S>,
        now: Instant,
    ) -> HarnessResult<()> {
        self.expect_state(&[SubmissionState::CollectingIdentity], "start recording")?;

        let author = author.trim();
        if author.is_empty() {
            let message = "Please enter your name to submit.";
            self.shared.notifier.validation(message);
            return Err(HarnessError::validation(message));
        }

        if let Err(e) = harness.start_capture(now) {
            return Err(self.shared.fail(e));
        }

        *self.shared.author.borrow_mut() = Some(author.to_string());
        self.shared.set(SubmissionState::Recording);
        log::info!("recording submission for '{}'", author);
        Ok(())
    }

    /// Continue once the capture session finished
    ///
    /// Uploads the clip, resolves its public reference and writes the record.
    /// The returned future owns everything it needs, so it can be spawned on a
    /// local executor while frames keep rendering.
    pub fn on_capture_finished(
        &self,
        outcome: HarnessResult<Clip>,
        source_text: String,
    ) -> LocalBoxFuture<'static, HarnessResult<SubmissionRecord>> {
        if let Err(e) = self.expect_state(&[SubmissionState::Recording], "upload") {
            return future::ready(Err(e)).boxed_local();
        }

        let clip = match outcome {
            Ok(clip) => clip,
            Err(e) => return future::ready(Err(self.shared.fail(e))).boxed_local(),
        };
        let Some(author) = self.author() else {
            let e = HarnessError::transition("recording without an author");
            return future::ready(Err(self.shared.fail(e))).boxed_local();
        };

        let path = blob_path(
            &self.settings.blob_prefix,
            chrono::Utc::now().date_naive(),
            Uuid::new_v4(),
            clip.extension,
        );

        self.shared.set(SubmissionState::Uploading);
        upload_and_persist(
            self.shared.clone(),
            Rc::clone(&self.blobs),
            Rc::clone(&self.records),
            Rc::clone(&self.navigator),
            self.settings.clone(),
            path,
            clip,
            SubmissionRecord {
                user: author,
                code: source_text,
                video_url: String::new(),
            },
        )
        .boxed_local()
    }
}

#[allow(clippy::too_many_arguments)]
fn upload_and_persist(
    shared: Shared,
    blobs: Rc<dyn BlobStore>,
    records: Rc<dyn RecordStore>,
    navigator: Rc<dyn Navigator>,
    settings: SubmissionSettings,
    path: String,
    clip: Clip,
    mut record: SubmissionRecord,
) -> impl Future<Output = HarnessResult<SubmissionRecord>> + 'static {
    async move {
        log::info!("uploading {} bytes to {}", clip.len(), path);
        if let Err(e) = blobs.upload(&path, &clip.bytes, clip.content_type).await {
            return Err(shared.fail(HarnessError::Upload(e)));
        }
        drop(clip);

        record.video_url = blobs.public_reference(&path);
        shared.set(SubmissionState::Persisting);

        if let Err(e) = records.insert(&settings.table, &record).await {
            return Err(shared.fail(HarnessError::Persist(e)));
        }

        shared.set(SubmissionState::Success);
        log::info!("submission by '{}' saved", record.user);
        navigator.navigate_to_gallery(settings.redirect_delay());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_path_layout() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let id = Uuid::nil();
        assert_eq!(
            blob_path("public/", date, id, "mjpeg"),
            "public/2024-03-09/00000000-0000-0000-0000-000000000000.mjpeg"
        );
        assert_eq!(
            blob_path("", date, id, "bin"),
            "2024-03-09/00000000-0000-0000-0000-000000000000.bin"
        );
    }

    #[test]
    fn test_settings_defaults() {
        let settings: SubmissionSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.table, "submissions");
        assert_eq!(settings.redirect_delay(), Duration::from_secs(2));
    }
}
