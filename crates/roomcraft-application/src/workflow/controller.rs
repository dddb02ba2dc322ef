use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use roomcraft_core::catalog::find_item;
use roomcraft_core::image::FormatSniffingNormalizer;
use roomcraft_core::transform::NoProgress;
use roomcraft_core::{
    Credential, DesignStore, EncodedImage, ImageNormalizer, ImageTransformer, KeyValueStore, ProgressPhase,
    ProgressSink, Result, RoomcraftError, SelectedItem, Selection, Session, Stage,
};

/// Outcome of a transformation started by the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The image was stored in the session.
    Applied(EncodedImage),
    /// The session was reset while the call was outstanding; the response
    /// was dropped without touching the session.
    Discarded,
}

impl Completion {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn into_image(self) -> Option<EncodedImage> {
        match self {
            Self::Applied(image) => Some(image),
            Self::Discarded => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Clean,
    Furnish,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Furnish => "furnish",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    operation: Operation,
    generation: u64,
}

#[derive(Debug)]
struct WorkflowState {
    session: Session,
    /// Bumped on every reset so late responses can be recognized.
    generation: u64,
    in_flight: Option<InFlight>,
}

impl WorkflowState {
    fn new() -> Self {
        Self {
            session: Session::new(),
            generation: 0,
            in_flight: None,
        }
    }

    /// Starts a new generation. An outstanding call keeps the busy-guard until
    /// it resolves; its result is then discarded.
    fn advance_generation(&mut self) {
        self.generation += 1;
    }

    /// Applies the stage guard and returns the resulting stage.
    fn guard(&mut self) -> Stage {
        if let Some(from) = self.session.enforce_invariants() {
            tracing::info!(from = %from, to = %self.session.stage, "Demoted session to nearest valid stage");
        }
        self.session.stage
    }

    fn require_stage(&mut self, expected: Stage, action: &'static str) -> Result<()> {
        let stage = self.guard();
        if stage == expected {
            Ok(())
        } else {
            Err(RoomcraftError::invalid_transition(
                stage,
                action,
                format!("only allowed in {expected} stage"),
            ))
        }
    }

    /// Rejects a new transformation call while any call is outstanding,
    /// including one started before the last reset.
    fn require_idle(&self, action: &'static str) -> Result<()> {
        match self.in_flight {
            Some(flight) => Err(self.busy(flight, action)),
            None => Ok(()),
        }
    }

    /// Rejects session edits that a call of the current generation would race.
    fn require_settled(&self, action: &'static str) -> Result<()> {
        match self.in_flight {
            Some(flight) if flight.generation == self.generation => Err(self.busy(flight, action)),
            _ => Ok(()),
        }
    }

    fn busy(&self, flight: InFlight, action: &'static str) -> RoomcraftError {
        RoomcraftError::invalid_transition(
            self.session.stage,
            action,
            format!("a {} call is still in flight", flight.operation.as_str()),
        )
    }

    fn begin(&mut self, operation: Operation) -> u64 {
        self.in_flight = Some(InFlight {
            operation,
            generation: self.generation,
        });
        self.generation
    }

    /// Releases the busy-guard for `generation`.
    ///
    /// Returns `false` when the session was reset since the call started.
    fn finish(&mut self, generation: u64) -> bool {
        self.in_flight = None;
        self.generation == generation
    }
}

/// Forwards progress to the configured sink and traces each phase.
struct TracedProgress<'a> {
    operation: Operation,
    inner: &'a dyn ProgressSink,
}

impl ProgressSink for TracedProgress<'_> {
    fn report(&self, phase: ProgressPhase) {
        tracing::debug!(operation = self.operation.as_str(), phase = %phase, "Transformation progress");
        self.inner.report(phase);
    }
}

/// Drives one design session through Upload, Select and Result.
///
/// All operations take `&self`; session state sits behind a mutex that is
/// never held across an await. At most one transformation call runs at a
/// time, even across resets, and a response that arrives after a reset is
/// discarded.
pub struct DesignWorkflow<T, S> {
    transformer: T,
    store: DesignStore<S>,
    normalizer: Arc<dyn ImageNormalizer>,
    progress: Arc<dyn ProgressSink>,
    state: Mutex<WorkflowState>,
}

impl<T: ImageTransformer, S: KeyValueStore> DesignWorkflow<T, S> {
    pub fn new(transformer: T, store: S) -> Self {
        Self {
            transformer,
            store: DesignStore::new(store),
            normalizer: Arc::new(FormatSniffingNormalizer),
            progress: Arc::new(NoProgress),
            state: Mutex::new(WorkflowState::new()),
        }
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn ImageNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Sets the sink that receives progress phases of transformation calls.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    fn state(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ============================================================================
    // Session
    // ============================================================================

    /// Resets to a fresh session at the upload stage.
    pub fn start_session(&self) {
        let mut state = self.state();
        state.advance_generation();
        state.session = Session::new();
        tracing::info!(generation = state.generation, "Started design session");
    }

    /// Replaces the session wholesale, e.g. when restoring saved state.
    ///
    /// The stage guard runs immediately, so the returned stage may be earlier
    /// than `session.stage`.
    pub fn restore_session(&self, session: Session) -> Stage {
        let mut state = self.state();
        state.advance_generation();
        state.session = session;
        state.guard()
    }

    pub fn stage(&self) -> Stage {
        self.state().guard()
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        let mut state = self.state();
        state.guard();
        state.session.clone()
    }

    /// Whether a transformation call is outstanding.
    pub fn is_busy(&self) -> bool {
        self.state().in_flight.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    // ============================================================================
    // Upload stage
    // ============================================================================

    /// Normalizes a raw photo and stores it as the original image.
    ///
    /// Any previous cleaned image is dropped. Fails with `InvalidTransition`
    /// when the session is reset while the photo is being normalized.
    pub async fn upload_image(&self, raw: Vec<u8>) -> Result<EncodedImage> {
        let generation = {
            let mut state = self.state();
            state.require_stage(Stage::Upload, "upload an image")?;
            state.require_settled("upload an image")?;
            state.generation
        };

        let normalizer = Arc::clone(&self.normalizer);
        let image = tokio::task::spawn_blocking(move || normalizer.normalize(&raw))
            .await
            .map_err(|e| RoomcraftError::internal(format!("Image normalization task failed: {e}")))??;

        let mut state = self.state();
        if state.generation != generation {
            tracing::info!(generation, "Discarding photo normalized for a reset session");
            return Err(RoomcraftError::invalid_transition(
                state.session.stage,
                "upload an image",
                "the session was reset while the photo was being processed",
            ));
        }
        state.require_stage(Stage::Upload, "upload an image")?;
        state.require_settled("upload an image")?;
        state.session.original_image = Some(image.clone());
        state.session.cleaned_image = None;
        tracing::info!(mime_type = image.mime_type(), bytes = image.len(), "Uploaded room photo");
        Ok(image)
    }

    /// Removes furniture and clutter from the uploaded photo.
    ///
    /// Cleaning again works on the previous result: the cleaned image becomes
    /// the new original before the call is made.
    pub async fn clean(&self) -> Result<Completion> {
        let credential = self.require_credential()?;
        let (source, generation) = {
            let mut state = self.state();
            state.require_stage(Stage::Upload, "clean")?;
            state.require_idle("clean")?;
            if let Some(cleaned) = state.session.cleaned_image.take() {
                state.session.original_image = Some(cleaned);
            }
            let source = state.session.original_image.clone().ok_or_else(|| {
                RoomcraftError::invalid_transition(Stage::Upload, "clean", "no photo uploaded")
            })?;
            (source, state.begin(Operation::Clean))
        };

        tracing::info!(generation, image_bytes = source.len(), "Cleaning room photo");
        let progress = TracedProgress {
            operation: Operation::Clean,
            inner: self.progress.as_ref(),
        };
        let outcome = self.transformer.clean_room(&credential, &source, &progress).await;

        let mut state = self.state();
        if !state.finish(generation) {
            tracing::info!(generation, "Discarding clean result for a reset session");
            return Ok(Completion::Discarded);
        }
        match outcome {
            Ok(image) => {
                state.session.cleaned_image = Some(image.clone());
                tracing::info!(bytes = image.len(), "Room photo cleaned");
                Ok(Completion::Applied(image))
            }
            Err(failure) => {
                tracing::warn!(status = ?failure.status_code, "Room cleaning failed: {}", failure);
                state.guard();
                Err(failure.into())
            }
        }
    }

    /// Drops both upload images.
    pub fn clear_upload(&self) -> Result<()> {
        let mut state = self.state();
        state.require_stage(Stage::Upload, "clear the upload")?;
        state.require_settled("clear the upload")?;
        state.advance_generation();
        state.session.original_image = None;
        state.session.cleaned_image = None;
        tracing::info!("Cleared uploaded photo");
        Ok(())
    }

    /// Stores both images and advances Upload -> Select.
    pub fn complete_upload(&self, original: EncodedImage, cleaned: EncodedImage) -> Result<()> {
        let mut state = self.state();
        state.require_settled("complete the upload")?;
        state.require_stage(Stage::Upload, "complete the upload")?;
        state.session.original_image = Some(original);
        state.session.cleaned_image = Some(cleaned);
        state.session.stage = Stage::Select;
        state.guard();
        tracing::info!("Advanced to select stage");
        Ok(())
    }

    /// Advances to Select with the session's own uploaded and cleaned images.
    pub fn proceed_to_select(&self) -> Result<()> {
        let (original, cleaned) = {
            let state = self.state();
            (state.session.original_image.clone(), state.session.cleaned_image.clone())
        };
        match (original, cleaned) {
            (Some(original), Some(cleaned)) => self.complete_upload(original, cleaned),
            _ => Err(RoomcraftError::invalid_transition(
                self.stage(),
                "proceed to selection",
                "the photo has not been cleaned yet",
            )),
        }
    }

    // ============================================================================
    // Select stage
    // ============================================================================

    /// Adds or removes a catalog item. Returns `true` if it is now selected.
    pub fn toggle_item(&self, id: &str) -> Result<bool> {
        let item = find_item(id).ok_or_else(|| RoomcraftError::UnknownItem(id.to_string()))?;
        let mut state = self.state();
        state.require_stage(Stage::Select, "change the selection")?;
        let selected = state.session.selected_items.toggle(item.id, item.name);
        tracing::debug!(item = item.id, selected, "Toggled item");
        Ok(selected)
    }

    /// Edits the placement instruction of a selected item.
    pub fn set_prompt(&self, id: &str, prompt: impl Into<String>) -> Result<()> {
        let mut state = self.state();
        state.require_stage(Stage::Select, "edit a placement instruction")?;
        if state.session.selected_items.set_prompt(id, prompt) {
            Ok(())
        } else {
            Err(RoomcraftError::UnknownItem(id.to_string()))
        }
    }

    pub fn selection(&self) -> Selection {
        self.state().session.selected_items.clone()
    }

    /// Stores the submittable subset of `items` and advances Select -> Result.
    pub fn complete_selection(&self, items: Vec<SelectedItem>) -> Result<()> {
        let mut state = self.state();
        state.require_stage(Stage::Select, "complete the selection")?;
        let submittable = Selection::from_items(items.into_iter().filter(SelectedItem::is_submittable));
        if submittable.is_empty() {
            return Err(RoomcraftError::EmptySelection);
        }
        tracing::info!(items = submittable.len(), "Advanced to result stage");
        state.session.selected_items = submittable;
        state.session.stage = Stage::Result;
        state.guard();
        Ok(())
    }

    /// Completes the selection with the items chosen in this session.
    pub fn submit_selection(&self) -> Result<()> {
        let items = self.selection().into_items();
        self.complete_selection(items)
    }

    /// Returns to Upload, keeping only the original photo.
    pub fn back_to_upload(&self) -> Result<()> {
        let mut state = self.state();
        state.require_stage(Stage::Select, "go back to upload")?;
        state.advance_generation();
        state.session.cleaned_image = None;
        state.session.selected_items.clear();
        state.session.stage = Stage::Upload;
        state.guard();
        tracing::info!("Returned to upload stage");
        Ok(())
    }

    /// Overwrites the saved design. Returns whether it was persisted.
    pub fn save_design(&self, items: &[SelectedItem]) -> bool {
        self.store.save_selection(items)
    }

    /// Saves the submittable part of the current selection.
    pub fn save_current_selection(&self) -> Result<bool> {
        let items = self.state().session.selected_items.submittable();
        if items.is_empty() {
            return Err(RoomcraftError::EmptySelection);
        }
        Ok(self.save_design(&items))
    }

    /// The saved design, without touching the session.
    pub fn saved_design(&self) -> Option<Selection> {
        self.store.load_selection().map(Selection::from_items)
    }

    /// Replaces the current selection with the saved design, if there is one.
    ///
    /// Only allowed in Select; items with blank prompts are kept for editing
    /// and filtered out again by [`Self::complete_selection`].
    pub fn load_design(&self) -> Result<Option<Selection>> {
        {
            let mut state = self.state();
            state.require_stage(Stage::Select, "load a saved design")?;
            state.require_settled("load a saved design")?;
        }
        let Some(selection) = self.saved_design() else {
            return Ok(None);
        };

        let mut state = self.state();
        state.require_stage(Stage::Select, "load a saved design")?;
        state.session.selected_items = selection.clone();
        tracing::info!(items = selection.len(), "Loaded saved design");
        Ok(Some(selection))
    }

    pub fn has_saved_design(&self) -> bool {
        self.store.has_saved_selection()
    }

    // ============================================================================
    // Result stage
    // ============================================================================

    /// Adds the selected items to the cleaned room.
    ///
    /// On failure the session falls back to Select with the selection intact.
    pub async fn furnish(&self) -> Result<Completion> {
        let credential = self.require_credential()?;
        let (source, items, generation) = {
            let mut state = self.state();
            state.require_stage(Stage::Result, "furnish")?;
            state.require_idle("furnish")?;
            let source = state.session.cleaned_image.clone().ok_or_else(|| {
                RoomcraftError::invalid_transition(Stage::Result, "furnish", "no cleaned photo")
            })?;
            let items = state.session.selected_items.items().to_vec();
            (source, items, state.begin(Operation::Furnish))
        };

        tracing::info!(generation, items = items.len(), "Furnishing room");
        let progress = TracedProgress {
            operation: Operation::Furnish,
            inner: self.progress.as_ref(),
        };
        let outcome = self
            .transformer
            .furnish_room(&credential, &source, &items, &progress)
            .await;

        let mut state = self.state();
        if !state.finish(generation) {
            tracing::info!(generation, "Discarding furnish result for a reset session");
            return Ok(Completion::Discarded);
        }
        match outcome {
            Ok(image) => {
                state.session.final_image = Some(image.clone());
                tracing::info!(bytes = image.len(), "Room furnished");
                Ok(Completion::Applied(image))
            }
            Err(failure) => {
                tracing::warn!(status = ?failure.status_code, "Furnishing failed: {}", failure);
                state.session.stage = Stage::Select;
                state.guard();
                Err(failure.into())
            }
        }
    }

    /// Returns to Select, keeping the selection for further edits.
    pub fn back_to_select(&self) -> Result<()> {
        let mut state = self.state();
        state.require_stage(Stage::Result, "go back to selection")?;
        state.advance_generation();
        state.session.stage = Stage::Select;
        state.guard();
        tracing::info!("Returned to select stage");
        Ok(())
    }

    // ============================================================================
    // Credential
    // ============================================================================

    pub fn save_credential(&self, value: &str) -> Result<()> {
        self.store.save_credential(value)
    }

    pub fn has_credential(&self) -> bool {
        self.store.has_credential()
    }

    fn require_credential(&self) -> Result<Credential> {
        self.store.credential().ok_or(RoomcraftError::MissingCredential)
    }
}
