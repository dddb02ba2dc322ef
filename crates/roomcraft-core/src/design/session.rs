//! Design session state and its stage invariants.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::model::Selection;
use crate::image::EncodedImage;

/// The three ordered phases of a design session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Uploading and de-cluttering the room photo.
    Upload,
    /// Choosing items and writing placement instructions.
    Select,
    /// Generating and viewing the furnished room.
    Result,
}

/// The single live workflow instance.
///
/// Fields are public so a session can be restored or constructed directly;
/// [`Session::enforce_invariants`] repairs any combination that is not valid
/// for the current stage.
#[derive(Debug, Clone)]
pub struct Session {
    pub stage: Stage,
    pub original_image: Option<EncodedImage>,
    pub cleaned_image: Option<EncodedImage>,
    pub selected_items: Selection,
    /// Furnished result; only meaningful in [`Stage::Result`].
    pub final_image: Option<EncodedImage>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A fresh session at the upload stage.
    pub fn new() -> Self {
        Self {
            stage: Stage::Upload,
            original_image: None,
            cleaned_image: None,
            selected_items: Selection::new(),
            final_image: None,
        }
    }

    /// Whether `stage` may be entered with the current fields.
    pub fn satisfies(&self, stage: Stage) -> bool {
        match stage {
            Stage::Upload => true,
            Stage::Select => self.original_image.is_some() && self.cleaned_image.is_some(),
            Stage::Result => self.cleaned_image.is_some() && !self.selected_items.is_empty(),
        }
    }

    /// Demotes the session to the nearest valid earlier stage.
    ///
    /// Result falls back to Select, Select falls back to Upload; the check
    /// repeats until the stage's precondition holds. Returns the stage the
    /// session was demoted from, if any.
    pub fn enforce_invariants(&mut self) -> Option<Stage> {
        let entered = self.stage;
        while !self.satisfies(self.stage) {
            self.stage = match self.stage {
                Stage::Result => Stage::Select,
                Stage::Select | Stage::Upload => Stage::Upload,
            };
        }
        if self.stage != Stage::Result {
            self.final_image = None;
        }
        (self.stage != entered).then_some(entered)
    }
}
