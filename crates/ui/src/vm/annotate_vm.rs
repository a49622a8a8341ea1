use annotate_core::model::{Confidence, Draft, ExampleId, SessionScope, TaskType};
use services::{AnnotationSession, SessionProgress};

/// A user interaction with the annotation form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnnotateIntent {
    JudgeChosen(bool),
    JudgeRejected(usize, bool),
    SetConfidence(Confidence),
    SetNotes(String),
    SetMinutes(String),
    SetCompletion(String),
}

/// Owned copy of the draft plus its storage coordinates, detached from the
/// session so saves can run without borrowing the view model across awaits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DraftSnapshot {
    pub scope: SessionScope,
    pub draft: Draft,
    pub example_id: ExampleId,
    pub example_idx: usize,
}

/// View model wrapping the annotation session for the form.
pub struct AnnotateVm {
    session: AnnotationSession,
}

impl AnnotateVm {
    #[must_use]
    pub fn new(session: AnnotationSession) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn session(&self) -> &AnnotationSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut AnnotationSession {
        &mut self.session
    }

    pub fn apply(&mut self, intent: AnnotateIntent) {
        match (intent, self.session.draft_mut()) {
            (AnnotateIntent::JudgeChosen(value), Draft::Judgment(draft)) => {
                draft.set_chosen_alignment(value);
            }
            (AnnotateIntent::JudgeRejected(slot, value), Draft::Judgment(draft)) => {
                draft.set_rejected_misalignment(slot, value);
            }
            (AnnotateIntent::SetConfidence(level), Draft::Judgment(draft)) => {
                draft.set_confidence(level);
            }
            (AnnotateIntent::SetNotes(notes), Draft::Judgment(draft)) => {
                draft.notes = notes;
            }
            (AnnotateIntent::SetNotes(notes), Draft::Writing(draft)) => {
                draft.notes = notes;
            }
            (AnnotateIntent::SetMinutes(raw), Draft::Judgment(draft)) => {
                draft.annotation_time_seconds = seconds_from_minutes_text(&raw);
            }
            (AnnotateIntent::SetMinutes(raw), Draft::Writing(draft)) => {
                draft.annotation_time_seconds = seconds_from_minutes_text(&raw);
            }
            (AnnotateIntent::SetCompletion(text), Draft::Writing(draft)) => {
                draft.human_completion = text;
            }
            // Judgment intents on a writing draft (and vice versa) have no
            // target control; nothing to record.
            _ => {}
        }
    }

    /// Snapshot for an unconditional save (navigation, download).
    #[must_use]
    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            scope: self.session.scope().clone(),
            draft: self.session.draft().clone(),
            example_id: self.session.current_example_id().clone(),
            example_idx: self.session.example_idx(),
        }
    }

    /// Snapshot for the periodic autosave; `None` when nothing was entered.
    #[must_use]
    pub fn autosave_snapshot(&self) -> Option<DraftSnapshot> {
        if self.session.draft().is_untouched() {
            return None;
        }
        Some(self.snapshot())
    }

    #[must_use]
    pub fn task_type(&self) -> TaskType {
        self.session.scope().task_type()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        self.session.progress()
    }

    #[must_use]
    pub fn progress_label(&self) -> String {
        let progress = self.progress();
        format!("Example {} of {}", progress.position, progress.total)
    }

    #[must_use]
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.progress().percent())
    }

    #[must_use]
    pub fn example(&self) -> &annotate_core::model::Example {
        self.session.current_example()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.session.draft().is_complete()
    }

    #[must_use]
    pub fn chosen_selected(&self) -> Option<bool> {
        match self.session.draft() {
            Draft::Judgment(draft) => draft.chosen_alignment,
            Draft::Writing(_) => None,
        }
    }

    #[must_use]
    pub fn rejected_selected(&self, slot: usize) -> Option<bool> {
        match self.session.draft() {
            Draft::Judgment(draft) => draft.rejected_misalignment.get(slot).copied().flatten(),
            Draft::Writing(_) => None,
        }
    }

    #[must_use]
    pub fn confidence_selected(&self) -> Option<Confidence> {
        match self.session.draft() {
            Draft::Judgment(draft) => draft.confidence,
            Draft::Writing(_) => None,
        }
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        match self.session.draft() {
            Draft::Judgment(draft) => &draft.notes,
            Draft::Writing(draft) => &draft.notes,
        }
    }

    #[must_use]
    pub fn minutes_text(&self) -> String {
        let seconds = match self.session.draft() {
            Draft::Judgment(draft) => draft.annotation_time_seconds,
            Draft::Writing(draft) => draft.annotation_time_seconds,
        };
        minutes_text_from_seconds(seconds)
    }

    #[must_use]
    pub fn completion_text(&self) -> &str {
        match self.session.draft() {
            Draft::Writing(draft) => &draft.human_completion,
            Draft::Judgment(_) => "",
        }
    }

    #[must_use]
    pub fn completion_chars(&self) -> usize {
        match self.session.draft() {
            Draft::Writing(draft) => draft.chars_written(),
            Draft::Judgment(_) => 0,
        }
    }

    #[must_use]
    pub fn completion_words(&self) -> usize {
        let text = self.completion_text().trim();
        if text.is_empty() {
            0
        } else {
            text.split_whitespace().count()
        }
    }

    /// Label for the next button: destination when complete, what is still
    /// needed when not.
    #[must_use]
    pub fn next_button_label(&self) -> &'static str {
        let is_last = self.progress().is_last;
        match (self.task_type(), self.is_complete(), is_last) {
            (_, true, false) => "Next Example",
            (TaskType::Judgment, true, true) => "Submit All Annotations",
            (TaskType::Writing, true, true) => "Submit All Completions",
            (TaskType::Judgment, false, false) => "Complete Required Fields to Continue",
            (TaskType::Judgment, false, true) => "Complete All Fields to Submit",
            (TaskType::Writing, false, false) => "Write at least 20 characters to continue",
            (TaskType::Writing, false, true) => "Write at least 20 characters to submit",
        }
    }

    #[must_use]
    pub fn chars_remaining(&self) -> usize {
        match self.session.draft() {
            Draft::Writing(draft) => draft.chars_remaining(),
            Draft::Judgment(_) => 0,
        }
    }
}

fn seconds_from_minutes_text(raw: &str) -> u32 {
    raw.trim()
        .parse::<u32>()
        .map(|minutes| minutes.saturating_mul(60))
        .unwrap_or(0)
}

fn minutes_text_from_seconds(seconds: u32) -> String {
    if seconds == 0 {
        return String::new();
    }
    let minutes = (f64::from(seconds) / 60.0).round().max(1.0);
    format!("{minutes:.0}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotate_core::model::{Example, MIN_COMPLETION_CHARS};
    use annotate_core::time::fixed_now;

    fn example(id: &str) -> Example {
        Example {
            id: ExampleId::new(id),
            prompt: "p".into(),
            category: String::new(),
            country: String::new(),
            chosen: vec!["c".into()],
            chosen_model: vec!["m".into()],
            rejected: vec!["r0".into(), "r1".into(), "r2".into()],
            rejected_model: vec!["m0".into(), "m1".into(), "m2".into()],
        }
    }

    fn judgment_vm() -> AnnotateVm {
        let scope = SessionScope::parse("a1", "judgment", "English").unwrap();
        let session = AnnotationSession::new(
            scope,
            vec![example("ex-1"), example("ex-2")],
            0,
            fixed_now(),
        )
        .unwrap();
        AnnotateVm::new(session)
    }

    fn writing_vm() -> AnnotateVm {
        let scope = SessionScope::parse("a1", "writing", "English").unwrap();
        let session =
            AnnotationSession::new(scope, vec![example("w-1")], 0, fixed_now()).unwrap();
        AnnotateVm::new(session)
    }

    #[test]
    fn intents_drive_the_judgment_draft() {
        let mut vm = judgment_vm();
        vm.apply(AnnotateIntent::JudgeChosen(true));
        vm.apply(AnnotateIntent::JudgeRejected(0, false));
        vm.apply(AnnotateIntent::JudgeRejected(1, false));
        vm.apply(AnnotateIntent::JudgeRejected(2, true));
        assert!(!vm.is_complete());

        vm.apply(AnnotateIntent::SetConfidence(Confidence::High));
        assert!(vm.is_complete());
        assert_eq!(vm.chosen_selected(), Some(true));
        assert_eq!(vm.rejected_selected(2), Some(true));
    }

    #[test]
    fn completion_intents_ignore_judgment_controls() {
        let mut vm = writing_vm();
        vm.apply(AnnotateIntent::JudgeChosen(true));
        assert!(vm.session().draft().is_untouched());

        vm.apply(AnnotateIntent::SetCompletion("short".into()));
        assert_eq!(vm.completion_chars(), 5);
        assert_eq!(vm.chars_remaining(), MIN_COMPLETION_CHARS - 5);
    }

    #[test]
    fn next_button_label_tracks_state() {
        let mut vm = judgment_vm();
        assert_eq!(
            vm.next_button_label(),
            "Complete Required Fields to Continue"
        );

        vm.apply(AnnotateIntent::JudgeChosen(true));
        for slot in 0..3 {
            vm.apply(AnnotateIntent::JudgeRejected(slot, false));
        }
        vm.apply(AnnotateIntent::SetConfidence(Confidence::Low));
        assert_eq!(vm.next_button_label(), "Next Example");
    }

    #[test]
    fn minutes_text_roundtrips_through_seconds() {
        let mut vm = judgment_vm();
        vm.apply(AnnotateIntent::SetMinutes("3".into()));
        assert_eq!(vm.minutes_text(), "3");

        vm.apply(AnnotateIntent::SetMinutes("not a number".into()));
        assert_eq!(vm.minutes_text(), "");
    }

    #[test]
    fn autosave_snapshot_skips_untouched_drafts() {
        let vm = judgment_vm();
        assert!(vm.autosave_snapshot().is_none());

        let mut vm = vm;
        vm.apply(AnnotateIntent::SetNotes("partial".into()));
        let snapshot = vm.autosave_snapshot().expect("touched draft");
        assert_eq!(snapshot.example_id.as_str(), "ex-1");
        assert_eq!(snapshot.example_idx, 0);
    }

    #[test]
    fn progress_labels_match_position() {
        let vm = judgment_vm();
        assert_eq!(vm.progress_label(), "Example 1 of 2");
        assert_eq!(vm.percent_label(), "50.0%");
    }
}
