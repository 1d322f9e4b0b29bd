use crate::view_model::{AppViewModel, MessageView};
use crate::{Conversation, JobId};

/// Conversation plus the admission guard for the single outstanding request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    conversation: Conversation,
    awaiting: bool,
    active_job: Option<JobId>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            messages: self
                .conversation
                .messages()
                .iter()
                .map(MessageView::from_message)
                .collect(),
            awaiting: self.awaiting,
            active_job: self.active_job.clone(),
            dirty: self.dirty,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// True from submission until the request reaches any terminal outcome.
    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    pub fn active_job(&self) -> Option<&JobId> {
        self.active_job.as_ref()
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn begin_request(&mut self, query: &str) {
        self.conversation.append_user(query);
        self.awaiting = true;
        self.mark_dirty();
    }

    /// Immediate answer or submission failure: no job was ever created.
    pub(crate) fn finish_without_job(&mut self, text: String) {
        self.conversation.append_assistant(text);
        self.clear_guard();
    }

    pub(crate) fn start_job(&mut self, job_id: JobId) {
        self.conversation.append_status(job_id.clone());
        self.active_job = Some(job_id);
        self.mark_dirty();
    }

    /// Replaces the job's placeholder. Returns false when it was already replaced.
    pub(crate) fn finish_job(&mut self, job_id: &JobId, text: String) -> bool {
        if self.conversation.replace_status(job_id, text).is_none() {
            return false;
        }
        if self.active_job.as_ref() == Some(job_id) {
            self.clear_guard();
        }
        self.mark_dirty();
        true
    }

    /// A submission is in flight and no job has been handed back yet.
    pub(crate) fn awaiting_submission(&self) -> bool {
        self.awaiting && self.active_job.is_none()
    }

    fn clear_guard(&mut self) {
        self.awaiting = false;
        self.active_job = None;
        self.mark_dirty();
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
