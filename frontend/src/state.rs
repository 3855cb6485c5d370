use leptos::html;
use leptos::leptos_dom::helpers::request_animation_frame;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::FetchTransport;
use crate::controller::{ChatForm, Phase, SubmissionController, SubmitControls};
use crate::models::{ChatRole, DEFAULT_CONVERSATION_ID, ResponseMode};
use crate::sink::MessageSink;

/// One rendered chat bubble. The text is its own signal so streamed
/// fragments only re-render this bubble.
#[derive(Clone, Copy, Debug)]
pub struct ChatMessage {
    pub id: usize,
    pub role: ChatRole,
    pub text: RwSignal<String>,
}

/// Shared application state, provided via Leptos context.
#[derive(Clone, Copy)]
pub struct ChatState {
    pub messages: RwSignal<Vec<ChatMessage>>,
    pub mode: RwSignal<ResponseMode>,
    pub phase: RwSignal<Phase>,

    // Form fields
    pub conversation_id: RwSignal<String>,
    pub system_prompt: RwSignal<String>,
    pub prompt: RwSignal<String>,

    pub chat_area: NodeRef<html::Div>,
    pub prompt_ref: NodeRef<html::Textarea>,
}

impl ChatState {
    /// Create a new `ChatState` and provide it in the current Leptos context.
    pub fn provide() -> Self {
        let state = Self {
            messages: RwSignal::new(Vec::new()),
            mode: RwSignal::new(ResponseMode::default()),
            phase: RwSignal::new(Phase::Idle),
            conversation_id: RwSignal::new(DEFAULT_CONVERSATION_ID.to_string()),
            system_prompt: RwSignal::new(String::new()),
            prompt: RwSignal::new(String::new()),
            chat_area: NodeRef::new(),
            prompt_ref: NodeRef::new(),
        };

        provide_context(state);
        state
    }

    pub fn is_awaiting(&self) -> bool {
        self.phase.get() == Phase::AwaitingResponse
    }

    /// Submit the current prompt to the endpoint picked by the mode toggle.
    pub fn submit(self) {
        let form = ChatForm {
            conversation_id: self.conversation_id.get_untracked(),
            system_prompt: self.system_prompt.get_untracked(),
            user_prompt: self.prompt.get_untracked(),
        };
        let mode = self.mode.get_untracked();

        spawn_local(async move {
            let transport = FetchTransport;
            let controller = SubmissionController::new(&transport, &self, &self);
            let outcome = controller.submit(mode, &form).await;
            log::debug!("submission finished: {outcome:?}");
        });
    }
}

impl MessageSink for ChatState {
    type Handle = RwSignal<String>;

    fn create(&self, role: ChatRole, text: &str) -> RwSignal<String> {
        let text = RwSignal::new(text.to_string());
        self.messages.update(|messages| {
            let id = messages.len();
            messages.push(ChatMessage { id, role, text });
        });
        self.scroll_to_latest();
        text
    }

    fn append(&self, handle: &RwSignal<String>, text: &str) {
        handle.update(|current| current.push_str(text));
    }

    fn scroll_to_latest(&self) {
        let chat_area = self.chat_area;
        // Wait for the new content to be laid out.
        request_animation_frame(move || {
            if let Some(el) = chat_area.get_untracked() {
                el.set_scroll_top(el.scroll_height());
            }
        });
    }
}

impl SubmitControls for ChatState {
    fn phase(&self) -> Phase {
        self.phase.get_untracked()
    }

    fn set_phase(&self, phase: Phase) {
        self.phase.set(phase);
    }

    fn clear_prompt(&self) {
        self.prompt.set(String::new());
    }

    fn focus_prompt(&self) {
        if let Some(el) = self.prompt_ref.get_untracked() {
            if let Err(e) = el.focus() {
                log::warn!("Failed to focus prompt: {e:?}");
            }
        }
    }
}
