use crate::client::{send_call, send_stream};
use crate::error::ChatError;
use crate::models::{build_request_body, ChatRole, ResponseMode};
use crate::sink::MessageSink;
use crate::transport::RagTransport;

/// Whether a submission is in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingResponse,
}

/// The input side of the chat form: its phase, the prompt box and the send button.
pub trait SubmitControls {
    fn phase(&self) -> Phase;

    /// Also enables or disables the send button.
    fn set_phase(&self, phase: Phase);

    fn clear_prompt(&self);

    fn focus_prompt(&self);
}

/// Raw form field values at the moment of submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatForm {
    pub conversation_id: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The prompt was blank. Nothing was rendered or sent.
    Ignored,
    Answered,
    /// The failure has already been rendered as an error message.
    Failed(ChatError),
}

/// Runs one prompt from the form through the selected endpoint.
pub struct SubmissionController<'a, T, S, C> {
    transport: &'a T,
    sink: &'a S,
    controls: &'a C,
}

impl<'a, T, S, C> SubmissionController<'a, T, S, C>
where
    T: RagTransport,
    S: MessageSink,
    C: SubmitControls,
{
    pub fn new(transport: &'a T, sink: &'a S, controls: &'a C) -> Self {
        Self { transport, sink, controls }
    }

    pub async fn submit(&self, mode: ResponseMode, form: &ChatForm) -> SubmitOutcome {
        let prompt = form.user_prompt.trim();
        if prompt.is_empty() {
            return SubmitOutcome::Ignored;
        }
        if self.controls.phase() == Phase::AwaitingResponse {
            log::warn!("submitting while a previous response is still in flight");
        }

        self.sink.create(ChatRole::User, prompt);
        self.controls.clear_prompt();

        let _guard = AwaitingGuard::enter(self.controls);
        let body = build_request_body(prompt, &form.conversation_id, &form.system_prompt);
        let result = match mode {
            ResponseMode::Stream => send_stream(self.transport, self.sink, &body).await,
            ResponseMode::Call => send_call(self.transport, self.sink, &body).await,
        };

        match result {
            Ok(()) => SubmitOutcome::Answered,
            Err(err) => {
                log::error!("chat request failed: {err}");
                self.sink.create(ChatRole::Error, &err.to_string());
                SubmitOutcome::Failed(err)
            }
        }
    }
}

/// Holds the controls in [`Phase::AwaitingResponse`] and puts them back to idle
/// with the prompt focused when dropped, on every exit path.
struct AwaitingGuard<'a, C: SubmitControls> {
    controls: &'a C,
}

impl<'a, C: SubmitControls> AwaitingGuard<'a, C> {
    fn enter(controls: &'a C) -> Self {
        controls.set_phase(Phase::AwaitingResponse);
        Self { controls }
    }
}

impl<C: SubmitControls> Drop for AwaitingGuard<'_, C> {
    fn drop(&mut self) {
        self.controls.set_phase(Phase::Idle);
        self.controls.focus_prompt();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use futures::executor::block_on;
    use serde_json::json;

    use super::*;
    use crate::sink::testing::RecordingSink;
    use crate::transport::testing::{FakeTransport, ScriptedChunks};

    #[derive(Default)]
    struct FakeControls {
        phase: Cell<Phase>,
        history: RefCell<Vec<Phase>>,
        cleared: Cell<bool>,
        focused: Cell<usize>,
    }

    impl SubmitControls for FakeControls {
        fn phase(&self) -> Phase {
            self.phase.get()
        }

        fn set_phase(&self, phase: Phase) {
            self.phase.set(phase);
            self.history.borrow_mut().push(phase);
        }

        fn clear_prompt(&self) {
            self.cleared.set(true);
        }

        fn focus_prompt(&self) {
            self.focused.set(self.focused.get() + 1);
        }
    }

    fn form(prompt: &str) -> ChatForm {
        ChatForm {
            conversation_id: "c1".into(),
            system_prompt: String::new(),
            user_prompt: prompt.into(),
        }
    }

    #[test]
    fn blank_prompt_does_nothing() {
        let transport = FakeTransport::default();
        let sink = RecordingSink::default();
        let controls = FakeControls::default();
        let controller = SubmissionController::new(&transport, &sink, &controls);

        let outcome = block_on(controller.submit(ResponseMode::Stream, &form("   \n")));

        assert_eq!(outcome, SubmitOutcome::Ignored);
        assert!(sink.texts().is_empty());
        assert!(transport.requests.borrow().is_empty());
        assert!(controls.history.borrow().is_empty());
        assert!(!controls.cleared.get());
    }

    #[test]
    fn stream_mode_renders_user_then_assistant_and_returns_to_idle() {
        let transport = FakeTransport::with_stream(Ok(ScriptedChunks::new(["data:Hi", " there\n"])));
        let sink = RecordingSink::default();
        let controls = FakeControls::default();
        let controller = SubmissionController::new(&transport, &sink, &controls);

        let outcome = block_on(controller.submit(ResponseMode::Stream, &form("  hello  ")));

        assert_eq!(outcome, SubmitOutcome::Answered);
        assert_eq!(
            sink.texts(),
            vec![(ChatRole::User, "hello".to_string()), (ChatRole::Assistant, "Hi there".to_string())]
        );
        let requests = transport.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "stream");
        assert_eq!(requests[0].1.user_prompt, "hello");
        assert_eq!(*controls.history.borrow(), vec![Phase::AwaitingResponse, Phase::Idle]);
        assert!(controls.cleared.get());
        assert_eq!(controls.focused.get(), 1);
    }

    #[test]
    fn call_mode_uses_call_endpoint_only() {
        let transport = FakeTransport::with_call(Ok(json!({"result": {"output": {"text": "ok"}}})));
        let sink = RecordingSink::default();
        let controls = FakeControls::default();
        let controller = SubmissionController::new(&transport, &sink, &controls);

        block_on(controller.submit(ResponseMode::Call, &form("q")));

        let requests = transport.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "call");
        assert_eq!(sink.texts()[1], (ChatRole::Assistant, "ok".to_string()));
    }

    #[test]
    fn failure_renders_error_message_and_restores_idle() {
        let transport = FakeTransport::with_call(Err(ChatError::Request {
            status: 500,
            body: "boom".into(),
        }));
        let sink = RecordingSink::default();
        let controls = FakeControls::default();
        let controller = SubmissionController::new(&transport, &sink, &controls);

        let outcome = block_on(controller.submit(ResponseMode::Call, &form("q")));

        assert!(matches!(outcome, SubmitOutcome::Failed(ChatError::Request { status: 500, .. })));
        assert_eq!(sink.texts().last(), Some(&(ChatRole::Error, "HTTP 500: boom".to_string())));
        assert_eq!(controls.phase(), Phase::Idle);
        assert_eq!(controls.focused.get(), 1);
    }

    #[test]
    fn stream_read_failure_keeps_partial_reply_before_error() {
        let mut chunks = ScriptedChunks::new(["data:par"]);
        chunks.fail_at_end = Some(ChatError::StreamRead("reset".into()));
        let transport = FakeTransport::with_stream(Ok(chunks));
        let sink = RecordingSink::default();
        let controls = FakeControls::default();
        let controller = SubmissionController::new(&transport, &sink, &controls);

        block_on(controller.submit(ResponseMode::Stream, &form("q")));

        // The unterminated line never reached the framer's flush.
        assert_eq!(
            sink.texts(),
            vec![
                (ChatRole::User, "q".to_string()),
                (ChatRole::Assistant, String::new()),
                (ChatRole::Error, "Stream read failed: reset".to_string()),
            ]
        );
        assert_eq!(controls.phase(), Phase::Idle);
    }
}
