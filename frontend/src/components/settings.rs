use leptos::prelude::*;

use crate::models::ResponseMode;
use crate::state::ChatState;

/// Conversation id and optional system prompt sent with every request.
#[component]
pub fn SettingsBar() -> impl IntoView {
    let state = expect_context::<ChatState>();

    view! {
        <div class="settings-bar">
            <label>
                "Conversation"
                <input
                    type="text"
                    placeholder="test-1"
                    prop:value=move || state.conversation_id.get()
                    on:input=move |ev| state.conversation_id.set(event_target_value(&ev))
                />
            </label>
            <label>
                "System prompt"
                <input
                    type="text"
                    placeholder="Optional"
                    prop:value=move || state.system_prompt.get()
                    on:input=move |ev| state.system_prompt.set(event_target_value(&ev))
                />
            </label>
        </div>
    }
}

/// Stream / Call switch. Streaming is the default.
#[component]
pub fn ModeToggle() -> impl IntoView {
    let state = expect_context::<ChatState>();
    let is = move |mode: ResponseMode| state.mode.get() == mode;

    view! {
        <div class="mode-toggle">
            <button
                type="button"
                class:active=move || is(ResponseMode::Stream)
                on:click=move |_| state.mode.set(ResponseMode::Stream)
            >
                "Stream"
            </button>
            <button
                type="button"
                class:active=move || is(ResponseMode::Call)
                on:click=move |_| state.mode.set(ResponseMode::Call)
            >
                "Call"
            </button>
        </div>
    }
}
