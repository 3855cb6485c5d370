use leptos::ev;
use leptos::prelude::*;

use crate::components::settings::{ModeToggle, SettingsBar};
use crate::state::{ChatMessage, ChatState};

/// The whole chat surface: settings, message list and input.
#[component]
pub fn ChatPanel() -> impl IntoView {
    view! {
        <main class="chat-panel">
            <div class="chat-header">
                <h2>"RAG Chat"</h2>
                <ModeToggle />
            </div>
            <SettingsBar />
            <ChatArea />
            <ChatInput />
        </main>
    }
}

/// Scrollable message history.
#[component]
fn ChatArea() -> impl IntoView {
    let state = expect_context::<ChatState>();

    view! {
        <div class="messages-container" node_ref=state.chat_area>
            <Show
                when=move || !state.messages.with(Vec::is_empty)
                fallback=|| view! {
                    <div class="empty-state">"Ask something about your documents"</div>
                }
            >
                <For
                    each=move || state.messages.get()
                    key=|m| m.id
                    let:msg
                >
                    <MessageBubble message=msg />
                </For>
            </Show>
        </div>
    }
}

/// A single chat message bubble.
#[component]
fn MessageBubble(message: ChatMessage) -> impl IntoView {
    let role = message.role.css_class();

    view! {
        <div class=format!("message {role}")>
            <div class="role-label">{role}</div>
            <div class="message-text">{move || message.text.get()}</div>
        </div>
    }
}

/// Enter sends; Shift+Enter inserts a newline. An Enter that confirms an IME
/// composition belongs to the composition and sends nothing.
fn submits_on_key(key: &str, shift: bool, composing: bool) -> bool {
    key == "Enter" && !shift && !composing
}

/// Prompt textarea and send button.
#[component]
fn ChatInput() -> impl IntoView {
    let state = expect_context::<ChatState>();

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if submits_on_key(&ev.key(), ev.shift_key(), ev.is_composing()) {
            ev.prevent_default();
            if !state.is_awaiting() {
                state.submit();
            }
        }
    };

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        state.submit();
    };

    view! {
        <form class="input-area" on:submit=on_submit>
            <div class="input-row">
                <textarea
                    rows="2"
                    placeholder="Ask a question… (Enter to send, Shift+Enter for newline)"
                    node_ref=state.prompt_ref
                    prop:value=move || state.prompt.get()
                    on:input=move |ev| state.prompt.set(event_target_value(&ev))
                    on:keydown=on_keydown
                />
                <button
                    type="submit"
                    class="send-btn"
                    disabled=move || state.is_awaiting()
                >
                    {move || if state.is_awaiting() { "Sending…" } else { "Send" }}
                </button>
            </div>
        </form>
    }
}
